//! Fault translation boundary.
//!
//! Every failure raised while a request is handled ends up here exactly once:
//! - `AppError` responses carry a `PendingFault` in their extensions
//! - handler panics are caught and become `Internal`
//! - error statuses produced without an `AppError` (router fallback, 405,
//!   body limit 413, extractor rejections, collaborator 5xx) are classified
//!   from the status
//!
//! The JSON body is serialized in full before the response is built.
//! Internal detail goes to the telemetry sink, never to the client.
//!
//! If the request future is dropped (client gone, deadline elapsed) nothing
//! below this layer is written and the handler's resources are released on drop.

use std::any::Any;
use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::{OriginalUri, State},
    http::{HeaderName, HeaderValue, Request, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use uuid::Uuid;

use crate::error::{FaultKind, FaultRecord, PendingFault};
use crate::services::telemetry::{FaultReport, TelemetrySink};

const REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

// Used only if the record itself cannot be serialized.
const FALLBACK_BODY: &str = r#"{"errorKind":"Internal","message":"internal server error"}"#;

#[derive(Clone)]
pub struct FaultTranslator {
    telemetry: Arc<dyn TelemetrySink>,
}

impl FaultTranslator {
    pub fn new(telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self { telemetry }
    }

    fn render(&self, fault: PendingFault, call: CallInfo) -> Response {
        let kind = fault.kind;

        if kind == FaultKind::Internal {
            self.telemetry.record(FaultReport {
                kind,
                correlation_id: call.correlation_id.clone(),
                method: call.method,
                path: call.path,
                detail: fault.detail.clone(),
                occurred_at: chrono::Utc::now(),
            });
        } else {
            tracing::debug!(
                kind = ?kind,
                correlation_id = %call.correlation_id,
                method = %call.method,
                path = %call.path,
                "request rejected"
            );
        }

        let record: FaultRecord = fault.into_record(Some(call.correlation_id));
        let body = match serde_json::to_vec(&record) {
            Ok(body) => body,
            Err(err) => {
                tracing::error!(error = %err, "failed to serialize fault record");
                FALLBACK_BODY.as_bytes().to_vec()
            }
        };

        let mut res = (
            kind.status(),
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            )],
            body,
        )
            .into_response();

        if kind == FaultKind::Unauthenticated {
            res.headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }

        res
    }
}

struct CallInfo {
    correlation_id: String,
    method: String,
    path: String,
}

/// Put `router` behind the fault translation boundary.
///
/// The boundary wraps the router as a whole rather than each route, so
/// responses the router builds or decorates itself (fallback 404, `Allow` on
/// 405) are translated too. Apply after all routes and auth layers, before
/// transport layers (`middleware::http`), so the request id is already set.
pub fn apply(router: Router, telemetry: Arc<dyn TelemetrySink>) -> Router {
    let boundary = ServiceBuilder::new()
        .layer(middleware::from_fn_with_state(
            FaultTranslator::new(telemetry),
            translate,
        ))
        .layer(CatchPanicLayer::custom(panic_fault))
        .service(router);

    Router::new().fallback_service(boundary)
}

async fn translate(
    State(translator): State<FaultTranslator>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let call = CallInfo {
        correlation_id: req
            .headers()
            .get(REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        method: req.method().to_string(),
        // Nested routers see a stripped uri; report what the client asked for.
        path: req
            .extensions()
            .get::<OriginalUri>()
            .map(|uri| uri.path().to_string())
            .unwrap_or_else(|| req.uri().path().to_string()),
    };

    let mut res = next.run(req).await;

    let fault = match res.extensions_mut().remove::<PendingFault>() {
        Some(fault) => fault,
        None => match FaultKind::from_status(res.status()) {
            Some(kind) => {
                PendingFault::new(kind).with_detail(format!("unhandled {} response", res.status()))
            }
            // Success: pass through untouched.
            None => return res,
        },
    };

    translator.render(fault, call)
}

fn panic_fault(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    };

    PendingFault::new(FaultKind::Internal)
        .with_detail(format!("handler panicked: {detail}"))
        .into_response()
}
