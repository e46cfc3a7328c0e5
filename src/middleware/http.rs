//! HTTP-level middleware (transport concerns).
//!
//! `apply` sits outside the request pipeline (auth, policy, fault
//! translation) and applies to every route.
//!
//! Responsibility:
//! - Request-Id generation + propagation (X-Request-Id), reused as the
//!   correlation id of fault records
//! - Access logging / request tracing (TraceLayer)
//! - Global timeouts
//!
//! `limit_body` goes inside the fault boundary, so an oversized request is
//! answered with a fault record like any other rejection.

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::{StatusCode, header::HeaderName};
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::HttpLimits;

/// Apply HTTP-level middleware to the given Router.
pub fn apply(router: Router, limits: HttpLimits) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");

    let layers = ServiceBuilder::new()
        // Make the service error `Infallible` by converting errors into responses.
        // An elapsed deadline has already dropped the pipeline; the bare 408 is
        // a transport answer, not a fault record.
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                StatusCode::REQUEST_TIMEOUT
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }))
        // Generate a request id if missing, then propagate it to the response.
        .layer(SetRequestIdLayer::new(
            request_id_header.clone(),
            MakeRequestUuid,
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header))
        .layer(TimeoutLayer::new(limits.request_timeout))
        // Access log / tracing for all requests.
        .layer(TraceLayer::new_for_http());

    router.layer(layers)
}

/// Reject request bodies larger than `limits.body_limit_bytes` with a 413.
pub fn limit_body(router: Router, limits: HttpLimits) -> Router {
    router.layer(RequestBodyLimitLayer::new(limits.body_limit_bytes))
}
