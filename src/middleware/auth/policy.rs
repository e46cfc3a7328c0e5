//! Per-operation policy guard.
//!
//! Attached with `route_layer` to exactly one operation, so each admitted
//! request passes exactly one policy evaluation before its handler runs.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::MethodRouter,
};

use crate::error::AppError;
use crate::services::auth::Principal;
use crate::services::policy::Policy;
use crate::state::AppState;

pub fn guard(policy: Arc<Policy>, handler: MethodRouter<AppState>) -> MethodRouter<AppState> {
    handler.route_layer(middleware::from_fn_with_state(policy, policy_middleware))
}

async fn policy_middleware(
    State(policy): State<Arc<Policy>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // The access middleware always runs first; a missing principal means the
    // operation was mounted outside it.
    let Some(principal) = req.extensions().get::<Principal>() else {
        tracing::error!(policy = %policy.name(), "guarded operation reached without a principal");
        return Err(AppError::Unauthenticated);
    };

    if let Err(denied) = policy.evaluate(principal) {
        tracing::warn!(
            policy = %denied.policy,
            subject = %denied.subject,
            "policy denied request"
        );
        return Err(denied.into());
    }

    Ok(next.run(req).await)
}
