//! Bearer token validation → `Principal` in the request extensions.
//!
//! Runs before routing reaches any guarded operation. A request that fails
//! here never reaches the policy guard or the handler.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// Require a valid access token on every route of `router`.
///
/// Example:
/// ```ignore
/// let v1 = api::v1::operations(&state.policies)?;
/// let v1 = middleware::auth::access::apply(v1, state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 from_fn cannot take a State extractor, so pass the state explicitly
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let principal = state
        .validator
        .authenticate(req.headers())
        .await
        .inspect_err(|err| tracing::warn!(error = %err, "access token verification failed"))?;

    tracing::debug!(
        issuer = %principal.issuer,
        subject = %principal.subject,
        "access token verified"
    );

    // middleware → policy guard / extractor
    req.extensions_mut().insert(principal);

    Ok(next.run(req).await)
}
