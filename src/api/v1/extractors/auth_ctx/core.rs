use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::Principal;

/// Extractor giving handlers the authenticated `Principal`.
///
/// The access middleware inserts the principal into the request extensions.
/// If it is missing (route mounted outside the middleware) the request is
/// rejected as unauthenticated.
pub struct AuthCtx(pub Principal);

impl<S> FromRequestParts<S> for AuthCtx
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(AuthCtx)
            .ok_or(AppError::Unauthenticated)
    }
}
