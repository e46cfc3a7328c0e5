/*
 * Responsibility
 * - GET /identity: echo the caller's verified identity
 * - guarded by the Patient policy (see routes.rs)
 */
use axum::Json;

use crate::api::v1::{dto::identity::IdentityResponse, extractors::AuthCtx};

pub async fn identity(AuthCtx(principal): AuthCtx) -> Json<IdentityResponse> {
    let scopes = principal.scopes().into_iter().map(str::to_owned).collect();

    Json(IdentityResponse {
        issuer: principal.issuer,
        subject: principal.subject,
        scopes,
    })
}
