/*
 * Responsibility
 * - v1 URL structure
 * - every route here is an operation: bound to exactly one policy
 * - token validation is applied on top of this router in app.rs
 */
use axum::{Router, routing::get};

use crate::api::operations::Operations;
use crate::api::v1::handlers::identity::identity;
use crate::services::policy::{PATIENT_POLICY, PolicyError, PolicyRegistry};
use crate::state::AppState;

pub fn operations(policies: &PolicyRegistry) -> Result<Router<AppState>, PolicyError> {
    Ok(Operations::new(policies)
        .route("/identity", PATIENT_POLICY, get(identity))?
        .into_router())
}
