/*
 * Responsibility
 * - Shared context attached to the Router (AppState)
 *   - token validator, policy registry, telemetry sink
 * - Cheap to clone (Arc inside); everything is read-only after startup
 */
use std::sync::Arc;

use crate::services::{auth::TokenValidator, policy::PolicyRegistry, telemetry::TelemetrySink};

#[derive(Clone)]
pub struct AppState {
    pub validator: Arc<TokenValidator>,
    pub policies: Arc<PolicyRegistry>,
    pub telemetry: Arc<dyn TelemetrySink>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("validator", &self.validator)
            .field("policies", &self.policies)
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        validator: Arc<TokenValidator>,
        policies: Arc<PolicyRegistry>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            validator,
            policies,
            telemetry,
        }
    }
}
