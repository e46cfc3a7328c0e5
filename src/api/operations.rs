//! Operation table: route → (policy, handler).
//!
//! Built once at startup. Binding a route to a policy name that the registry
//! does not hold fails the build, so a misconfigured operation can never
//! surface at request time.

use axum::{Router, routing::MethodRouter};

use crate::middleware::auth::policy;
use crate::services::policy::{PolicyError, PolicyRegistry};
use crate::state::AppState;

pub struct Operations<'a> {
    policies: &'a PolicyRegistry,
    router: Router<AppState>,
}

impl<'a> Operations<'a> {
    pub fn new(policies: &'a PolicyRegistry) -> Self {
        Self {
            policies,
            router: Router::new(),
        }
    }

    /// Mount `handler` at `path`, guarded by the policy named `policy_name`.
    pub fn route(
        mut self,
        path: &str,
        policy_name: &str,
        handler: MethodRouter<AppState>,
    ) -> Result<Self, PolicyError> {
        let policy = self
            .policies
            .get(policy_name)
            .ok_or_else(|| PolicyError::Unknown {
                policy: policy_name.to_string(),
                route: path.to_string(),
            })?;

        tracing::debug!(route = path, policy = policy_name, "operation bound");

        self.router = self.router.route(path, policy::guard(policy, handler));
        Ok(self)
    }

    pub fn into_router(self) -> Router<AppState> {
        self.router
    }
}
