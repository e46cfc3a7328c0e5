//! Claim-based authorization policies.
//!
//! Policies are registered once at startup into an immutable `PolicyRegistry`
//! and shared read-only (behind `Arc`) by every request.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::services::auth::Principal;
use crate::services::auth::principal::SCOPE;

/// Policy guarding patient-facing operations.
pub const PATIENT_POLICY: &str = "Patient";
pub const PATIENT_SCOPE: &str = "patient.access";

/// Wiring mistakes. Raised while building the app, never per request.
#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("policy '{0}' is registered twice")]
    Duplicate(String),
    #[error("route '{route}' is bound to unknown policy '{policy}'")]
    Unknown { policy: String, route: String },
}

/// The principal lacks the claim a policy requires.
#[derive(Debug, Error)]
#[error("policy '{policy}' denied subject '{subject}'")]
pub struct PolicyDenied {
    pub policy: String,
    pub subject: String,
}

/// Admit a principal that carries `claim_key = claim_value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    name: String,
    claim_key: String,
    claim_value: String,
}

impl Policy {
    pub fn require_claim(
        name: impl Into<String>,
        claim_key: impl Into<String>,
        claim_value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            claim_key: claim_key.into(),
            claim_value: claim_value.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Passes when ANY claim named `claim_key` equals `claim_value` exactly.
    pub fn evaluate(&self, principal: &Principal) -> Result<(), PolicyDenied> {
        if principal.has_claim(&self.claim_key, &self.claim_value) {
            Ok(())
        } else {
            Err(PolicyDenied {
                policy: self.name.clone(),
                subject: principal.subject.clone(),
            })
        }
    }
}

#[derive(Debug, Default)]
pub struct PolicyRegistry {
    policies: HashMap<String, Arc<Policy>>,
}

impl PolicyRegistry {
    pub fn builder() -> PolicyRegistryBuilder {
        PolicyRegistryBuilder::default()
    }

    /// Policies this API ships with.
    pub fn defaults() -> Result<Self, PolicyError> {
        Self::builder()
            .register(Policy::require_claim(PATIENT_POLICY, SCOPE, PATIENT_SCOPE))
            .build()
    }

    pub fn get(&self, name: &str) -> Option<Arc<Policy>> {
        self.policies.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct PolicyRegistryBuilder {
    policies: Vec<Policy>,
}

impl PolicyRegistryBuilder {
    pub fn register(mut self, policy: Policy) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn build(self) -> Result<PolicyRegistry, PolicyError> {
        let mut policies = HashMap::with_capacity(self.policies.len());
        for policy in self.policies {
            let name = policy.name.clone();
            if policies.insert(name.clone(), Arc::new(policy)).is_some() {
                return Err(PolicyError::Duplicate(name));
            }
        }
        Ok(PolicyRegistry { policies })
    }
}
