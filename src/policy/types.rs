//! Routing policy types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Organization id that marks a policy as global for its model.
pub const GLOBAL_ORGANIZATION: &str = "*";

/// A backend a policy routes to, with its relative weight.
///
/// Weights are relative, not percentages: `{a: 1, b: 3}` sends three quarters
/// of the traffic to `b`. Zero-weight backends are never drawn by weighted
/// selection but still serve as failover candidates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendWeight {
    pub backend_id: String,
    pub weight: u32,
}

impl BackendWeight {
    pub fn new(backend_id: impl Into<String>, weight: u32) -> Self {
        Self {
            backend_id: backend_id.into(),
            weight,
        }
    }
}

/// Routing policy for one (organization, model) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingPolicy {
    #[serde(default)]
    pub policy_id: String,
    /// `"*"` for a global policy
    pub organization_id: String,
    pub model: String,
    /// Candidates in configured order
    #[serde(default)]
    pub backends: Vec<BackendWeight>,
    /// Attempt count at which failover escalates (0 disables)
    #[serde(default)]
    pub failover_threshold: u32,
    /// Backends operators have manually taken out of rotation
    #[serde(default)]
    pub degraded_backends: Vec<String>,
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RoutingPolicy {
    pub fn new(
        organization_id: impl Into<String>,
        model: impl Into<String>,
        backends: Vec<BackendWeight>,
    ) -> Self {
        let organization_id = organization_id.into();
        let model = model.into();
        Self {
            policy_id: format!("{}:{}", organization_id, model),
            organization_id,
            model,
            backends,
            failover_threshold: 0,
            degraded_backends: Vec::new(),
            version: 0,
            updated_at: None,
        }
    }

    pub fn with_failover_threshold(mut self, threshold: u32) -> Self {
        self.failover_threshold = threshold;
        self
    }

    pub fn with_degraded_backends(mut self, degraded: Vec<String>) -> Self {
        self.degraded_backends = degraded;
        self
    }

    pub fn is_global(&self) -> bool {
        self.organization_id == GLOBAL_ORGANIZATION
    }

    /// Configured weight of `backend_id`, 0 if the policy does not list it.
    pub fn weight_of(&self, backend_id: &str) -> u32 {
        self.backends
            .iter()
            .find(|b| b.backend_id == backend_id)
            .map(|b| b.weight)
            .unwrap_or(0)
    }
}
