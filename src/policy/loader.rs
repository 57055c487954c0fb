//! Policy sources.

use super::{PolicyError, RoutingPolicy, GLOBAL_ORGANIZATION};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Read-through source of routing policies.
pub trait PolicyLoader: Send + Sync {
    /// Load the policy for `(organization_id, model)`.
    fn load_policy(&self, organization_id: &str, model: &str)
        -> Result<RoutingPolicy, PolicyError>;
}

/// Serves policies held in memory, usually taken from configuration.
///
/// Lookups try the organization's own policy first, then the global `"*"`
/// policy for the model.
#[derive(Debug, Default)]
pub struct StaticPolicyLoader {
    policies: RwLock<HashMap<(String, String), RoutingPolicy>>,
}

impl StaticPolicyLoader {
    pub fn new(policies: impl IntoIterator<Item = RoutingPolicy>) -> Self {
        let loader = Self::default();
        for policy in policies {
            loader.upsert(policy);
        }
        loader
    }

    pub fn upsert(&self, policy: RoutingPolicy) {
        self.policies.write().insert(
            (policy.organization_id.clone(), policy.model.clone()),
            policy,
        );
    }

    pub fn remove(&self, organization_id: &str, model: &str) -> Option<RoutingPolicy> {
        self.policies
            .write()
            .remove(&(organization_id.to_string(), model.to_string()))
    }

    pub fn len(&self) -> usize {
        self.policies.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, organization_id: &str, model: &str) -> Option<RoutingPolicy> {
        self.policies
            .read()
            .get(&(organization_id.to_string(), model.to_string()))
            .cloned()
    }
}

impl PolicyLoader for StaticPolicyLoader {
    fn load_policy(
        &self,
        organization_id: &str,
        model: &str,
    ) -> Result<RoutingPolicy, PolicyError> {
        if let Some(policy) = self.get(organization_id, model) {
            return Ok(policy);
        }
        if organization_id != GLOBAL_ORGANIZATION {
            if let Some(policy) = self.get(GLOBAL_ORGANIZATION, model) {
                return Ok(policy);
            }
        }
        Err(PolicyError::NotFound {
            organization_id: organization_id.to_string(),
            model: model.to_string(),
        })
    }
}
