//! Routing policy cache.
//!
//! Policies are read on every request and change rarely, so they are held in
//! memory behind a single read-write lock and refreshed by push events
//! (`handle_policy_update` / `handle_policy_delete`) or explicit invalidation.

mod error;
mod loader;
mod types;


pub use error::PolicyError;
pub use loader::{PolicyLoader, StaticPolicyLoader};
pub use types::{BackendWeight, RoutingPolicy, GLOBAL_ORGANIZATION};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Point-in-time cache statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyCacheStats {
    pub policy_count: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct CacheState {
    policies: HashMap<String, Arc<RoutingPolicy>>,
    last_updated: Option<DateTime<Utc>>,
    /// Bumped by every push or invalidation; loads started under an older
    /// generation are returned but not stored.
    generation: u64,
}

/// Read-through cache of routing policies keyed by `organization:model`.
pub struct PolicyCache {
    loader: Arc<dyn PolicyLoader>,
    state: RwLock<CacheState>,
}

impl PolicyCache {
    pub fn new(loader: Arc<dyn PolicyLoader>) -> Self {
        Self {
            loader,
            state: RwLock::new(CacheState::default()),
        }
    }

    fn cache_key(organization_id: &str, model: &str) -> String {
        format!("{}:{}", organization_id, model)
    }

    /// Policy for `(organization_id, model)`, loading it on a miss.
    ///
    /// Hits return the cached `Arc` without calling the loader.
    pub fn get_policy(
        &self,
        organization_id: &str,
        model: &str,
    ) -> Result<Arc<RoutingPolicy>, PolicyError> {
        let key = Self::cache_key(organization_id, model);
        let generation = {
            let state = self.state.read();
            if let Some(policy) = state.policies.get(&key) {
                return Ok(Arc::clone(policy));
            }
            state.generation
        };

        let policy = Arc::new(self.loader.load_policy(organization_id, model)?);
        tracing::debug!(
            organization_id,
            model,
            policy_id = %policy.policy_id,
            "Routing policy loaded into cache"
        );

        let mut state = self.state.write();
        if state.generation != generation {
            tracing::debug!(
                organization_id,
                model,
                "Policy changed during load, not caching loaded copy"
            );
            return Ok(policy);
        }
        // A concurrent miss may have stored first; keep a single shared copy.
        let cached = state
            .policies
            .entry(key)
            .or_insert_with(|| Arc::clone(&policy));
        let cached = Arc::clone(cached);
        state.last_updated = Some(Utc::now());
        Ok(cached)
    }

    /// Insert or replace a policy under its own organization and model.
    pub fn update_policy(&self, policy: RoutingPolicy) {
        let key = Self::cache_key(&policy.organization_id, &policy.model);
        let policy = Arc::new(policy);

        {
            let mut state = self.state.write();
            if policy.is_global() {
                Self::evict_derived(&mut state, &policy.model);
            }
            state.policies.insert(key, Arc::clone(&policy));
            state.generation += 1;
            state.last_updated = Some(Utc::now());
        }

        tracing::info!(
            policy_id = %policy.policy_id,
            organization_id = %policy.organization_id,
            model = %policy.model,
            version = policy.version,
            "Routing policy updated in cache"
        );
    }

    /// Drop the cached policy for `(organization_id, model)`.
    ///
    /// Invalidating a global policy also drops copies of it cached for
    /// individual organizations.
    pub fn invalidate_policy(&self, organization_id: &str, model: &str) {
        {
            let mut state = self.state.write();
            state
                .policies
                .remove(&Self::cache_key(organization_id, model));
            if organization_id == GLOBAL_ORGANIZATION {
                Self::evict_derived(&mut state, model);
            }
            state.generation += 1;
        }

        tracing::info!(organization_id, model, "Routing policy invalidated");
    }

    pub fn invalidate_all(&self) {
        {
            let mut state = self.state.write();
            state.policies.clear();
            state.generation += 1;
        }
        tracing::info!("All routing policies invalidated");
    }

    /// Push hook for an upserted policy.
    pub fn handle_policy_update(&self, policy: RoutingPolicy) {
        self.update_policy(policy);
    }

    /// Push hook for a deleted policy.
    pub fn handle_policy_delete(&self, organization_id: &str, model: &str) {
        self.invalidate_policy(organization_id, model);
    }

    pub fn stats(&self) -> PolicyCacheStats {
        let state = self.state.read();
        PolicyCacheStats {
            policy_count: state.policies.len(),
            last_updated: state.last_updated,
        }
    }

    /// Remove global policies for `model` stored under organization keys.
    fn evict_derived(state: &mut CacheState, model: &str) {
        state
            .policies
            .retain(|_, p| !(p.is_global() && p.model == model));
    }
}
