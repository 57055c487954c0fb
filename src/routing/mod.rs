//! Health-aware weighted routing with failover.
//!
//! The engine narrows a policy's backends to the ones currently usable, then
//! either draws one by weight ([`RoutingEngine::select_backend`]) or walks the
//! candidates in weight order until one answers
//! ([`RoutingEngine::route_with_failover`]). Every choice is recorded in a
//! bounded history and reported to the observer.

mod config;
mod decision;
mod error;
mod selection;

#[cfg(test)]
mod tests;

pub use config::{FailoverMode, RoutingConfig};
pub use decision::{DecisionHistory, DecisionType, RoutingDecision};
pub use error::RoutingError;
pub use selection::{failover_order, pick_weighted, random_below, select_weighted, total_weight};

use crate::client::{BackendEndpoint, BackendRequest, BackendResponse, InferenceClient};
use crate::health::HealthMonitor;
use crate::policy::{BackendWeight, RoutingPolicy};
use crate::registry::BackendRegistry;
use crate::telemetry::{NoopObserver, RoutingObserver};
use std::collections::HashSet;
use std::sync::Arc;

pub struct RoutingEngine {
    backends: Arc<BackendRegistry>,
    health: Option<Arc<HealthMonitor>>,
    config: RoutingConfig,
    history: DecisionHistory,
    observer: Arc<dyn RoutingObserver>,
}

impl RoutingEngine {
    /// Create an engine. Without a health monitor only the policy's own
    /// `degraded_backends` list excludes backends.
    pub fn new(
        backends: Arc<BackendRegistry>,
        health: Option<Arc<HealthMonitor>>,
        config: RoutingConfig,
    ) -> Self {
        Self {
            backends,
            health,
            history: DecisionHistory::new(config.history_capacity),
            config,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RoutingObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Backends of `policy` that may receive traffic, in policy order.
    ///
    /// Drops the policy's `degraded_backends` and anything the health monitor
    /// reports degraded. If that leaves nothing and degraded fallback is
    /// enabled, every configured backend is returned instead.
    pub fn available_backends(&self, policy: &RoutingPolicy) -> Vec<BackendWeight> {
        if policy.backends.is_empty() {
            return Vec::new();
        }

        let excluded: HashSet<&str> = policy.degraded_backends.iter().map(String::as_str).collect();
        let available: Vec<BackendWeight> = policy
            .backends
            .iter()
            .filter(|b| !excluded.contains(b.backend_id.as_str()))
            .filter(|b| {
                self.health
                    .as_ref()
                    .map_or(true, |h| !h.is_degraded(&b.backend_id))
            })
            .cloned()
            .collect();

        if available.is_empty() && self.config.degraded_fallback {
            tracing::warn!(
                organization_id = %policy.organization_id,
                model = %policy.model,
                backends = policy.backends.len(),
                "All backends degraded, using all backends as fallback"
            );
            return policy.backends.clone();
        }

        available
    }

    fn candidates(&self, policy: &RoutingPolicy) -> Result<Vec<BackendWeight>, RoutingError> {
        if policy.backends.is_empty() {
            return Err(RoutingError::NoBackendsConfigured {
                organization_id: policy.organization_id.clone(),
                model: policy.model.clone(),
            });
        }

        let available = self.available_backends(policy);
        if available.is_empty() {
            return Err(RoutingError::NoAvailableBackends {
                organization_id: policy.organization_id.clone(),
                model: policy.model.clone(),
                excluded: policy
                    .backends
                    .iter()
                    .map(|b| b.backend_id.clone())
                    .collect(),
            });
        }
        Ok(available)
    }

    fn resolve(&self, backend_id: &str, model: &str) -> Result<BackendEndpoint, RoutingError> {
        self.backends
            .resolve(backend_id, model)
            .map_err(|source| RoutingError::UnresolvedBackend {
                backend_id: backend_id.to_string(),
                source,
            })
    }

    fn record(&self, decision: &RoutingDecision) {
        self.observer.on_decision(decision);
        self.history.push(decision.clone());
    }

    /// Pick one backend by weight without forwarding anything.
    pub fn select_backend(
        &self,
        policy: &RoutingPolicy,
    ) -> Result<(BackendEndpoint, RoutingDecision), RoutingError> {
        let available = self.candidates(policy)?;

        let selected = pick_weighted(&available).ok_or_else(|| {
            RoutingError::NoAvailableBackends {
                organization_id: policy.organization_id.clone(),
                model: policy.model.clone(),
                excluded: Vec::new(),
            }
        })?;

        let endpoint = self.resolve(&selected.backend_id, &policy.model)?;

        let decision = RoutingDecision::new(
            &selected.backend_id,
            DecisionType::Weighted,
            format!("weighted selection (weight: {})", selected.weight),
            1,
            &policy.organization_id,
            &policy.model,
        );

        tracing::debug!(
            backend_id = %decision.backend_id,
            organization_id = %policy.organization_id,
            model = %policy.model,
            candidates = available.len(),
            "Backend selected"
        );

        self.record(&decision);
        Ok((endpoint, decision))
    }

    /// Forward `request`, failing over across backends in weight order.
    ///
    /// Returns the first successful response with the decision that produced
    /// it. Each failed attempt is recorded with its error appended to the
    /// reason.
    pub async fn route_with_failover(
        &self,
        policy: &RoutingPolicy,
        request: &BackendRequest,
        client: &dyn InferenceClient,
    ) -> Result<(BackendResponse, RoutingDecision), RoutingError> {
        let ordered = failover_order(&self.candidates(policy)?);
        let total = ordered.len();
        let threshold = policy.failover_threshold;

        let mut attempted = Vec::with_capacity(total);
        let mut last_failure = None;
        let mut alerted = false;

        for (index, candidate) in ordered.iter().enumerate() {
            let attempt = index as u32 + 1;
            let endpoint = self.resolve(&candidate.backend_id, &policy.model)?;

            let decision_type = if index == 0 {
                DecisionType::Primary
            } else {
                DecisionType::Failover
            };
            let mut decision = RoutingDecision::new(
                &candidate.backend_id,
                decision_type,
                format!("attempt {} (weight: {})", attempt, candidate.weight),
                attempt,
                &policy.organization_id,
                &policy.model,
            );

            attempted.push(candidate.backend_id.clone());

            let error = match client.forward_request(&endpoint, request).await {
                Ok(response) => {
                    tracing::debug!(
                        backend_id = %candidate.backend_id,
                        attempt,
                        decision_type = %decision_type,
                        "Backend request succeeded"
                    );
                    self.record(&decision);
                    return Ok((response, decision));
                }
                Err(e) => e,
            };

            decision.reason = format!("{} - error: {}", decision.reason, error);
            self.record(&decision);

            tracing::warn!(
                backend_id = %candidate.backend_id,
                attempt,
                total_backends = total,
                error = %error,
                "Backend request failed, trying failover"
            );

            last_failure = Some((error, decision));

            if threshold > 0 && attempt >= threshold {
                match self.config.failover_mode {
                    FailoverMode::HardStop => {
                        tracing::warn!(
                            organization_id = %policy.organization_id,
                            model = %policy.model,
                            attempts = attempt,
                            failover_threshold = threshold,
                            "Failover threshold reached, stopping"
                        );
                        break;
                    }
                    FailoverMode::AlertOnly if !alerted && index + 1 < total => {
                        alerted = true;
                        tracing::warn!(
                            organization_id = %policy.organization_id,
                            model = %policy.model,
                            attempts = attempt,
                            failover_threshold = threshold,
                            "Failover threshold reached, continuing with remaining backends"
                        );
                        self.observer.on_failover_threshold(policy, attempt);
                    }
                    FailoverMode::AlertOnly => {}
                }
            }
        }

        match last_failure {
            Some((last_error, last_decision)) => Err(RoutingError::AllBackendsFailed {
                organization_id: policy.organization_id.clone(),
                model: policy.model.clone(),
                attempted,
                last_error,
                last_decision: Box::new(last_decision),
            }),
            None => Err(RoutingError::NoAvailableBackends {
                organization_id: policy.organization_id.clone(),
                model: policy.model.clone(),
                excluded: Vec::new(),
            }),
        }
    }

    /// Up to `limit` most recent decisions, oldest first. 0 returns all.
    pub fn get_recent_decisions(&self, limit: usize) -> Vec<RoutingDecision> {
        self.history.recent(limit)
    }
}
