//! `metrics` facade adapter.

use super::RoutingObserver;
use crate::health::HealthTransition;
use crate::policy::RoutingPolicy;
use crate::routing::RoutingDecision;

/// Publishes routing events through the `metrics` macros.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObserver;

impl RoutingObserver for MetricsObserver {
    fn on_decision(&self, decision: &RoutingDecision) {
        metrics::counter!("switchboard_routing_decisions_total",
            "backend" => decision.backend_id.clone(),
            "decision_type" => decision.decision_type.as_str()
        )
        .increment(1);
    }

    fn on_health_transition(&self, transition: &HealthTransition) {
        metrics::gauge!("switchboard_backend_health_status",
            "backend" => transition.backend_id.clone()
        )
        .set(transition.to.gauge_value());

        metrics::counter!("switchboard_health_transitions_total",
            "backend" => transition.backend_id.clone(),
            "status" => transition.to.as_str()
        )
        .increment(1);
    }

    fn on_failover_threshold(&self, policy: &RoutingPolicy, _attempts: u32) {
        metrics::counter!("switchboard_failover_total",
            "organization" => policy.organization_id.clone(),
            "model" => policy.model.clone()
        )
        .increment(1);
    }
}
