//! # Routing telemetry hooks
//!
//! The routing core never touches a global metrics registry directly. It
//! reports every decision, health transition and failover-threshold crossing
//! to an injected [`RoutingObserver`]. [`MetricsObserver`] adapts those events
//! onto the `metrics` facade; exporters are installed by the host process.
//!
//! ## Metrics emitted by [`MetricsObserver`]
//!
//! **Counters:**
//! - `switchboard_routing_decisions_total{backend, decision_type}`
//! - `switchboard_failover_total{organization, model}` - threshold crossings
//! - `switchboard_health_transitions_total{backend, status}`
//!
//! **Gauges:**
//! - `switchboard_backend_health_status{backend}` - 1 healthy, 0 degraded, -1 unhealthy

mod metrics;

pub use self::metrics::MetricsObserver;

use crate::health::HealthTransition;
use crate::policy::RoutingPolicy;
use crate::routing::RoutingDecision;

/// Receives routing events. All methods default to no-ops.
///
/// Implementations must be cheap and must not block: they run inline on the
/// request path and inside the health sweep.
pub trait RoutingObserver: Send + Sync {
    fn on_decision(&self, _decision: &RoutingDecision) {}

    fn on_health_transition(&self, _transition: &HealthTransition) {}

    /// A request reached the policy's failover threshold with candidates left.
    fn on_failover_threshold(&self, _policy: &RoutingPolicy, _attempts: u32) {}
}

/// Observer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RoutingObserver for NoopObserver {}
