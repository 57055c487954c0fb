//! Shared test utilities for Switchboard integration tests.
//!
//! Provides mock backends, policy builders and a recording observer to
//! reduce duplication across test files.

#![allow(dead_code)]

use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use switchboard::config::{BackendConfig, SwitchboardConfig};
use switchboard::health::HealthTransition;
use switchboard::policy::{BackendWeight, PolicyError, PolicyLoader, RoutingPolicy};
use switchboard::routing::RoutingDecision;
use switchboard::telemetry::RoutingObserver;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ORG: &str = "acme";
pub const MODEL: &str = "llama-3-8b";

// =============================================================================
// Mock Backends
// =============================================================================

/// Inference URI of a mock server; health probes go to `{uri}/health`.
pub fn generate_uri(server: &MockServer) -> String {
    format!("{}/generate", server.uri())
}

/// Start a backend that answers inference with `text` and health with 200.
pub async fn healthy_backend(text: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "text": text,
            "tokens_used": 7,
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/generate/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

/// Start a backend that fails every request with `status`.
pub async fn failing_backend(status: u16) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(status).set_body_string("backend overloaded"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&server)
        .await;
    server
}

// =============================================================================
// Config and Policy Builders
// =============================================================================

/// Config with one backend per `(id, server)` pair and health checks off.
pub fn config_with_backends(backends: &[(&str, &MockServer)]) -> SwitchboardConfig {
    let mut config = SwitchboardConfig {
        backends: backends
            .iter()
            .map(|(id, server)| BackendConfig::new(*id, generate_uri(server)))
            .collect(),
        ..Default::default()
    };
    config.health_check.enabled = false;
    config
}

/// Policy for `(ORG, MODEL)` with the given `(backend_id, weight)` pairs.
pub fn make_policy(weights: &[(&str, u32)]) -> RoutingPolicy {
    RoutingPolicy::new(
        ORG,
        MODEL,
        weights
            .iter()
            .map(|(id, w)| BackendWeight::new(*id, *w))
            .collect(),
    )
}

/// Loader that serves fixed policies and counts loads.
pub struct CountingLoader {
    policies: Vec<RoutingPolicy>,
    pub loads: AtomicUsize,
}

impl CountingLoader {
    pub fn new(policies: Vec<RoutingPolicy>) -> Arc<Self> {
        Arc::new(Self {
            policies,
            loads: AtomicUsize::new(0),
        })
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl PolicyLoader for CountingLoader {
    fn load_policy(&self, organization_id: &str, model: &str) -> Result<RoutingPolicy, PolicyError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.policies
            .iter()
            .find(|p| p.organization_id == organization_id && p.model == model)
            .cloned()
            .ok_or_else(|| PolicyError::NotFound {
                organization_id: organization_id.to_string(),
                model: model.to_string(),
            })
    }
}

// =============================================================================
// Observers
// =============================================================================

#[derive(Default)]
pub struct RecordingObserver {
    pub decisions: Mutex<Vec<RoutingDecision>>,
    pub transitions: Mutex<Vec<HealthTransition>>,
    pub threshold_alerts: Mutex<Vec<(String, u32)>>,
}

impl RecordingObserver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl RoutingObserver for RecordingObserver {
    fn on_decision(&self, decision: &RoutingDecision) {
        self.decisions.lock().push(decision.clone());
    }

    fn on_health_transition(&self, transition: &HealthTransition) {
        self.transitions.lock().push(transition.clone());
    }

    fn on_failover_threshold(&self, policy: &RoutingPolicy, attempts: u32) {
        self.threshold_alerts
            .lock()
            .push((policy.policy_id.clone(), attempts));
    }
}
