//! Unit tests for the routing engine.

use super::*;
use crate::client::ClientError;
use crate::health::{HealthCheckConfig, HealthMonitor};
use crate::registry::BackendDefinition;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// Client that fails for a fixed set of backend ids and records call order.
#[derive(Default)]
struct ScriptedClient {
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedClient {
    fn failing(ids: &[&str]) -> Self {
        Self {
            failing: ids.iter().map(|s| s.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl InferenceClient for ScriptedClient {
    async fn forward_request(
        &self,
        endpoint: &BackendEndpoint,
        _request: &BackendRequest,
    ) -> Result<BackendResponse, ClientError> {
        self.calls.lock().push(endpoint.id.clone());
        if self.failing.contains(&endpoint.id) {
            Err(ClientError::Upstream {
                status: 503,
                message: format!("{} down", endpoint.id),
            })
        } else {
            Ok(BackendResponse {
                text: format!("from {}", endpoint.id),
                ..Default::default()
            })
        }
    }

    async fn health_check(
        &self,
        endpoint: &BackendEndpoint,
        _timeout: Duration,
    ) -> Result<(), ClientError> {
        if self.failing.contains(&endpoint.id) {
            Err(ClientError::Network("refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[derive(Default)]
struct ThresholdObserver {
    crossings: AtomicU32,
    decisions: AtomicU32,
}

impl RoutingObserver for ThresholdObserver {
    fn on_decision(&self, _decision: &RoutingDecision) {
        self.decisions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_failover_threshold(&self, _policy: &RoutingPolicy, _attempts: u32) {
        self.crossings.fetch_add(1, Ordering::SeqCst);
    }
}

fn registry(ids: &[&str]) -> Arc<BackendRegistry> {
    let registry = BackendRegistry::new();
    for id in ids {
        registry.register_backend(BackendDefinition::new(*id, format!("http://{}.test", id)));
    }
    Arc::new(registry)
}

fn policy(weights: &[(&str, u32)]) -> RoutingPolicy {
    RoutingPolicy::new(
        "acme",
        "llama-3-8b",
        weights
            .iter()
            .map(|(id, w)| BackendWeight::new(*id, *w))
            .collect(),
    )
}

fn engine(ids: &[&str]) -> RoutingEngine {
    RoutingEngine::new(registry(ids), None, RoutingConfig::default())
}

fn ids(backends: &[BackendWeight]) -> Vec<&str> {
    backends.iter().map(|b| b.backend_id.as_str()).collect()
}

// ============================================================================
// Selection Primitive Tests
// ============================================================================

#[test]
fn test_select_weighted_walks_cumulative_line() {
    let backends = vec![
        BackendWeight::new("a", 2),
        BackendWeight::new("zero", 0),
        BackendWeight::new("b", 3),
    ];
    assert_eq!(select_weighted(&backends, 0).unwrap().backend_id, "a");
    assert_eq!(select_weighted(&backends, 1).unwrap().backend_id, "a");
    assert_eq!(select_weighted(&backends, 2).unwrap().backend_id, "b");
    assert_eq!(select_weighted(&backends, 4).unwrap().backend_id, "b");
}

#[test]
fn test_pick_weighted_without_positive_weights_returns_first() {
    let backends = vec![BackendWeight::new("first", 0), BackendWeight::new("second", 0)];
    for _ in 0..20 {
        assert_eq!(pick_weighted(&backends).unwrap().backend_id, "first");
    }
    assert!(pick_weighted(&[]).is_none());
}

#[test]
fn test_random_below_in_range() {
    assert_eq!(random_below(0), 0);
    assert_eq!(random_below(1), 0);
    for _ in 0..1000 {
        assert!(random_below(7) < 7);
    }
}

#[test]
fn test_failover_order_is_stable() {
    let backends = vec![
        BackendWeight::new("a", 10),
        BackendWeight::new("b", 50),
        BackendWeight::new("c", 10),
        BackendWeight::new("d", 50),
    ];
    assert_eq!(ids(&failover_order(&backends)), vec!["b", "d", "a", "c"]);
}

#[test]
fn test_weighted_distribution_within_tolerance() {
    let backends = vec![
        BackendWeight::new("a", 50),
        BackendWeight::new("b", 30),
        BackendWeight::new("c", 20),
    ];
    let draws = 20_000;
    let mut counts: HashMap<String, usize> = HashMap::new();
    for _ in 0..draws {
        let picked = pick_weighted(&backends).unwrap();
        *counts.entry(picked.backend_id.clone()).or_default() += 1;
    }

    for (id, expected) in [("a", 0.5), ("b", 0.3), ("c", 0.2)] {
        let observed = counts[id] as f64 / draws as f64;
        assert!(
            (observed - expected).abs() < 0.03,
            "{} observed {:.3}, expected {:.3}",
            id,
            observed,
            expected
        );
    }
}

// ============================================================================
// Available Set Tests
// ============================================================================

#[test]
fn test_available_excludes_policy_degraded_list() {
    let engine = engine(&["a", "b", "c"]);
    let policy = policy(&[("a", 1), ("b", 1), ("c", 1)]).with_degraded_backends(vec!["b".into()]);
    assert_eq!(ids(&engine.available_backends(&policy)), vec!["a", "c"]);
}

#[tokio::test]
async fn test_available_excludes_health_degraded() {
    let client = Arc::new(ScriptedClient::failing(&["b"]));
    let backends = registry(&["a", "b"]);
    let health = Arc::new(HealthMonitor::new(client, HealthCheckConfig::default()));
    for def in backends.list_backends() {
        health.check_backend_now(&def.id, def.endpoint("m")).await.ok();
    }
    let engine = RoutingEngine::new(backends, Some(health), RoutingConfig::default());

    assert_eq!(
        ids(&engine.available_backends(&policy(&[("a", 1), ("b", 9)]))),
        vec!["a"]
    );
}

#[test]
fn test_unregistered_backends_count_as_degraded() {
    let client = Arc::new(ScriptedClient::default());
    let health = Arc::new(HealthMonitor::new(client, HealthCheckConfig::default()));
    health.register_backend("a", BackendEndpoint::new("a", "http://a", "", Duration::from_secs(1)));
    let engine = RoutingEngine::new(registry(&["a", "b"]), Some(health), RoutingConfig::default());

    // "a" is registered but unknown (not degraded); "b" is unregistered.
    assert_eq!(
        ids(&engine.available_backends(&policy(&[("a", 1), ("b", 1)]))),
        vec!["a"]
    );
}

#[test]
fn test_all_degraded_falls_back_to_full_set() {
    let engine = engine(&["a", "b"]);
    let policy = policy(&[("a", 1), ("b", 2)])
        .with_degraded_backends(vec!["a".into(), "b".into()]);
    assert_eq!(ids(&engine.available_backends(&policy)), vec!["a", "b"]);
}

#[test]
fn test_all_degraded_without_fallback_is_error() {
    let config = RoutingConfig {
        degraded_fallback: false,
        ..Default::default()
    };
    let engine = RoutingEngine::new(registry(&["a", "b"]), None, config);
    let policy = policy(&[("a", 1), ("b", 2)])
        .with_degraded_backends(vec!["a".into(), "b".into()]);

    assert!(engine.available_backends(&policy).is_empty());
    match engine.select_backend(&policy) {
        Err(RoutingError::NoAvailableBackends { excluded, model, .. }) => {
            assert_eq!(excluded, vec!["a", "b"]);
            assert_eq!(model, "llama-3-8b");
        }
        other => panic!("expected NoAvailableBackends, got {:?}", other),
    }
}

// ============================================================================
// select_backend Tests
// ============================================================================

#[test]
fn test_select_empty_policy_is_error() {
    let engine = engine(&[]);
    assert!(matches!(
        engine.select_backend(&policy(&[])),
        Err(RoutingError::NoBackendsConfigured { .. })
    ));
}

#[test]
fn test_select_records_weighted_decision() {
    let engine = engine(&["a"]);
    let (endpoint, decision) = engine.select_backend(&policy(&[("a", 40)])).unwrap();

    assert_eq!(endpoint.id, "a");
    assert_eq!(endpoint.model_variant, "llama-3-8b");
    assert_eq!(decision.decision_type, DecisionType::Weighted);
    assert_eq!(decision.reason, "weighted selection (weight: 40)");
    assert_eq!(decision.attempt_number, 1);
    assert_eq!(decision.organization_id, "acme");
    assert_eq!(engine.get_recent_decisions(0), vec![decision]);
}

#[test]
fn test_select_unresolved_backend_is_hard_error() {
    let engine = engine(&[]);
    match engine.select_backend(&policy(&[("ghost", 1)])) {
        Err(RoutingError::UnresolvedBackend { backend_id, .. }) => assert_eq!(backend_id, "ghost"),
        other => panic!("expected UnresolvedBackend, got {:?}", other),
    }
    assert!(engine.get_recent_decisions(0).is_empty());
}

#[test]
fn test_select_one_to_three_ratio() {
    let engine = engine(&["a", "b"]);
    let policy = policy(&[("a", 1), ("b", 3)]);
    let mut b_count = 0;
    for _ in 0..1000 {
        let (endpoint, _) = engine.select_backend(&policy).unwrap();
        if endpoint.id == "b" {
            b_count += 1;
        }
    }
    let a_count = 1000 - b_count;
    // Expected 750 / 250.
    assert!((650..=850).contains(&b_count), "b selected {} times", b_count);
    assert!(b_count > 2 * a_count);
}

// ============================================================================
// route_with_failover Tests
// ============================================================================

#[tokio::test]
async fn test_failover_reaches_third_backend() {
    let engine = engine(&["a", "b", "c"]);
    let client = ScriptedClient::failing(&["a", "b"]);
    let policy = policy(&[("c", 10), ("a", 50), ("b", 30)]);

    let (response, decision) = engine
        .route_with_failover(&policy, &BackendRequest::new("hi"), &client)
        .await
        .unwrap();

    assert_eq!(response.text, "from c");
    assert_eq!(decision.backend_id, "c");
    assert_eq!(decision.decision_type, DecisionType::Failover);
    assert_eq!(decision.attempt_number, 3);
    assert_eq!(decision.reason, "attempt 3 (weight: 10)");
    assert_eq!(client.calls(), vec!["a", "b", "c"]);

    let history = engine.get_recent_decisions(0);
    assert_eq!(history.len(), 3);
    assert_eq!(history[0].decision_type, DecisionType::Primary);
    assert_eq!(
        history[0].reason,
        "attempt 1 (weight: 50) - error: backend returned status 503: a down"
    );
}

#[tokio::test]
async fn test_primary_success_stops_immediately() {
    let engine = engine(&["a", "b"]);
    let client = ScriptedClient::default();

    let (_, decision) = engine
        .route_with_failover(&policy(&[("a", 1), ("b", 5)]), &BackendRequest::new("hi"), &client)
        .await
        .unwrap();

    assert_eq!(decision.backend_id, "b");
    assert_eq!(decision.decision_type, DecisionType::Primary);
    assert_eq!(client.calls(), vec!["b"]);
}

#[tokio::test]
async fn test_all_backends_failed() {
    let engine = engine(&["a", "b"]);
    let client = ScriptedClient::failing(&["a", "b"]);

    let err = engine
        .route_with_failover(&policy(&[("a", 2), ("b", 1)]), &BackendRequest::new("hi"), &client)
        .await
        .unwrap_err();

    match err {
        RoutingError::AllBackendsFailed {
            attempted,
            last_error,
            last_decision,
            organization_id,
            ..
        } => {
            assert_eq!(attempted, vec!["a", "b"]);
            assert_eq!(organization_id, "acme");
            assert_eq!(last_decision.backend_id, "b");
            assert_eq!(last_decision.attempt_number, 2);
            assert!(matches!(last_error, ClientError::Upstream { status: 503, .. }));
        }
        other => panic!("expected AllBackendsFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_failover_unresolved_backend_is_hard_error() {
    let engine = engine(&["a"]);
    let client = ScriptedClient::failing(&["a"]);

    let err = engine
        .route_with_failover(
            &policy(&[("a", 5), ("ghost", 1)]),
            &BackendRequest::new("hi"),
            &client,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RoutingError::UnresolvedBackend { .. }));
}

#[tokio::test]
async fn test_hard_stop_respects_threshold() {
    let config = RoutingConfig {
        failover_mode: FailoverMode::HardStop,
        ..Default::default()
    };
    let engine = RoutingEngine::new(registry(&["a", "b", "c"]), None, config);
    let client = ScriptedClient::failing(&["a", "b", "c"]);
    let policy = policy(&[("a", 3), ("b", 2), ("c", 1)]).with_failover_threshold(2);

    let err = engine
        .route_with_failover(&policy, &BackendRequest::new("hi"), &client)
        .await
        .unwrap_err();

    assert_eq!(client.calls(), vec!["a", "b"]);
    assert!(matches!(err, RoutingError::AllBackendsFailed { attempted, .. } if attempted.len() == 2));
}

#[tokio::test]
async fn test_alert_only_notifies_once_and_continues() {
    let observer = Arc::new(ThresholdObserver::default());
    let engine = engine(&["a", "b", "c"]).with_observer(observer.clone());
    let client = ScriptedClient::failing(&["a", "b"]);
    let policy = policy(&[("a", 3), ("b", 2), ("c", 1)]).with_failover_threshold(1);

    let (response, _) = engine
        .route_with_failover(&policy, &BackendRequest::new("hi"), &client)
        .await
        .unwrap();

    assert_eq!(response.text, "from c");
    assert_eq!(observer.crossings.load(Ordering::SeqCst), 1);
    assert_eq!(observer.decisions.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_zero_threshold_never_alerts() {
    let observer = Arc::new(ThresholdObserver::default());
    let engine = engine(&["a", "b"]).with_observer(observer.clone());
    let client = ScriptedClient::failing(&["a"]);

    engine
        .route_with_failover(&policy(&[("a", 2), ("b", 1)]), &BackendRequest::new("hi"), &client)
        .await
        .unwrap();
    assert_eq!(observer.crossings.load(Ordering::SeqCst), 0);
}

// ============================================================================
// Decision History Tests
// ============================================================================

#[test]
fn test_history_evicts_oldest() {
    let history = DecisionHistory::new(100);
    for i in 0..105 {
        history.push(RoutingDecision::new(
            format!("b{}", i),
            DecisionType::Weighted,
            "",
            1,
            "o",
            "m",
        ));
    }
    assert_eq!(history.len(), 100);
    let all = history.recent(0);
    assert_eq!(all.first().unwrap().backend_id, "b5");
    assert_eq!(all.last().unwrap().backend_id, "b104");
}

#[test]
fn test_history_recent_limit() {
    let history = DecisionHistory::new(10);
    assert!(history.is_empty());
    for i in 0..4 {
        history.push(RoutingDecision::new(
            format!("b{}", i),
            DecisionType::Weighted,
            "",
            1,
            "o",
            "m",
        ));
    }
    let last_two: Vec<_> = history.recent(2).into_iter().map(|d| d.backend_id).collect();
    assert_eq!(last_two, vec!["b2", "b3"]);
    assert_eq!(history.recent(50).len(), 4);
}

#[test]
fn test_decision_type_serializes_uppercase() {
    assert_eq!(
        serde_json::to_string(&DecisionType::Failover).unwrap(),
        "\"FAILOVER\""
    );
}

#[test]
fn test_failover_mode_parsing() {
    assert_eq!("hard_stop".parse::<FailoverMode>().unwrap(), FailoverMode::HardStop);
    assert_eq!("Alert-Only".parse::<FailoverMode>().unwrap(), FailoverMode::AlertOnly);
    assert!("sometimes".parse::<FailoverMode>().is_err());
}
