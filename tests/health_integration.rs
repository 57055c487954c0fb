//! Integration tests for the health monitor with mock HTTP servers.

mod common;

use common::*;
use std::sync::Arc;
use std::time::Duration;
use switchboard::client::{BackendClient, BackendEndpoint};
use switchboard::health::{HealthCheckConfig, HealthError, HealthMonitor, HealthStatus};
use tokio::time::sleep;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn endpoint(id: &str, server: &MockServer) -> BackendEndpoint {
    BackendEndpoint::new(id, generate_uri(server), "", Duration::from_secs(5))
}

#[tokio::test]
async fn test_status_transitions_reach_unhealthy_at_threshold() {
    let server = failing_backend(500).await;
    let observer = RecordingObserver::new();
    let monitor = HealthMonitor::new(Arc::new(BackendClient::new()), HealthCheckConfig::default())
        .with_observer(observer.clone());

    let mut statuses = Vec::new();
    for _ in 0..3 {
        assert!(monitor
            .check_backend_now("a", endpoint("a", &server))
            .await
            .is_err());
        statuses.push(monitor.get_health("a").unwrap().status);
    }

    assert_eq!(
        statuses,
        vec![
            HealthStatus::Degraded,
            HealthStatus::Degraded,
            HealthStatus::Unhealthy
        ]
    );

    let health = monitor.get_health("a").unwrap();
    assert_eq!(health.consecutive_errors, 3);
    assert!(health.last_error.unwrap().contains("500"));
    assert!(health.last_check.is_some());

    let transitions = observer.transitions.lock().clone();
    assert_eq!(transitions.len(), 2);
    assert_eq!(transitions[0].from, HealthStatus::Unknown);
    assert_eq!(transitions[0].to, HealthStatus::Degraded);
    assert_eq!(transitions[1].to, HealthStatus::Unhealthy);
}

#[tokio::test]
async fn test_recovery_resets_error_count() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/generate/health"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/generate/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let observer = RecordingObserver::new();
    let monitor = HealthMonitor::new(Arc::new(BackendClient::new()), HealthCheckConfig::default())
        .with_observer(observer.clone());

    for _ in 0..2 {
        let _ = monitor.check_backend_now("a", endpoint("a", &server)).await;
    }
    assert!(monitor.is_degraded("a"));

    monitor
        .check_backend_now("a", endpoint("a", &server))
        .await
        .unwrap();

    let health = monitor.get_health("a").unwrap();
    assert_eq!(health.status, HealthStatus::Healthy);
    assert_eq!(health.consecutive_errors, 0);
    assert!(health.last_error.is_none());
    assert_eq!(
        observer.transitions.lock().last().map(|t| t.to),
        Some(HealthStatus::Healthy)
    );
}

#[tokio::test]
async fn test_background_loop_probes_until_stopped() {
    let server = healthy_backend("ok").await;
    let config = HealthCheckConfig {
        interval_seconds: 1,
        ..Default::default()
    };
    let monitor = Arc::new(HealthMonitor::new(Arc::new(BackendClient::new()), config));
    monitor.register_backend("a", endpoint("a", &server));

    monitor.start().unwrap();
    assert_eq!(monitor.start(), Err(HealthError::AlreadyStarted));

    sleep(Duration::from_millis(300)).await;
    assert!(monitor.is_healthy("a"));

    monitor.stop().await;
    let probes = server.received_requests().await.unwrap().len();
    sleep(Duration::from_millis(1500)).await;
    assert_eq!(server.received_requests().await.unwrap().len(), probes);
}

#[tokio::test]
async fn test_unreachable_backend_counts_as_failure() {
    let monitor = HealthMonitor::new(Arc::new(BackendClient::new()), HealthCheckConfig::default());
    let dead = BackendEndpoint::new("dead", "http://127.0.0.1:1/generate", "", Duration::from_secs(1));

    assert!(monitor.check_backend_now("dead", dead).await.is_err());
    let health = monitor.get_health("dead").unwrap();
    assert_eq!(health.status, HealthStatus::Degraded);
    assert!(health.last_error.is_some());
}
