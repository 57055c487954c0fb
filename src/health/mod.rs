//! Health monitoring for routed backends.
//!
//! The monitor owns one [`BackendHealth`] per registered backend, refreshes it
//! from a periodic probe loop, and answers the synchronous health queries the
//! routing engine makes on every request.

mod config;
mod error;
mod state;


pub use config::*;
pub use error::*;
pub use state::*;

use crate::client::{BackendEndpoint, ClientError, InferenceClient};
use crate::telemetry::{NoopObserver, RoutingObserver};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Stored per backend: the probe target and its current health.
#[derive(Debug)]
struct MonitoredBackend {
    endpoint: BackendEndpoint,
    health: BackendHealth,
}

type Entry = Arc<Mutex<MonitoredBackend>>;

/// Background service that tracks backend health.
///
/// Each backend sits behind its own mutex, so a slow probe or update on one
/// backend never blocks queries about another. Locks are never held across
/// a probe.
pub struct HealthMonitor {
    client: Arc<dyn InferenceClient>,
    config: HealthCheckConfig,
    backends: DashMap<String, Entry>,
    observer: Arc<dyn RoutingObserver>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
}

impl HealthMonitor {
    pub fn new(client: Arc<dyn InferenceClient>, config: HealthCheckConfig) -> Self {
        Self {
            client,
            config,
            backends: DashMap::new(),
            observer: Arc::new(NoopObserver),
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
            started: AtomicBool::new(false),
        }
    }

    /// Forward health transitions to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn RoutingObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &HealthCheckConfig {
        &self.config
    }

    /// Start tracking a backend. Re-registering only replaces the stored endpoint.
    pub fn register_backend(&self, backend_id: &str, endpoint: BackendEndpoint) {
        self.backends
            .entry(backend_id.to_string())
            .and_modify(|entry| entry.lock().endpoint = endpoint.clone())
            .or_insert_with(|| {
                tracing::debug!(backend_id, "Registered backend for health monitoring");
                Arc::new(Mutex::new(MonitoredBackend {
                    endpoint: endpoint.clone(),
                    health: BackendHealth::new(backend_id),
                }))
            });
    }

    /// Stop tracking a backend. Unknown ids are ignored.
    pub fn unregister_backend(&self, backend_id: &str) {
        if self.backends.remove(backend_id).is_some() {
            tracing::debug!(backend_id, "Unregistered backend from health monitoring");
        }
    }

    /// Launch the background probe loop. A monitor can only be started once.
    pub fn start(self: &Arc<Self>) -> Result<(), HealthError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(HealthError::AlreadyStarted);
        }

        let monitor = Arc::clone(self);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(monitor.config.interval());
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            tracing::info!(
                interval_seconds = monitor.config.interval_seconds,
                timeout_seconds = monitor.config.timeout_seconds,
                "Health monitor started"
            );

            loop {
                tokio::select! {
                    _ = monitor.cancel.cancelled() => {
                        tracing::info!("Health monitor shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        let checked = monitor.check_all_backends().await;
                        tracing::debug!(
                            backends_checked = checked,
                            "Health check cycle completed"
                        );
                    }
                }
            }
        });

        *self.task.lock() = Some(handle);
        Ok(())
    }

    /// Cancel the probe loop and wait for the in-flight sweep to finish.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Health monitor task ended abnormally");
            }
        }
    }

    /// Probe every registered backend once, sequentially.
    ///
    /// Stops early between backends once the monitor is cancelled.
    /// Returns the number of backends probed.
    pub async fn check_all_backends(&self) -> usize {
        let entries: Vec<(String, Entry)> = self
            .backends
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();

        let mut checked = 0;
        for (backend_id, entry) in entries {
            if self.cancel.is_cancelled() {
                break;
            }
            let _ = self.probe_entry(&backend_id, &entry).await;
            checked += 1;
        }
        checked
    }

    /// Probe a backend immediately, registering it first if unseen.
    pub async fn check_backend_now(
        &self,
        backend_id: &str,
        endpoint: BackendEndpoint,
    ) -> Result<(), ClientError> {
        self.register_backend(backend_id, endpoint);
        let entry = match self.backends.get(backend_id) {
            Some(e) => Arc::clone(e.value()),
            // Unregistered concurrently; nothing left to update.
            None => return Ok(()),
        };
        self.probe_entry(backend_id, &entry).await
    }

    async fn probe_entry(&self, backend_id: &str, entry: &Entry) -> Result<(), ClientError> {
        let endpoint = entry.lock().endpoint.clone();
        let timeout = self.config.timeout();

        let start = Instant::now();
        let outcome = match tokio::time::timeout(
            timeout,
            self.client.health_check(&endpoint, timeout),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(timeout.as_millis() as u64)),
        };
        let latency = start.elapsed();

        let transition = entry.lock().health.record(
            outcome.as_ref().map(|_| ()).map_err(|e| e.to_string()),
            latency,
            self.config.unhealthy_threshold,
        );

        if let Err(e) = &outcome {
            tracing::debug!(backend_id, error = %e, "Health probe failed");
        }

        if let Some(transition) = transition {
            self.report_transition(&transition);
        }

        outcome
    }

    fn report_transition(&self, t: &HealthTransition) {
        match t.to {
            HealthStatus::Healthy => tracing::info!(
                backend_id = %t.backend_id,
                old_status = %t.from,
                new_status = %t.to,
                "Backend recovered"
            ),
            _ => tracing::warn!(
                backend_id = %t.backend_id,
                old_status = %t.from,
                new_status = %t.to,
                consecutive_errors = t.consecutive_errors,
                error = t.error.as_deref().unwrap_or(""),
                "Backend health degraded"
            ),
        }
        self.observer.on_health_transition(t);
    }

    /// Owned copy of a backend's health, if registered.
    pub fn get_health(&self, backend_id: &str) -> Option<BackendHealth> {
        self.backends
            .get(backend_id)
            .map(|e| e.value().lock().health.clone())
    }

    pub fn is_healthy(&self, backend_id: &str) -> bool {
        self.get_health(backend_id)
            .is_some_and(|h| h.status == HealthStatus::Healthy)
    }

    /// True for degraded, unhealthy and unregistered backends.
    pub fn is_degraded(&self, backend_id: &str) -> bool {
        match self.get_health(backend_id) {
            Some(h) => matches!(h.status, HealthStatus::Degraded | HealthStatus::Unhealthy),
            None => true,
        }
    }

    /// Owned copies of every backend's health, sorted by backend id.
    pub fn snapshot(&self) -> Vec<BackendHealth> {
        let mut all: Vec<BackendHealth> = self
            .backends
            .iter()
            .map(|e| e.value().lock().health.clone())
            .collect();
        all.sort_by(|a, b| a.backend_id.cmp(&b.backend_id));
        all
    }

    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }
}
