//! Gateway facade composing the routing core.
//!
//! Owns the backend registry, health monitor, policy cache, optional model
//! registry and routing engine built from one [`SwitchboardConfig`]. A
//! transport layer only needs [`Gateway::route`] and [`Gateway::select`].

use crate::client::{BackendEndpoint, BackendRequest, BackendResponse, InferenceClient};
use crate::config::SwitchboardConfig;
use crate::health::{HealthError, HealthMonitor};
use crate::model_registry::{ModelRegistry, ModelRegistryEntry, ModelRegistryError};
use crate::policy::{PolicyCache, PolicyLoader};
use crate::registry::{BackendDefinition, BackendRegistry, DEFAULT_BACKEND_TIMEOUT};
use crate::routing::{RoutingDecision, RoutingEngine, RoutingError};
use crate::telemetry::{NoopObserver, RoutingObserver};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::Instrument;

pub struct Gateway {
    client: Arc<dyn InferenceClient>,
    backends: Arc<BackendRegistry>,
    health: Arc<HealthMonitor>,
    policies: Arc<PolicyCache>,
    models: Option<Arc<ModelRegistry>>,
    engine: RoutingEngine,
    health_enabled: bool,
    /// Backend ids registered from model deployments
    deployments: Mutex<HashSet<String>>,
}

impl Gateway {
    /// Build a gateway that reports to no observer.
    pub fn from_config(
        config: &SwitchboardConfig,
        client: Arc<dyn InferenceClient>,
        loader: Arc<dyn PolicyLoader>,
        models: Option<Arc<ModelRegistry>>,
    ) -> Self {
        Self::from_config_with_observer(config, client, loader, models, Arc::new(NoopObserver))
    }

    /// Build a gateway; configured backends are registered with both the
    /// backend registry and the health monitor.
    pub fn from_config_with_observer(
        config: &SwitchboardConfig,
        client: Arc<dyn InferenceClient>,
        loader: Arc<dyn PolicyLoader>,
        models: Option<Arc<ModelRegistry>>,
        observer: Arc<dyn RoutingObserver>,
    ) -> Self {
        let backends = Arc::new(BackendRegistry::from_config(&config.backends));

        let health = Arc::new(
            HealthMonitor::new(Arc::clone(&client), config.health_check.clone())
                .with_observer(Arc::clone(&observer)),
        );
        for backend in backends.list_backends() {
            health.register_backend(&backend.id, backend.endpoint(""));
        }

        let engine = RoutingEngine::new(
            Arc::clone(&backends),
            Some(Arc::clone(&health)),
            config.routing.clone(),
        )
        .with_observer(observer);

        tracing::info!(
            environment = %config.environment,
            backends = backends.backend_count(),
            model_registry = models.is_some(),
            "Gateway initialized"
        );

        Self {
            client,
            backends,
            health,
            policies: Arc::new(PolicyCache::new(loader)),
            models,
            engine,
            health_enabled: config.health_check.enabled,
            deployments: Mutex::new(HashSet::new()),
        }
    }

    /// Route one request for `(organization_id, model)` with failover.
    pub async fn route(
        &self,
        organization_id: &str,
        model: &str,
        request: &BackendRequest,
    ) -> Result<(BackendResponse, RoutingDecision), RoutingError> {
        let request_id = crate::logging::generate_request_id();
        let span = tracing::info_span!("route", %request_id, organization_id, model);

        let result = self
            .route_inner(organization_id, model, request)
            .instrument(span.clone())
            .await;

        let _entered = span.enter();
        match &result {
            Ok((_, decision)) => tracing::info!(
                backend_id = %decision.backend_id,
                decision_type = %decision.decision_type,
                attempt = decision.attempt_number,
                "Request routed"
            ),
            Err(e) => tracing::warn!(error = %e, "Request routing failed"),
        }
        result
    }

    async fn route_inner(
        &self,
        organization_id: &str,
        model: &str,
        request: &BackendRequest,
    ) -> Result<(BackendResponse, RoutingDecision), RoutingError> {
        let policy = self.policies.get_policy(organization_id, model)?;
        self.engine
            .route_with_failover(&policy, request, self.client.as_ref())
            .await
    }

    /// Pick a backend for `(organization_id, model)` without forwarding.
    pub fn select(
        &self,
        organization_id: &str,
        model: &str,
    ) -> Result<(BackendEndpoint, RoutingDecision), RoutingError> {
        let policy = self.policies.get_policy(organization_id, model)?;
        self.engine.select_backend(&policy)
    }

    /// Register every ready deployment so policies can reference it by model id.
    ///
    /// Deployments registered by an earlier sync or lookup that are no longer
    /// ready are removed from the backend registry and the health monitor.
    /// Returns the number of deployments registered.
    pub async fn sync_deployments(&self) -> Result<usize, ModelRegistryError> {
        let Some(models) = &self.models else {
            return Ok(0);
        };

        let entries = models.list_ready_models().await?;
        for entry in &entries {
            self.register_deployment(entry);
        }

        let ready: HashSet<&str> = entries.iter().map(|e| e.model_id.as_str()).collect();
        let stale: Vec<String> = {
            let mut deployments = self.deployments.lock();
            let stale = deployments
                .iter()
                .filter(|id| !ready.contains(id.as_str()))
                .cloned()
                .collect::<Vec<_>>();
            for id in &stale {
                deployments.remove(id);
            }
            stale
        };
        for id in &stale {
            self.deregister_deployment(id);
        }

        tracing::info!(
            environment = %models.environment(),
            deployments = entries.len(),
            removed = stale.len(),
            "Synchronized model deployments"
        );
        Ok(entries.len())
    }

    /// Look up one model's ready deployment and register it.
    pub async fn resolve_deployment(
        &self,
        model: &str,
    ) -> Result<Option<BackendEndpoint>, ModelRegistryError> {
        let Some(models) = &self.models else {
            return Ok(None);
        };
        Ok(models
            .lookup_model(model)
            .await?
            .map(|entry| self.register_deployment(&entry)))
    }

    fn register_deployment(&self, entry: &ModelRegistryEntry) -> BackendEndpoint {
        let endpoint = entry.to_endpoint(DEFAULT_BACKEND_TIMEOUT);
        self.backends.register_backend(
            BackendDefinition::new(&endpoint.id, &endpoint.uri).with_timeout(endpoint.timeout),
        );
        self.health.register_backend(&endpoint.id, endpoint.clone());
        self.deployments.lock().insert(endpoint.id.clone());
        endpoint
    }

    fn deregister_deployment(&self, backend_id: &str) {
        if let Err(e) = self.backends.remove_backend(backend_id) {
            tracing::debug!(backend_id, error = %e, "Deployment already removed");
        }
        self.health.unregister_backend(backend_id);
        tracing::info!(backend_id, "Removed deployment that is no longer ready");
    }

    /// Start background health monitoring if enabled.
    pub fn start(&self) -> Result<(), HealthError> {
        if !self.health_enabled {
            tracing::info!("Health checking disabled");
            return Ok(());
        }
        self.health.start()
    }

    pub async fn shutdown(&self) {
        self.health.stop().await;
        tracing::info!("Gateway shut down");
    }

    pub fn recent_decisions(&self, limit: usize) -> Vec<RoutingDecision> {
        self.engine.get_recent_decisions(limit)
    }

    pub fn client(&self) -> &Arc<dyn InferenceClient> {
        &self.client
    }

    pub fn backends(&self) -> &Arc<BackendRegistry> {
        &self.backends
    }

    pub fn health(&self) -> &Arc<HealthMonitor> {
        &self.health
    }

    pub fn policies(&self) -> &Arc<PolicyCache> {
        &self.policies
    }

    pub fn models(&self) -> Option<&Arc<ModelRegistry>> {
        self.models.as_ref()
    }

    pub fn engine(&self) -> &RoutingEngine {
        &self.engine
    }
}
