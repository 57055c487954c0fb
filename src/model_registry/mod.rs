//! Model registry: resolves a model name to a ready deployment.
//!
//! Lookups go to an optional key-value cache first, then to the durable
//! [`ModelStore`]. Cache problems never fail a lookup: a cache that does not
//! answer its ping is switched off at construction, and read or write faults
//! are logged and treated as misses.

mod cache;
mod config;
mod entry;
mod error;
mod store;


pub use cache::{InMemoryCache, KeyValueCache};
pub use config::{ModelRegistryConfig, DEFAULT_ENVIRONMENT};
pub use entry::{DeploymentRow, DeploymentStatus, ModelRegistryEntry};
pub use error::{CacheError, ModelRegistryError, StoreError};
pub use store::{DeploymentQuery, InMemoryModelStore, JsonFileModelStore, ModelStore};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

const STORE_PING_TIMEOUT: Duration = Duration::from_secs(5);
const CACHE_PING_TIMEOUT: Duration = Duration::from_secs(3);

pub struct ModelRegistry {
    store: Arc<dyn ModelStore>,
    cache: Option<Arc<dyn KeyValueCache>>,
    cache_ttl: Duration,
    request_timeout: Duration,
    environment: String,
}

impl ModelRegistry {
    /// Connect to `store` and, when configured, `cache`.
    ///
    /// # Errors
    ///
    /// Fails when the store does not answer its ping. An unreachable cache
    /// only disables caching.
    pub async fn connect(
        config: &ModelRegistryConfig,
        store: Arc<dyn ModelStore>,
        cache: Option<Arc<dyn KeyValueCache>>,
    ) -> Result<Self, ModelRegistryError> {
        match tokio::time::timeout(STORE_PING_TIMEOUT, store.ping()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(StoreError::Connection(format!(
                    "ping timed out after {}s",
                    STORE_PING_TIMEOUT.as_secs()
                ))
                .into())
            }
        }

        let cache = match cache.filter(|_| config.cache_enabled) {
            Some(cache) => match tokio::time::timeout(CACHE_PING_TIMEOUT, cache.ping()).await {
                Ok(Ok(())) => Some(cache),
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "Registry cache unreachable, caching disabled");
                    None
                }
                Err(_) => {
                    tracing::warn!("Registry cache ping timed out, caching disabled");
                    None
                }
            },
            None => None,
        };

        let registry = Self {
            store,
            cache,
            cache_ttl: config.cache_ttl(),
            request_timeout: config.request_timeout(),
            environment: config.environment().to_string(),
        };

        tracing::info!(
            environment = %registry.environment,
            cache_ttl_seconds = registry.cache_ttl.as_secs(),
            cache_enabled = registry.cache.is_some(),
            "Model registry initialized"
        );

        Ok(registry)
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_some()
    }

    fn cache_key(model_name: &str, environment: &str) -> String {
        format!("model_registry:{}:{}", environment, model_name)
    }

    /// Ready deployment of `model_name` in the default environment.
    pub async fn lookup_model(
        &self,
        model_name: &str,
    ) -> Result<Option<ModelRegistryEntry>, ModelRegistryError> {
        self.lookup_model_in_environment(model_name, &self.environment)
            .await
    }

    /// Ready deployment of `model_name` in `environment`, `None` if there is none.
    pub async fn lookup_model_in_environment(
        &self,
        model_name: &str,
        environment: &str,
    ) -> Result<Option<ModelRegistryEntry>, ModelRegistryError> {
        let key = Self::cache_key(model_name, environment);

        if let Some(entry) = self.cache_get(&key).await {
            tracing::debug!(model_name, environment, "Model registry cache hit");
            return Ok(Some(entry));
        }

        let query = DeploymentQuery::ready_in(environment)
            .model(model_name)
            .limit(1);
        let rows = self.bounded(self.store.query_deployments(&query)).await?;

        let Some(entry) = rows.into_iter().find_map(ModelRegistryEntry::from_row) else {
            tracing::debug!(model_name, environment, "Model not found in registry");
            return Ok(None);
        };

        tracing::debug!(
            model_name,
            environment,
            endpoint = %entry.deployment_endpoint,
            status = %entry.deployment_status,
            "Model found in registry"
        );

        self.cache_put(&key, &entry).await;
        Ok(Some(entry))
    }

    /// Every ready deployment in the default environment, ordered by model name.
    pub async fn list_ready_models(&self) -> Result<Vec<ModelRegistryEntry>, ModelRegistryError> {
        self.list_ready_models_in_environment(&self.environment)
            .await
    }

    pub async fn list_ready_models_in_environment(
        &self,
        environment: &str,
    ) -> Result<Vec<ModelRegistryEntry>, ModelRegistryError> {
        let query = DeploymentQuery::ready_in(environment);
        let rows = self.bounded(self.store.query_deployments(&query)).await?;
        Ok(rows
            .into_iter()
            .filter_map(ModelRegistryEntry::from_row)
            .collect())
    }

    /// Evict the cached lookup for `(model_name, environment)`.
    pub async fn invalidate_cache(&self, model_name: &str, environment: &str) {
        let Some(cache) = &self.cache else {
            return;
        };
        let key = Self::cache_key(model_name, environment);
        match cache.delete(&key).await {
            Ok(()) => tracing::debug!(model_name, environment, "Invalidated registry cache entry"),
            Err(e) => tracing::warn!(
                model_name,
                environment,
                error = %e,
                "Failed to invalidate registry cache entry"
            ),
        }
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, ModelRegistryError> {
        match tokio::time::timeout(self.request_timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ModelRegistryError::Timeout(
                self.request_timeout.as_millis() as u64,
            )),
        }
    }

    async fn cache_get(&self, key: &str) -> Option<ModelRegistryEntry> {
        let cache = self.cache.as_ref()?;
        let bytes = match cache.get(key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                tracing::debug!(key, error = %e, "Registry cache read failed");
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(key, error = %e, "Discarding undecodable registry cache entry");
                None
            }
        }
    }

    async fn cache_put(&self, key: &str, entry: &ModelRegistryEntry) {
        let Some(cache) = &self.cache else {
            return;
        };
        let bytes = match serde_json::to_vec(entry) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to encode registry cache entry");
                return;
            }
        };
        if let Err(e) = cache.set(key, bytes, self.cache_ttl).await {
            tracing::warn!(
                key,
                model_name = %entry.model_name,
                error = %e,
                "Failed to cache model registry entry"
            );
        }
    }
}
