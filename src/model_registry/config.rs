//! Configuration for the model registry.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment used when neither the registry nor the gateway names one.
pub const DEFAULT_ENVIRONMENT: &str = "development";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelRegistryConfig {
    /// Resolve deployments from the store at all
    pub enabled: bool,
    /// Deployment environment; falls back to the gateway environment
    pub environment: Option<String>,
    /// Cache lookups in the key-value cache
    pub cache_enabled: bool,
    pub cache_ttl_seconds: u64,
    /// Deadline for a single store query
    pub request_timeout_seconds: u64,
    /// JSON file of deployment rows used as the store
    pub store_path: Option<PathBuf>,
}

impl ModelRegistryConfig {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn environment(&self) -> &str {
        self.environment
            .as_deref()
            .filter(|e| !e.is_empty())
            .unwrap_or(DEFAULT_ENVIRONMENT)
    }
}

impl Default for ModelRegistryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            environment: None,
            cache_enabled: true,
            cache_ttl_seconds: 120,
            request_timeout_seconds: 30,
            store_path: None,
        }
    }
}
