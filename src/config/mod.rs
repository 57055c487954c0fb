//! Configuration module for Switchboard
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`SWITCHBOARD_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use switchboard::config::SwitchboardConfig;
//!
//! let toml = r#"
//! environment = "staging"
//!
//! [[backends]]
//! id = "gpu-a"
//! url = "http://10.0.0.1:8000/generate"
//!
//! [[policies]]
//! organization_id = "*"
//! model = "llama-3-8b"
//! backends = [{ backend_id = "gpu-a", weight = 100 }]
//! "#;
//! let config: SwitchboardConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.backends[0].timeout_seconds, 30);
//! assert!(config.validate().is_ok());
//! ```

pub mod backend;
pub mod error;
pub mod logging;

pub use backend::BackendConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};

pub use crate::health::HealthCheckConfig;
pub use crate::model_registry::ModelRegistryConfig;
pub use crate::routing::{FailoverMode, RoutingConfig};

use crate::model_registry::DEFAULT_ENVIRONMENT;
use crate::policy::RoutingPolicy;
use crate::registry::BackendRegistry;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Unified configuration for the routing core and its binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SwitchboardConfig {
    /// Deployment environment this gateway serves
    pub environment: String,
    pub health_check: HealthCheckConfig,
    pub routing: RoutingConfig,
    pub model_registry: ModelRegistryConfig,
    pub logging: LoggingConfig,
    /// Static backend definitions
    pub backends: Vec<BackendConfig>,
    /// Routing policies served by the static loader
    pub policies: Vec<RoutingPolicy>,
}

impl Default for SwitchboardConfig {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_string(),
            health_check: HealthCheckConfig::default(),
            routing: RoutingConfig::default(),
            model_registry: ModelRegistryConfig::default(),
            logging: LoggingConfig::default(),
            backends: Vec::new(),
            policies: Vec::new(),
        }
    }
}

impl SwitchboardConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supports SWITCHBOARD_* environment variables for common settings.
    /// Invalid values are ignored (previous values are kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(environment) = std::env::var("SWITCHBOARD_ENVIRONMENT") {
            if !environment.is_empty() {
                self.environment = environment;
            }
        }

        if let Ok(level) = std::env::var("SWITCHBOARD_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("SWITCHBOARD_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(health) = std::env::var("SWITCHBOARD_HEALTH_CHECK") {
            self.health_check.enabled = health.to_lowercase() == "true";
        }
        if let Ok(interval) = std::env::var("SWITCHBOARD_HEALTH_CHECK_INTERVAL") {
            if let Ok(secs) = interval.parse() {
                self.health_check.interval_seconds = secs;
            }
        }

        if let Ok(list) = std::env::var("SWITCHBOARD_BACKEND_ENDPOINTS") {
            for def in BackendRegistry::parse_endpoint_list(&list) {
                let backend = BackendConfig::new(def.id, def.uri);
                match self.backends.iter_mut().find(|b| b.id == backend.id) {
                    Some(existing) => existing.url = backend.url,
                    None => self.backends.push(backend),
                }
            }
        }

        self
    }

    /// Model registry settings with the environment resolved against the
    /// top-level `environment`.
    pub fn effective_model_registry(&self) -> ModelRegistryConfig {
        let mut config = self.model_registry.clone();
        if config.environment.as_deref().map_or(true, str::is_empty) {
            config.environment = Some(self.environment.clone());
        }
        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.environment.is_empty() {
            return Err(ConfigError::invalid("environment", "cannot be empty"));
        }

        if self.health_check.interval_seconds == 0 {
            return Err(ConfigError::invalid(
                "health_check.interval_seconds",
                "must be non-zero",
            ));
        }
        if self.health_check.timeout_seconds == 0 {
            return Err(ConfigError::invalid(
                "health_check.timeout_seconds",
                "must be non-zero",
            ));
        }

        if self.routing.history_capacity == 0 {
            return Err(ConfigError::invalid(
                "routing.history_capacity",
                "must be non-zero",
            ));
        }

        if self.model_registry.enabled && self.model_registry.store_path.is_none() {
            return Err(ConfigError::invalid(
                "model_registry.store_path",
                "required when the model registry is enabled",
            ));
        }

        let mut seen = HashSet::new();
        for (i, backend) in self.backends.iter().enumerate() {
            if backend.id.is_empty() {
                return Err(ConfigError::invalid(
                    format!("backends[{}].id", i),
                    "id cannot be empty",
                ));
            }
            if !seen.insert(backend.id.as_str()) {
                return Err(ConfigError::invalid(
                    format!("backends[{}].id", i),
                    format!("duplicate backend id '{}'", backend.id),
                ));
            }
            if backend.url.is_empty() {
                return Err(ConfigError::invalid(
                    format!("backends[{}].url", i),
                    "URL cannot be empty",
                ));
            }
            if backend.timeout_seconds == 0 {
                return Err(ConfigError::invalid(
                    format!("backends[{}].timeout_seconds", i),
                    "must be non-zero",
                ));
            }
        }

        for (i, policy) in self.policies.iter().enumerate() {
            if policy.organization_id.is_empty() {
                return Err(ConfigError::invalid(
                    format!("policies[{}].organization_id", i),
                    "organization cannot be empty (use \"*\" for a global policy)",
                ));
            }
            if policy.model.is_empty() {
                return Err(ConfigError::invalid(
                    format!("policies[{}].model", i),
                    "model cannot be empty",
                ));
            }
        }

        Ok(())
    }

    /// Policies with their ids filled in.
    pub fn resolved_policies(&self) -> Vec<RoutingPolicy> {
        self.policies
            .iter()
            .cloned()
            .map(|mut p| {
                if p.policy_id.is_empty() {
                    p.policy_id = format!("{}:{}", p.organization_id, p.model);
                }
                p
            })
            .collect()
    }
}
