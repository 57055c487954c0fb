//! Deployment rows and resolved registry entries.

use crate::client::BackendEndpoint;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Lifecycle state of a model deployment. Only `Ready` is routable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Pending,
    Deploying,
    Ready,
    Degraded,
    Failed,
    Retired,
    /// Any status this build does not know about
    #[serde(other)]
    Unknown,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeploymentStatus::Pending => "pending",
            DeploymentStatus::Deploying => "deploying",
            DeploymentStatus::Ready => "ready",
            DeploymentStatus::Degraded => "degraded",
            DeploymentStatus::Failed => "failed",
            DeploymentStatus::Retired => "retired",
            DeploymentStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for DeploymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A row of the deployment store, as written by the deployment tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRow {
    pub model_id: String,
    pub model_name: String,
    #[serde(default)]
    pub deployment_endpoint: Option<String>,
    pub deployment_status: DeploymentStatus,
    pub deployment_environment: String,
    #[serde(default)]
    pub deployment_namespace: String,
    #[serde(default)]
    pub last_health_check_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// A resolved, routable deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRegistryEntry {
    pub model_id: String,
    pub model_name: String,
    pub deployment_endpoint: String,
    pub deployment_status: DeploymentStatus,
    pub deployment_environment: String,
    pub deployment_namespace: String,
    pub last_health_check_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl ModelRegistryEntry {
    /// Build an entry from a store row. Rows without an endpoint are not routable.
    pub fn from_row(row: DeploymentRow) -> Option<Self> {
        let endpoint = row.deployment_endpoint.filter(|e| !e.is_empty())?;
        Some(Self {
            model_id: row.model_id,
            model_name: row.model_name,
            deployment_endpoint: endpoint,
            deployment_status: row.deployment_status,
            deployment_environment: row.deployment_environment,
            deployment_namespace: row.deployment_namespace,
            last_health_check_at: row.last_health_check_at,
            updated_at: row.updated_at,
        })
    }

    /// Routable endpoint for this deployment, identified by its model id.
    pub fn to_endpoint(&self, timeout: Duration) -> BackendEndpoint {
        BackendEndpoint::new(
            &self.model_id,
            &self.deployment_endpoint,
            &self.model_name,
            timeout,
        )
    }
}
