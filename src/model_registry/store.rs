//! Durable deployment stores.

use super::entry::{DeploymentRow, DeploymentStatus};
use super::error::StoreError;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Filter over deployment rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentQuery {
    /// Exact model name; `None` matches every model
    pub model_name: Option<String>,
    pub environment: String,
    pub status: DeploymentStatus,
    /// Skip rows without a deployment endpoint
    pub require_endpoint: bool,
    pub limit: Option<usize>,
}

impl DeploymentQuery {
    /// Ready, routable deployments of every model in `environment`.
    pub fn ready_in(environment: impl Into<String>) -> Self {
        Self {
            model_name: None,
            environment: environment.into(),
            status: DeploymentStatus::Ready,
            require_endpoint: true,
            limit: None,
        }
    }

    pub fn model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, row: &DeploymentRow) -> bool {
        self.model_name
            .as_deref()
            .map_or(true, |name| row.model_name == name)
            && row.deployment_environment == self.environment
            && row.deployment_status == self.status
            && (!self.require_endpoint
                || row
                    .deployment_endpoint
                    .as_deref()
                    .is_some_and(|e| !e.is_empty()))
    }

    /// Filter `rows`, order them by model name, and apply the limit.
    pub fn apply<'a>(&self, rows: impl IntoIterator<Item = &'a DeploymentRow>) -> Vec<DeploymentRow> {
        let mut matched: Vec<DeploymentRow> =
            rows.into_iter().filter(|r| self.matches(r)).cloned().collect();
        matched.sort_by(|a, b| a.model_name.cmp(&b.model_name));
        if let Some(limit) = self.limit {
            matched.truncate(limit);
        }
        matched
    }
}

/// Source of record for model deployments.
#[async_trait]
pub trait ModelStore: Send + Sync {
    /// Verify the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn query_deployments(
        &self,
        query: &DeploymentQuery,
    ) -> Result<Vec<DeploymentRow>, StoreError>;
}

/// In-memory store keyed by `(model_id, environment)`.
#[derive(Debug, Default)]
pub struct InMemoryModelStore {
    rows: RwLock<HashMap<(String, String), DeploymentRow>>,
}

impl InMemoryModelStore {
    pub fn new(rows: impl IntoIterator<Item = DeploymentRow>) -> Self {
        let store = Self::default();
        for row in rows {
            store.upsert(row);
        }
        store
    }

    pub fn upsert(&self, row: DeploymentRow) {
        self.rows.write().insert(
            (row.model_id.clone(), row.deployment_environment.clone()),
            row,
        );
    }

    pub fn remove(&self, model_id: &str, environment: &str) -> Option<DeploymentRow> {
        self.rows
            .write()
            .remove(&(model_id.to_string(), environment.to_string()))
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ModelStore for InMemoryModelStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn query_deployments(
        &self,
        query: &DeploymentQuery,
    ) -> Result<Vec<DeploymentRow>, StoreError> {
        let rows = self.rows.read();
        Ok(query.apply(rows.values()))
    }
}

/// Store backed by a JSON array of deployment rows on disk.
///
/// The file is re-read on every query, so edits by deployment tooling are
/// picked up without a restart.
#[derive(Debug, Clone)]
pub struct JsonFileModelStore {
    path: PathBuf,
}

impl JsonFileModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_rows(&self) -> Result<Vec<DeploymentRow>, StoreError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            StoreError::Connection(format!("{}: {}", self.path.display(), e))
        })?;
        serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Query(format!("{}: {}", self.path.display(), e)))
    }
}

#[async_trait]
impl ModelStore for JsonFileModelStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.read_rows().await.map(|_| ())
    }

    async fn query_deployments(
        &self,
        query: &DeploymentQuery,
    ) -> Result<Vec<DeploymentRow>, StoreError> {
        let rows = self.read_rows().await?;
        Ok(query.apply(rows.iter()))
    }
}
