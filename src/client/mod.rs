//! Backend client: forwards inference requests and probes backend liveness.
//!
//! The client is stateless. The health monitor and the routing engine accept
//! any [`InferenceClient`] so tests can swap in scripted fakes.

mod error;
mod types;

pub use error::ClientError;
pub use types::{BackendEndpoint, BackendRequest, BackendResponse};

use async_trait::async_trait;
use std::time::Duration;

/// Transport contract between the router and a model backend.
///
/// # Object Safety
///
/// Designed to be used as `Arc<dyn InferenceClient>`.
///
/// # Cancellation Safety
///
/// Dropping a returned future aborts the in-flight HTTP request.
#[async_trait]
pub trait InferenceClient: Send + Sync + 'static {
    /// Forward one inference request to `endpoint`, bounded by `endpoint.timeout`.
    async fn forward_request(
        &self,
        endpoint: &BackendEndpoint,
        request: &BackendRequest,
    ) -> Result<BackendResponse, ClientError>;

    /// Probe the endpoint's health path. Any non-2xx answer is an error.
    async fn health_check(
        &self,
        endpoint: &BackendEndpoint,
        timeout: Duration,
    ) -> Result<(), ClientError>;
}

/// HTTP implementation of [`InferenceClient`] backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone, Default)]
pub struct BackendClient {
    client: reqwest::Client,
}

impl BackendClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reuse an existing connection pool.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InferenceClient for BackendClient {
    async fn forward_request(
        &self,
        endpoint: &BackendEndpoint,
        request: &BackendRequest,
    ) -> Result<BackendResponse, ClientError> {
        let timeout_ms = endpoint.timeout.as_millis() as u64;

        let mut body = request.clone();
        if body.model.is_none() && !endpoint.model_variant.is_empty() {
            body.model = Some(endpoint.model_variant.clone());
        }

        let response = self
            .client
            .post(&endpoint.uri)
            .json(&body)
            .timeout(endpoint.timeout)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, timeout_ms))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::from_reqwest(e, timeout_ms))?;

        serde_json::from_slice(&bytes).map_err(|e| {
            ClientError::InvalidResponse(format!("failed to parse backend response: {}", e))
        })
    }

    async fn health_check(
        &self,
        endpoint: &BackendEndpoint,
        timeout: Duration,
    ) -> Result<(), ClientError> {
        let response = self
            .client
            .get(endpoint.health_url())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(e, timeout.as_millis() as u64))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Upstream {
                status: status.as_u16(),
                message: format!("health check failed: {}", status),
            });
        }

        Ok(())
    }
}
