//! Wire and endpoint types shared by the client, the monitor and the engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// A routable backend target.
///
/// Built per routing decision, either from the static backend registry or from
/// a model registry deployment. Never stored as the source of truth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEndpoint {
    /// Backend identifier (matches `BackendWeight::backend_id`)
    pub id: String,
    /// Inference URI the request is POSTed to
    pub uri: String,
    /// Model name the backend should serve for this request
    pub model_variant: String,
    /// Per-request deadline
    pub timeout: Duration,
}

impl BackendEndpoint {
    pub fn new(
        id: impl Into<String>,
        uri: impl Into<String>,
        model_variant: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            model_variant: model_variant.into(),
            timeout,
        }
    }

    /// Liveness probe URL derived from the endpoint URI.
    ///
    /// ```
    /// use switchboard::client::BackendEndpoint;
    /// use std::time::Duration;
    ///
    /// let ep = BackendEndpoint::new("a", "http://10.0.0.1:8000", "", Duration::from_secs(1));
    /// assert_eq!(ep.health_url(), "http://10.0.0.1:8000/health");
    ///
    /// let ep = BackendEndpoint::new("a", "http://10.0.0.1:8000/", "", Duration::from_secs(1));
    /// assert_eq!(ep.health_url(), "http://10.0.0.1:8000/health");
    /// ```
    pub fn health_url(&self) -> String {
        if self.uri.ends_with('/') {
            format!("{}health", self.uri)
        } else {
            format!("{}/health", self.uri)
        }
    }
}

/// Generic inference request forwarded to a backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendRequest {
    /// Target model; filled from the endpoint's model variant when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,
}

impl BackendRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }
}

/// Generic inference response returned by a backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BackendResponse {
    pub text: String,
    #[serde(default)]
    pub tokens_used: u32,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}
