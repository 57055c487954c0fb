//! Static backend configuration

use serde::{Deserialize, Serialize};

/// A `[[backends]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Identifier referenced by routing policies
    pub id: String,
    /// Inference URI requests are POSTed to
    pub url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    30
}

impl BackendConfig {
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: url.into(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}
