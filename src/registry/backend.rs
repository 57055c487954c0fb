//! Backend definition types.

use crate::client::BackendEndpoint;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-request timeout for statically configured backends.
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(30);

/// A statically known backend: where it lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendDefinition {
    pub id: String,
    pub uri: String,
    #[serde(with = "timeout_secs")]
    pub timeout: Duration,
}

impl BackendDefinition {
    pub fn new(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            timeout: DEFAULT_BACKEND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Materialize a routable endpoint serving `model`.
    pub fn endpoint(&self, model: &str) -> BackendEndpoint {
        BackendEndpoint::new(&self.id, &self.uri, model, self.timeout)
    }
}

mod timeout_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(timeout: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(timeout.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}
