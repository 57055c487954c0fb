//! Error types for routing failures

use crate::client::ClientError;
use crate::policy::PolicyError;
use crate::registry::RegistryError;
use crate::routing::RoutingDecision;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoutingError {
    /// The policy lists no backends at all
    #[error("no backends configured for organization '{organization_id}' and model '{model}'")]
    NoBackendsConfigured {
        organization_id: String,
        model: String,
    },

    /// Every configured backend is excluded and fallback is disabled
    #[error("no available backends for organization '{organization_id}' and model '{model}' (excluded: {excluded:?})")]
    NoAvailableBackends {
        organization_id: String,
        model: String,
        excluded: Vec<String>,
    },

    /// A policy references a backend the registry does not know
    #[error("cannot resolve backend '{backend_id}'")]
    UnresolvedBackend {
        backend_id: String,
        #[source]
        source: RegistryError,
    },

    /// Every attempted backend failed
    #[error("all backends failed for organization '{organization_id}' and model '{model}' (attempted: {attempted:?}), last error: {last_error}")]
    AllBackendsFailed {
        organization_id: String,
        model: String,
        attempted: Vec<String>,
        last_error: ClientError,
        last_decision: Box<RoutingDecision>,
    },

    #[error(transparent)]
    Policy(#[from] PolicyError),
}
