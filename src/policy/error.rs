//! Error types for policy lookups.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// Neither an organization policy nor a global one exists for the model
    #[error("no routing policy for organization '{organization_id}' and model '{model}'")]
    NotFound {
        organization_id: String,
        model: String,
    },

    /// The policy source failed
    #[error("policy loader error: {0}")]
    Loader(String),
}
