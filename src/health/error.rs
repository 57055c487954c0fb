//! Error types for health monitoring.

use thiserror::Error;

/// Errors returned by the health monitor lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HealthError {
    /// `start()` was called on a monitor whose probe loop already ran
    #[error("health monitor already started")]
    AlreadyStarted,
}
