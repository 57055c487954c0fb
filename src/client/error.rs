//! Error types for backend client operations.

use thiserror::Error;

/// Errors returned when talking to a backend.
///
/// Every variant is a transient failure from the router's point of view: the
/// failover path moves on to the next candidate, the health monitor counts it
/// as a failed probe.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Network connectivity error (DNS, connection refused, reset).
    #[error("network error: {0}")]
    Network(String),

    /// Request exceeded its deadline.
    #[error("request timeout after {0}ms")]
    Timeout(u64),

    /// Backend answered with a non-success status code.
    #[error("backend returned status {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Backend body could not be read or decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Request body could not be encoded.
    #[error("failed to encode request: {0}")]
    Encode(String),
}

impl ClientError {
    /// Classify a reqwest error, using the deadline that applied to the call.
    pub(crate) fn from_reqwest(e: reqwest::Error, timeout_ms: u64) -> Self {
        if e.is_timeout() {
            ClientError::Timeout(timeout_ms)
        } else if e.is_decode() {
            ClientError::InvalidResponse(e.to_string())
        } else {
            ClientError::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ClientError::Timeout(5000).to_string(),
            "request timeout after 5000ms"
        );
        assert_eq!(
            ClientError::Upstream {
                status: 503,
                message: "overloaded".to_string()
            }
            .to_string(),
            "backend returned status 503: overloaded"
        );
        assert_eq!(
            ClientError::Network("connection refused".to_string()).to_string(),
            "network error: connection refused"
        );
    }
}
