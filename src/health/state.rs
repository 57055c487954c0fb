//! Per-backend health state tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Health classification of a backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Registered but never probed
    #[default]
    Unknown,
    Healthy,
    /// Failing, but below the unhealthy threshold
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Status implied by a consecutive error count.
    ///
    /// ```
    /// use switchboard::health::HealthStatus;
    ///
    /// assert_eq!(HealthStatus::from_consecutive_errors(0, 3), HealthStatus::Healthy);
    /// assert_eq!(HealthStatus::from_consecutive_errors(2, 3), HealthStatus::Degraded);
    /// assert_eq!(HealthStatus::from_consecutive_errors(3, 3), HealthStatus::Unhealthy);
    /// ```
    pub fn from_consecutive_errors(consecutive_errors: u32, unhealthy_threshold: u32) -> Self {
        if consecutive_errors == 0 {
            HealthStatus::Healthy
        } else if consecutive_errors >= unhealthy_threshold.max(1) {
            HealthStatus::Unhealthy
        } else {
            HealthStatus::Degraded
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Unknown => "unknown",
            HealthStatus::Healthy => "healthy",
            HealthStatus::Degraded => "degraded",
            HealthStatus::Unhealthy => "unhealthy",
        }
    }

    /// Gauge encoding used by the metrics observer.
    pub fn gauge_value(&self) -> f64 {
        match self {
            HealthStatus::Healthy => 1.0,
            HealthStatus::Degraded | HealthStatus::Unknown => 0.0,
            HealthStatus::Unhealthy => -1.0,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health snapshot for a single backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendHealth {
    pub backend_id: String,
    pub status: HealthStatus,
    /// When the last probe completed
    pub last_check: Option<DateTime<Utc>>,
    pub consecutive_errors: u32,
    pub last_error: Option<String>,
    /// Duration of the last probe
    #[serde(with = "latency_ms")]
    pub latency: Duration,
}

/// A status change observed while applying a probe outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthTransition {
    pub backend_id: String,
    pub from: HealthStatus,
    pub to: HealthStatus,
    pub consecutive_errors: u32,
    pub error: Option<String>,
    pub at: DateTime<Utc>,
}

impl BackendHealth {
    pub fn new(backend_id: impl Into<String>) -> Self {
        Self {
            backend_id: backend_id.into(),
            status: HealthStatus::Unknown,
            last_check: None,
            consecutive_errors: 0,
            last_error: None,
            latency: Duration::ZERO,
        }
    }

    /// Apply a probe outcome and recompute the status.
    /// Returns a transition when the status changed.
    pub fn record(
        &mut self,
        outcome: Result<(), String>,
        latency: Duration,
        unhealthy_threshold: u32,
    ) -> Option<HealthTransition> {
        let previous = self.status;
        let now = Utc::now();

        self.last_check = Some(now);
        self.latency = latency;

        match outcome {
            Ok(()) => {
                self.consecutive_errors = 0;
                self.last_error = None;
            }
            Err(error) => {
                self.consecutive_errors = self.consecutive_errors.saturating_add(1);
                self.last_error = Some(error);
            }
        }

        self.status =
            HealthStatus::from_consecutive_errors(self.consecutive_errors, unhealthy_threshold);

        (self.status != previous).then(|| HealthTransition {
            backend_id: self.backend_id.clone(),
            from: previous,
            to: self.status,
            consecutive_errors: self.consecutive_errors,
            error: self.last_error.clone(),
            at: now,
        })
    }
}

mod latency_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(latency: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(latency.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
