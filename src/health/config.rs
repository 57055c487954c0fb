//! Configuration for health monitoring.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the backend health monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Whether the background probe loop runs
    pub enabled: bool,
    /// Seconds between probe sweeps
    pub interval_seconds: u64,
    /// Timeout for each probe request
    pub timeout_seconds: u64,
    /// Consecutive failures before a backend is marked unhealthy
    pub unhealthy_threshold: u32,
}

impl HealthCheckConfig {
    /// Sweep period, never shorter than one second.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 10,
            timeout_seconds: 5,
            unhealthy_threshold: 3,
        }
    }
}
