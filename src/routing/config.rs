//! Routing engine configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What a policy's `failover_threshold` does once it is reached.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailoverMode {
    /// Keep trying every candidate; raise a warning and notify the observer.
    #[default]
    AlertOnly,
    /// Stop after `failover_threshold` attempts.
    HardStop,
}

impl fmt::Display for FailoverMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailoverMode::AlertOnly => f.write_str("alert_only"),
            FailoverMode::HardStop => f.write_str("hard_stop"),
        }
    }
}

impl FromStr for FailoverMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "alert_only" | "alert-only" => Ok(FailoverMode::AlertOnly),
            "hard_stop" | "hard-stop" => Ok(FailoverMode::HardStop),
            _ => Err(format!("Unknown failover mode: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Route to every configured backend when all of them are degraded
    pub degraded_fallback: bool,
    pub failover_mode: FailoverMode,
    /// Routing decisions kept for diagnostics
    pub history_capacity: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            degraded_fallback: true,
            failover_mode: FailoverMode::AlertOnly,
            history_capacity: 100,
        }
    }
}
