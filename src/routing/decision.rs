//! Routing decisions and their bounded history.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DecisionType {
    /// First attempt of a failover sequence
    Primary,
    /// Any later attempt of a failover sequence
    Failover,
    /// Single weighted pick without forwarding
    Weighted,
}

impl DecisionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionType::Primary => "PRIMARY",
            DecisionType::Failover => "FAILOVER",
            DecisionType::Weighted => "WEIGHTED",
        }
    }
}

impl fmt::Display for DecisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of one routing choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub backend_id: String,
    pub decision_type: DecisionType,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
    /// 1-based
    pub attempt_number: u32,
    pub organization_id: String,
    pub model: String,
}

impl RoutingDecision {
    pub fn new(
        backend_id: impl Into<String>,
        decision_type: DecisionType,
        reason: impl Into<String>,
        attempt_number: u32,
        organization_id: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            backend_id: backend_id.into(),
            decision_type,
            reason: reason.into(),
            timestamp: Utc::now(),
            attempt_number,
            organization_id: organization_id.into(),
            model: model.into(),
        }
    }
}

/// Ring buffer of the most recent decisions.
pub struct DecisionHistory {
    entries: Mutex<VecDeque<RoutingDecision>>,
    capacity: usize,
}

impl DecisionHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append a decision, evicting the oldest at capacity.
    pub fn push(&self, decision: RoutingDecision) {
        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity {
            entries.pop_front();
        }
        entries.push_back(decision);
    }

    /// Up to `limit` most recent decisions, oldest first.
    /// A `limit` of 0 returns everything.
    pub fn recent(&self, limit: usize) -> Vec<RoutingDecision> {
        let entries = self.entries.lock();
        let take = if limit == 0 {
            entries.len()
        } else {
            limit.min(entries.len())
        };
        entries.iter().skip(entries.len() - take).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for DecisionHistory {
    fn default() -> Self {
        Self::new(100)
    }
}
