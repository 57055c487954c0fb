//! Weighted selection primitives.

use crate::policy::BackendWeight;
use rand::rngs::OsRng;
use rand::RngCore;
use std::time::{SystemTime, UNIX_EPOCH};

/// Sum of the positive weights.
pub fn total_weight(backends: &[BackendWeight]) -> u64 {
    backends.iter().map(|b| u64::from(b.weight)).sum()
}

/// Backend owning `draw` on the cumulative weight line.
///
/// `draw` must lie in `[0, total_weight)`. Zero-weight backends own no part of
/// the line. Without any positive weight the first backend is returned.
///
/// ```
/// use switchboard::policy::BackendWeight;
/// use switchboard::routing::select_weighted;
///
/// let backends = vec![BackendWeight::new("a", 1), BackendWeight::new("b", 3)];
/// assert_eq!(select_weighted(&backends, 0).unwrap().backend_id, "a");
/// assert_eq!(select_weighted(&backends, 1).unwrap().backend_id, "b");
/// assert_eq!(select_weighted(&backends, 3).unwrap().backend_id, "b");
/// ```
pub fn select_weighted(backends: &[BackendWeight], draw: u64) -> Option<&BackendWeight> {
    let mut cumulative = 0u64;
    for backend in backends.iter().filter(|b| b.weight > 0) {
        cumulative += u64::from(backend.weight);
        if cumulative > draw {
            return Some(backend);
        }
    }
    backends.first()
}

/// Weighted random pick over `backends`.
pub fn pick_weighted(backends: &[BackendWeight]) -> Option<&BackendWeight> {
    match total_weight(backends) {
        0 => backends.first(),
        total => select_weighted(backends, random_below(total)),
    }
}

/// Uniform integer in `[0, max)` from the OS RNG.
///
/// Falls back to the clock only if the OS RNG fails.
pub fn random_below(max: u64) -> u64 {
    if max == 0 {
        return 0;
    }
    let mut buf = [0u8; 8];
    match OsRng.try_fill_bytes(&mut buf) {
        Ok(()) => u64::from_be_bytes(buf) % max,
        Err(e) => {
            tracing::warn!(error = %e, "OS RNG unavailable, using clock for weighted selection");
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0);
            nanos % max
        }
    }
}

/// Candidates ordered by weight, highest first. Ties keep their input order.
pub fn failover_order(backends: &[BackendWeight]) -> Vec<BackendWeight> {
    let mut ordered = backends.to_vec();
    ordered.sort_by(|a, b| b.weight.cmp(&a.weight));
    ordered
}
