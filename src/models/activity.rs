//! # Client Activity Tracking
//!
//! Per reporting-client liveness. Entries older than the window are pruned
//! lazily while counting, so the map never needs a sweeper task.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;

/// Tracks when each reporting client was last heard from.
#[derive(Debug, Default)]
pub struct ActivityTracker {
    last_seen: DashMap<String, DateTime<Utc>>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record or refresh a client's liveness timestamp.
    pub fn mark_active(&self, client_id: &str) {
        self.last_seen.insert(client_id.to_string(), Utc::now());
    }

    /// Prune entries older than `window` and return the remaining count.
    /// This is a side-effecting read: observing liveness ages the map.
    pub fn count_active(&self, window: Duration) -> usize {
        let cutoff = match chrono::Duration::from_std(window) {
            Ok(d) => Utc::now() - d,
            Err(_) => return self.last_seen.len(),
        };
        self.last_seen.retain(|_, seen| *seen >= cutoff);
        self.last_seen.len()
    }

    pub fn clear(&self) {
        self.last_seen.clear();
    }
}
