//! # Result Counters
//!
//! Monotonic per-tier and total result tallies. Counters only reset through
//! the explicit administrative reset; restarts restore them from the
//! snapshot.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// One tier's running count, in ascending severity order within a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCount {
    pub label: String,
    pub count: u64,
}

/// Ordered set of named value bands with monotonically increasing counts.
#[derive(Debug)]
pub struct TierCounters {
    total: AtomicU64,
    counters: Vec<(String, AtomicU64)>,
}

impl TierCounters {
    /// `labels` must come in ascending severity order (the classifier's
    /// order); snapshots preserve it.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            total: AtomicU64::new(0),
            counters: labels
                .into_iter()
                .map(|label| (label.into(), AtomicU64::new(0)))
                .collect(),
        }
    }

    /// Count one result event, classified or not.
    pub fn record_total(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one classified result against its tier. Unknown labels are
    /// ignored; the classifier is the only producer.
    pub fn record_tier(&self, label: &str) {
        if let Some((_, counter)) = self.counters.iter().find(|(l, _)| l == label) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn counts(&self) -> Vec<TierCount> {
        self.counters
            .iter()
            .map(|(label, counter)| TierCount {
                label: label.clone(),
                count: counter.load(Ordering::Relaxed),
            })
            .collect()
    }

    /// Administrative reset. The only way counts go down.
    pub fn reset(&self) {
        self.total.store(0, Ordering::Relaxed);
        for (_, counter) in &self.counters {
            counter.store(0, Ordering::Relaxed);
        }
    }

    pub fn export(&self) -> BTreeMap<String, u64> {
        self.counts()
            .into_iter()
            .map(|entry| (entry.label, entry.count))
            .collect()
    }

    /// Restore persisted counts for labels this configuration still knows.
    pub fn restore(&self, total: u64, persisted: &BTreeMap<String, u64>) {
        self.total.store(total, Ordering::Relaxed);
        for (label, counter) in &self.counters {
            if let Some(count) = persisted.get(label) {
                counter.store(*count, Ordering::Relaxed);
            }
        }
    }
}

/// Point-in-time observability surface returned by `GetStats` and rendered
/// by the status reporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Units currently claim-eligible.
    pub queue_size: usize,
    /// Units still inside their invalidation cooldown.
    pub invalid_count: usize,
    pub total_results: u64,
    pub per_tier: Vec<TierCount>,
    pub active_clients: usize,
}

impl StatsSnapshot {
    pub fn tier_count(&self, label: &str) -> Option<u64> {
        self.per_tier
            .iter()
            .find(|entry| entry.label == label)
            .map(|entry| entry.count)
    }
}
