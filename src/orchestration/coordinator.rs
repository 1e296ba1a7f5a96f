//! # Coordinator
//!
//! The facade the transport layer talks to. Owns the unit store, lease
//! manager, tier classifier, dispatch router, and result counters; every
//! public operation maps to one coordination primitive. Instances are
//! self-contained: construct one per process (or per test) and `shutdown()`
//! when done.

use crate::config::ScoutConfig;
use crate::constants::events;
use crate::dispatch::render;
use crate::dispatch::sink::NotifySink;
use crate::dispatch::status::StatusReporter;
use crate::dispatch::{DispatchRouter, TierClassifier};
use crate::error::Result;
use crate::models::{ActivityTracker, Unit};
use crate::orchestration::lease_manager::{LeaseManager, LeaseManagerConfig};
use crate::orchestration::stats::{StatsSnapshot, TierCounters};
use crate::orchestration::types::{EnqueueOutcome, ReportAck, ReportSubmission, ResetSummary};
use crate::store::{CoordinatorSnapshot, SnapshotStore, UnitStore};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

/// Single logical coordinator for a scanner fleet.
pub struct Coordinator {
    instance_id: Uuid,
    config: ScoutConfig,
    store: Arc<UnitStore>,
    lease_manager: LeaseManager,
    classifier: TierClassifier,
    counters: Arc<TierCounters>,
    activity: Arc<ActivityTracker>,
    router: DispatchRouter,
    sink: Arc<dyn NotifySink>,
    snapshot_store: Arc<dyn SnapshotStore>,
    status_ref: Arc<Mutex<Option<String>>>,
    status_reporter: Mutex<Option<StatusReporter>>,
}

impl Coordinator {
    /// Build a coordinator, restoring any persisted snapshot.
    pub async fn new(
        config: ScoutConfig,
        sink: Arc<dyn NotifySink>,
        snapshot_store: Arc<dyn SnapshotStore>,
    ) -> Result<Self> {
        let classifier = TierClassifier::new(config.tier_bands.clone())?;
        let counters = Arc::new(TierCounters::new(classifier.labels()));
        let store = Arc::new(UnitStore::new());
        let status_ref = Arc::new(Mutex::new(None));

        if let Some(snapshot) = snapshot_store.load().await? {
            counters.restore(snapshot.total_results, &snapshot.tier_counts);
            store.restore(snapshot.units, snapshot.next_sequence);
            *status_ref.lock() = snapshot.status_message_ref;
            info!(
                units = store.len(),
                total_results = counters.total(),
                "Restored coordinator state from snapshot"
            );
        }

        let lease_manager = LeaseManager::new(
            store.clone(),
            LeaseManagerConfig {
                invalid_cooldown: config.invalid_cooldown,
                lease_ttl: config.lease_ttl,
            },
        );
        let router = DispatchRouter::new(sink.clone(), config.dispatch_queue_depth);

        let coordinator = Self {
            instance_id: Uuid::new_v4(),
            config,
            store,
            lease_manager,
            classifier,
            counters,
            activity: Arc::new(ActivityTracker::new()),
            router,
            sink,
            snapshot_store,
            status_ref,
            status_reporter: Mutex::new(None),
        };
        info!(instance_id = %coordinator.instance_id, "Coordinator initialized");
        Ok(coordinator)
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    /// Start the periodic status dispatch. Idempotent: a second call while
    /// one reporter runs is a no-op.
    pub fn start_status_reporter(&self) {
        let mut slot = self.status_reporter.lock();
        if slot.is_some() {
            return;
        }

        let store = self.store.clone();
        let counters = self.counters.clone();
        let activity = self.activity.clone();
        let cooldown = self.config.invalid_cooldown;
        let lease_ttl = self.config.lease_ttl;
        let window = self.config.activity_window;

        *slot = Some(StatusReporter::start(
            self.sink.clone(),
            self.config.status_interval,
            self.status_ref.clone(),
            move || collect_stats(&store, &counters, &activity, cooldown, lease_ttl, window),
        ));
    }

    /// Stop background tasks, drain in-flight dispatches, and persist a
    /// final snapshot.
    pub async fn shutdown(&self) {
        let reporter = self.status_reporter.lock().take();
        if let Some(reporter) = reporter {
            reporter.stop().await;
        }
        self.router.shutdown().await;
        self.persist_best_effort().await;
        info!(instance_id = %self.instance_id, "Coordinator shut down");
    }

    /// Upsert + classify + dispatch + stats update for one scan result.
    /// Dispatch failures never reach the reporting caller.
    #[instrument(skip(self, submission), fields(instance_id = %self.instance_id, unit_id = %submission.unit_id))]
    pub async fn report_result(&self, submission: ReportSubmission) -> Result<ReportAck> {
        if let Some(client_id) = submission.client_id.as_deref() {
            self.activity.mark_active(client_id);
        }

        let value = submission
            .value
            .or_else(|| render::peak_value(&submission.payload));
        let tier = value
            .and_then(|v| self.classifier.classify(v))
            .map(str::to_string);

        let unit = self.store.upsert(
            &submission.unit_id,
            submission.tier_flag,
            submission.payload.clone(),
        );

        self.counters.record_total();
        if let Some(tier) = tier.as_deref() {
            self.counters.record_tier(tier);
        }

        // Dispatch only what this report found, and only above the floor.
        let dispatched = match tier.as_deref() {
            Some(tier) if render::has_finds(&submission.payload) => {
                let message = render::render_report(&unit.id, &submission.payload);
                self.router.dispatch(tier, message);
                true
            }
            _ => false,
        };

        debug!(
            event = events::UNIT_REPORTED,
            tier = tier.as_deref(),
            dispatched = dispatched,
            "Report absorbed"
        );
        self.persist_best_effort().await;
        Ok(ReportAck {
            unit_id: unit.id,
            tier,
            dispatched,
        })
    }

    /// Add a discovered unit to the queue. Idempotent.
    #[instrument(skip(self), fields(instance_id = %self.instance_id))]
    pub async fn enqueue_unit(&self, id: &str) -> EnqueueOutcome {
        let outcome = if self.store.insert_if_absent(id) {
            info!(event = events::UNIT_ENQUEUED, unit_id = %id, "Unit enqueued");
            EnqueueOutcome::Created
        } else {
            EnqueueOutcome::AlreadyExists
        };
        if outcome == EnqueueOutcome::Created {
            self.persist_best_effort().await;
        }
        outcome
    }

    /// Hand the oldest eligible unit to `client_id`, or `None` when the
    /// queue is empty. Also refreshes the client's liveness.
    #[instrument(skip(self), fields(instance_id = %self.instance_id))]
    pub async fn claim_next(&self, client_id: &str) -> Option<Unit> {
        self.activity.mark_active(client_id);
        let claimed = self.lease_manager.claim_next(client_id);
        if claimed.is_some() {
            self.persist_best_effort().await;
        }
        claimed
    }

    /// Place a unit under invalidation cooldown.
    #[instrument(skip(self), fields(instance_id = %self.instance_id))]
    pub async fn mark_invalid(&self, id: &str) -> Result<Unit> {
        let unit = self.lease_manager.mark_invalid(id)?;
        self.persist_best_effort().await;
        Ok(unit)
    }

    /// Terminal completion of a unit. `NotFound` for unknown ids.
    #[instrument(skip(self), fields(instance_id = %self.instance_id))]
    pub async fn mark_scanned(&self, id: &str, client_id: &str) -> Result<Unit> {
        let unit = self.lease_manager.mark_scanned(id, client_id)?;
        self.persist_best_effort().await;
        Ok(unit)
    }

    /// Return an Assigned unit to the queue without invalidating it.
    #[instrument(skip(self), fields(instance_id = %self.instance_id))]
    pub async fn release(&self, id: &str, client_id: &str) -> Result<bool> {
        let released = self.lease_manager.release(id, client_id)?;
        if released {
            self.persist_best_effort().await;
        }
        Ok(released)
    }

    pub fn list_units(&self, limit: Option<usize>) -> Vec<Unit> {
        self.store
            .list_all(limit.unwrap_or(crate::constants::DEFAULT_LIST_LIMIT))
    }

    pub fn get_unit(&self, id: &str) -> Option<Unit> {
        self.store.get(id)
    }

    /// Administrative reset: clears units, counters, and activity.
    #[instrument(skip(self), fields(instance_id = %self.instance_id))]
    pub async fn reset(&self) -> ResetSummary {
        let results_cleared = self.counters.total();
        let units_cleared = self.store.clear();
        self.counters.reset();
        self.activity.clear();
        info!(
            event = events::STORE_RESET,
            units_cleared = units_cleared,
            results_cleared = results_cleared,
            "Coordinator state reset"
        );
        self.persist_best_effort().await;
        ResetSummary {
            units_cleared,
            results_cleared,
        }
    }

    /// Point-in-time stats; counting active clients prunes stale entries.
    pub fn stats(&self) -> StatsSnapshot {
        collect_stats(
            &self.store,
            &self.counters,
            &self.activity,
            self.config.invalid_cooldown,
            self.config.lease_ttl,
            self.config.activity_window,
        )
    }

    async fn persist_best_effort(&self) {
        let (units, next_sequence) = self.store.export();
        let snapshot = CoordinatorSnapshot {
            units,
            next_sequence,
            total_results: self.counters.total(),
            tier_counts: self.counters.export(),
            status_message_ref: self.status_ref.lock().clone(),
        };
        if let Err(e) = self.snapshot_store.persist(&snapshot).await {
            // In-memory state stays authoritative; a restart loses this update.
            error!(event = events::SNAPSHOT_FAILED, error = %e, "Snapshot persist failed");
        }
    }
}

fn collect_stats(
    store: &UnitStore,
    counters: &TierCounters,
    activity: &ActivityTracker,
    cooldown: Duration,
    lease_ttl: Option<Duration>,
    window: Duration,
) -> StatsSnapshot {
    let (queue_size, invalid_count) = store.queue_counts(cooldown, lease_ttl);
    StatsSnapshot {
        queue_size,
        invalid_count,
        total_results: counters.total(),
        per_tier: counters.counts(),
        active_clients: activity.count_active(window),
    }
}
