//! # System Constants
//!
//! Default tuning values and lifecycle event names that define the
//! operational boundaries of the scout coordination core.

use std::time::Duration;

/// Cooldown applied to a unit after it is marked invalid. The unit is
/// excluded from claim selection until the cooldown has elapsed.
pub const DEFAULT_INVALID_COOLDOWN: Duration = Duration::from_secs(300);

/// Window used when counting recently-active reporting clients.
pub const DEFAULT_ACTIVITY_WINDOW: Duration = Duration::from_secs(600);

/// Interval between periodic status dispatches.
pub const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(300);

/// Upper bound on outbound calls to a notification sink.
pub const DEFAULT_SINK_TIMEOUT: Duration = Duration::from_secs(10);

/// Bounded depth of the dispatch queue feeding the sink worker.
pub const DEFAULT_DISPATCH_QUEUE_DEPTH: usize = 256;

/// Default cap on units returned by a list query.
pub const DEFAULT_LIST_LIMIT: usize = 100;

/// Lifecycle events emitted as structured log fields.
pub mod events {
    pub const UNIT_REPORTED: &str = "unit.reported";
    pub const UNIT_ENQUEUED: &str = "unit.enqueued";
    pub const UNIT_CLAIMED: &str = "unit.claimed";
    pub const UNIT_RELEASED: &str = "unit.released";
    pub const UNIT_INVALIDATED: &str = "unit.invalidated";
    pub const UNIT_SCANNED: &str = "unit.scanned";
    pub const UNIT_COOLDOWN_ELAPSED: &str = "unit.cooldown_elapsed";
    pub const UNIT_LEASE_RECLAIMED: &str = "unit.lease_reclaimed";

    pub const DISPATCH_SENT: &str = "dispatch.sent";
    pub const DISPATCH_FAILED: &str = "dispatch.failed";
    pub const DISPATCH_DROPPED: &str = "dispatch.dropped";

    pub const STATUS_CYCLE_COMPLETED: &str = "status.cycle_completed";
    pub const STATUS_CYCLE_FAILED: &str = "status.cycle_failed";

    pub const STORE_RESET: &str = "store.reset";
    pub const SNAPSHOT_PERSISTED: &str = "snapshot.persisted";
    pub const SNAPSHOT_FAILED: &str = "snapshot.failed";
}
