#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Scout Core
//!
//! Coordination core for a fleet of independent server scanners: many
//! workers discover server identifiers (units of work), a smaller pool of
//! claim workers must process each discovered unit exactly once, and result
//! events fan out to per-tier notification webhooks.
//!
//! ## Architecture
//!
//! The crate is the job-queue coordinator behind the (external) transport
//! layer: lease-based assignment with a compare-and-swap claim path,
//! invalidation cooldown, tier classification of result values, and
//! best-effort asynchronous dispatch that never blocks or fails the
//! reporting caller.
//!
//! ## Module Organization
//!
//! - [`models`] - Unit records and per-client activity tracking
//! - [`state_machine`] - Unit lifecycle states and legal transitions
//! - [`store`] - Shared in-memory unit table and durable snapshots
//! - [`orchestration`] - Lease manager, counters, and the [`Coordinator`] facade
//! - [`dispatch`] - Tier classification, webhook sinks, fan-out, status reporting
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scout_core::config::ScoutConfig;
//! use scout_core::dispatch::MemorySink;
//! use scout_core::orchestration::{Coordinator, ReportSubmission};
//! use scout_core::store::MemorySnapshotStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let coordinator = Coordinator::new(
//!     ScoutConfig::default(),
//!     Arc::new(MemorySink::new()),
//!     Arc::new(MemorySnapshotStore::new()),
//! )
//! .await?;
//! coordinator.start_status_reporter();
//!
//! coordinator.enqueue_unit("srv-1").await;
//! if let Some(unit) = coordinator.claim_next("worker-1").await {
//!     // scan the server, then:
//!     coordinator.mark_scanned(&unit.id, "worker-1").await?;
//! }
//!
//! coordinator.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//!
//! - At most one live lease per unit: concurrent `claim_next` callers can
//!   never both hold the same unit.
//! - Upserts are monotonic: the interest flag never downgrades and a
//!   non-empty payload is never replaced by an empty one.
//! - Notification delivery is fire-and-forget: sink failures are logged,
//!   never retried, never surfaced to the reporting path.

pub mod config;
pub mod constants;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod state_machine;
pub mod store;

pub use config::{ScoutConfig, TierBand};
pub use error::{Result, ScoutError};
pub use models::Unit;
pub use orchestration::{
    Coordinator, EnqueueOutcome, ReportAck, ReportSubmission, ResetSummary, StatsSnapshot,
};
pub use state_machine::UnitState;
