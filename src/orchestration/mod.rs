//! # Coordination Logic
//!
//! The lease manager that guards unit assignment, the result counters, and
//! the [`Coordinator`] facade that ties store, classification, and dispatch
//! together.

pub mod coordinator;
pub mod lease_manager;
pub mod stats;
pub mod types;

pub use coordinator::Coordinator;
pub use lease_manager::{LeaseManager, LeaseManagerConfig};
pub use stats::{StatsSnapshot, TierCount, TierCounters};
pub use types::{EnqueueOutcome, ReportAck, ReportSubmission, ResetSummary};
