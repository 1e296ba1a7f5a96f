//! # Data Layer
//!
//! Core records: the [`Unit`] of work with its lease and cooldown fields,
//! and per-client [`ActivityTracker`] liveness.

pub mod activity;
pub mod unit;

pub use activity::ActivityTracker;
pub use unit::{payload_is_empty, Unit};
