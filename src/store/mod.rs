//! # Storage Layer
//!
//! The in-process [`UnitStore`] that serializes conflicting writes, and the
//! [`SnapshotStore`] abstraction that makes state survive restarts.

pub mod snapshot;
pub mod unit_store;

pub use snapshot::{CoordinatorSnapshot, FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use unit_store::UnitStore;
