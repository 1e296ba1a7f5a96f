//! # Unit State Machine
//!
//! Lifecycle states for units of work and the legal transitions between
//! them: `Pending -> Assigned -> Scanned`, with `Assigned -> Pending` on
//! explicit release and `Pending <-> Invalid(cooldown) -> Pending` on
//! invalidation.

pub mod states;
pub mod transitions;

pub use states::UnitState;
