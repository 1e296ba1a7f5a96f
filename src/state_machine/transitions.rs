//! Legal lifecycle transitions, consulted by the lease manager before any
//! state change is written to the store.

use super::states::UnitState;
use crate::error::{Result, ScoutError};

impl UnitState {
    /// Whether a direct transition from `self` to `target` is legal.
    ///
    /// `Invalid -> Assigned` is legal because an invalid unit whose cooldown
    /// has elapsed is implicitly Pending and may be claimed without an
    /// intermediate write. `Invalid -> Invalid` refreshes the cooldown.
    pub fn can_transition_to(&self, target: UnitState) -> bool {
        use UnitState::{Assigned, Invalid, Pending, Scanned};
        matches!(
            (self, target),
            (Pending, Assigned)
                | (Pending, Invalid)
                | (Pending, Scanned)
                | (Assigned, Pending)
                | (Assigned, Invalid)
                | (Assigned, Scanned)
                | (Invalid, Pending)
                | (Invalid, Assigned)
                | (Invalid, Invalid)
                | (Invalid, Scanned)
        )
    }

    /// Validate a transition, producing the error surfaced to callers.
    pub fn ensure_transition(&self, target: UnitState, unit_id: &str) -> Result<()> {
        if self.can_transition_to(target) {
            Ok(())
        } else {
            Err(ScoutError::StateTransitionError(format!(
                "unit {unit_id}: illegal transition {self} -> {target}"
            )))
        }
    }
}
