//! # Lease Manager
//!
//! Decides which unit a claiming client receives next and guards every
//! lifecycle transition. Claiming is select-then-CAS: the oldest eligible
//! unit is picked under a read lock, then conditionally written only if it
//! is still claimable at write time. A lost race re-selects rather than
//! failing the caller, so concurrent claimers can never double-assign a
//! unit.

use crate::constants::events;
use crate::error::{Result, ScoutError};
use crate::models::Unit;
use crate::state_machine::UnitState;
use crate::store::UnitStore;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Tuning for claim selection and cooldown handling.
#[derive(Debug, Clone)]
pub struct LeaseManagerConfig {
    /// Cooldown before an invalidated unit becomes claimable again.
    pub invalid_cooldown: Duration,
    /// Optional TTL after which a stuck lease is reclaimed.
    pub lease_ttl: Option<Duration>,
}

impl Default for LeaseManagerConfig {
    fn default() -> Self {
        Self {
            invalid_cooldown: crate::constants::DEFAULT_INVALID_COOLDOWN,
            lease_ttl: None,
        }
    }
}

/// Lease lifecycle component over the shared unit store.
#[derive(Debug)]
pub struct LeaseManager {
    store: Arc<UnitStore>,
    config: LeaseManagerConfig,
}

impl LeaseManager {
    pub fn new(store: Arc<UnitStore>, config: LeaseManagerConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &LeaseManagerConfig {
        &self.config
    }

    /// Claim the oldest eligible unit for `client_id`, or `None` when the
    /// queue has nothing claimable. FIFO by `first_seen`, stable tie-break
    /// by insertion order; invalid units re-enter selection lazily once
    /// their cooldown has elapsed.
    #[instrument(skip(self), fields(client_id = %client_id))]
    pub fn claim_next(&self, client_id: &str) -> Option<Unit> {
        loop {
            let (id, version) = self
                .store
                .select_candidate(self.config.invalid_cooldown, self.config.lease_ttl)?;

            match self.store.compare_and_claim(
                &id,
                version,
                client_id,
                self.config.invalid_cooldown,
                self.config.lease_ttl,
            ) {
                Ok(unit) => {
                    info!(
                        event = events::UNIT_CLAIMED,
                        unit_id = %unit.id,
                        "Unit claimed"
                    );
                    return Some(unit);
                }
                // Lost the race or the unit vanished between select and
                // claim: re-select.
                Err(ScoutError::Conflict(_)) | Err(ScoutError::NotFound(_)) => {
                    debug!(unit_id = %id, "Claim raced, reselecting");
                    continue;
                }
                Err(e) => {
                    warn!(unit_id = %id, error = %e, "Claim aborted");
                    return None;
                }
            }
        }
    }

    /// Transition a unit to Invalid and start its cooldown. Releases any
    /// lease the unit was holding.
    #[instrument(skip(self))]
    pub fn mark_invalid(&self, id: &str) -> Result<Unit> {
        let unit = self.store.with_unit_mut(id, |unit| {
            unit.state.ensure_transition(UnitState::Invalid, id)?;
            unit.state = UnitState::Invalid;
            unit.invalid_since = Some(Utc::now());
            unit.clear_lease();
            Ok(unit.clone())
        })?;
        info!(event = events::UNIT_INVALIDATED, unit_id = %id, "Unit placed under cooldown");
        Ok(unit)
    }

    /// Terminal transition: the unit was processed to completion. Clears any
    /// lease. Idempotent for an already-scanned unit. `NotFound` if `id` is
    /// unknown.
    #[instrument(skip(self), fields(client_id = %client_id))]
    pub fn mark_scanned(&self, id: &str, client_id: &str) -> Result<Unit> {
        let unit = self.store.with_unit_mut(id, |unit| {
            if unit.state == UnitState::Scanned {
                return Ok(unit.clone());
            }
            if let Some(holder) = unit.assigned_to.as_deref() {
                if holder != client_id {
                    warn!(
                        unit_id = %id,
                        holder = %holder,
                        "Scan completion reported by a client that does not hold the lease"
                    );
                }
            }
            unit.state.ensure_transition(UnitState::Scanned, id)?;
            unit.state = UnitState::Scanned;
            unit.clear_lease();
            unit.invalid_since = None;
            Ok(unit.clone())
        })?;
        info!(event = events::UNIT_SCANNED, unit_id = %id, "Unit scanned");
        Ok(unit)
    }

    /// Give an Assigned unit back to the queue without invalidating it.
    /// Returns `false` when `client_id` does not hold the lease.
    #[instrument(skip(self), fields(client_id = %client_id))]
    pub fn release(&self, id: &str, client_id: &str) -> Result<bool> {
        let released = self.store.with_unit_mut(id, |unit| {
            if unit.state != UnitState::Assigned {
                return Ok(false);
            }
            if unit.assigned_to.as_deref() != Some(client_id) {
                warn!(
                    unit_id = %id,
                    holder = ?unit.assigned_to,
                    "Release refused: lease held by another client"
                );
                return Ok(false);
            }
            unit.state.ensure_transition(UnitState::Pending, id)?;
            unit.state = UnitState::Pending;
            unit.clear_lease();
            Ok(true)
        })?;
        if released {
            info!(event = events::UNIT_RELEASED, unit_id = %id, "Lease released");
        }
        Ok(released)
    }
}
