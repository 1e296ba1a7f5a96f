//! # Unit Store
//!
//! Shared in-memory table of units behind a single `parking_lot` lock. All
//! conflicting writes to a unit serialize through the write lock, and the
//! claim path layers a per-unit version CAS on top so the double-assignment
//! guard stays explicit rather than an accident of the lock.

use crate::constants::events;
use crate::error::{Result, ScoutError};
use crate::models::unit::{payload_is_empty, Unit};
use crate::state_machine::UnitState;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Default)]
struct StoreInner {
    units: HashMap<String, Unit>,
    next_sequence: u64,
}

/// Durable-in-process mapping from unit id to its lifecycle record.
#[derive(Debug, Default)]
pub struct UnitStore {
    inner: RwLock<StoreInner>,
}

impl UnitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or update the record for `id`. Never creates duplicates; the
    /// monotonic upsert rules live on [`Unit::absorb_report`].
    pub fn upsert(&self, id: &str, tier_flag: bool, payload: serde_json::Value) -> Unit {
        let mut inner = self.inner.write();
        if let Some(unit) = inner.units.get_mut(id) {
            unit.absorb_report(tier_flag, payload);
            return unit.clone();
        }
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        let payload = if payload_is_empty(&payload) {
            serde_json::Value::Null
        } else {
            payload
        };
        let unit = Unit::new(id, tier_flag, payload, sequence);
        inner.units.insert(id.to_string(), unit.clone());
        unit
    }

    /// Enqueue `id` if it is not already known. Returns `true` when a record
    /// was created; an existing record is left untouched.
    pub fn insert_if_absent(&self, id: &str) -> bool {
        let mut inner = self.inner.write();
        if inner.units.contains_key(id) {
            return false;
        }
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        inner
            .units
            .insert(id.to_string(), Unit::new(id, true, serde_json::Value::Null, sequence));
        true
    }

    pub fn get(&self, id: &str) -> Option<Unit> {
        self.inner.read().units.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().units.is_empty()
    }

    /// All units in insertion order, capped at `limit`.
    pub fn list_all(&self, limit: usize) -> Vec<Unit> {
        let inner = self.inner.read();
        let mut units: Vec<Unit> = inner.units.values().cloned().collect();
        units.sort_by_key(|u| u.sequence);
        units.truncate(limit);
        units
    }

    /// The oldest claim-eligible unit, as an `(id, version)` pair for the
    /// subsequent CAS. FIFO by `first_seen`, ties broken by insertion order.
    pub fn select_candidate(
        &self,
        cooldown: Duration,
        lease_ttl: Option<Duration>,
    ) -> Option<(String, u64)> {
        let now = Utc::now();
        let inner = self.inner.read();
        inner
            .units
            .values()
            .filter(|u| u.is_eligible(now, cooldown, lease_ttl))
            .min_by_key(|u| (u.first_seen, u.sequence))
            .map(|u| (u.id.clone(), u.version))
    }

    /// Conditionally claim `id` for `client_id`: succeeds only if the unit is
    /// still at `expected_version` and still eligible at write time. A lost
    /// race surfaces as `Conflict` so the caller can re-select.
    pub fn compare_and_claim(
        &self,
        id: &str,
        expected_version: u64,
        client_id: &str,
        cooldown: Duration,
        lease_ttl: Option<Duration>,
    ) -> Result<Unit> {
        let now = Utc::now();
        let mut inner = self.inner.write();
        let unit = inner
            .units
            .get_mut(id)
            .ok_or_else(|| ScoutError::NotFound(format!("unit {id}")))?;

        if unit.version != expected_version || !unit.is_eligible(now, cooldown, lease_ttl) {
            return Err(ScoutError::Conflict(format!(
                "unit {id} changed before claim (version {} != {expected_version})",
                unit.version
            )));
        }

        match unit.state {
            // An eligible Assigned unit means its lease TTL expired;
            // reclaiming it is a lease replacement, not a state transition.
            UnitState::Assigned => {
                debug!(
                    event = events::UNIT_LEASE_RECLAIMED,
                    unit_id = %id,
                    previous_holder = ?unit.assigned_to,
                    "Expired lease reclaimed"
                );
            }
            UnitState::Invalid => {
                unit.state.ensure_transition(UnitState::Assigned, id)?;
                debug!(
                    event = events::UNIT_COOLDOWN_ELAPSED,
                    unit_id = %id,
                    "Cooldown elapsed, unit readmitted to the queue"
                );
            }
            _ => unit.state.ensure_transition(UnitState::Assigned, id)?,
        }
        unit.state = UnitState::Assigned;
        unit.assigned_to = Some(client_id.to_string());
        unit.assigned_at = Some(now);
        unit.invalid_since = None;
        unit.version += 1;
        Ok(unit.clone())
    }

    /// Run a mutation against the unit `id` under the write lock.
    /// `NotFound` if the id is unknown; the closure's error passes through
    /// with no partial update visible to other readers.
    pub fn with_unit_mut<T>(
        &self,
        id: &str,
        mutate: impl FnOnce(&mut Unit) -> Result<T>,
    ) -> Result<T> {
        let mut inner = self.inner.write();
        let unit = inner
            .units
            .get_mut(id)
            .ok_or_else(|| ScoutError::NotFound(format!("unit {id}")))?;
        let mut staged = unit.clone();
        staged.version = unit.version + 1;
        let outcome = mutate(&mut staged)?;
        *unit = staged;
        Ok(outcome)
    }

    /// Counts backing `GetStats`: claim-eligible units and units still
    /// cooling down.
    pub fn queue_counts(&self, cooldown: Duration, lease_ttl: Option<Duration>) -> (usize, usize) {
        let now = Utc::now();
        let inner = self.inner.read();
        let mut eligible = 0;
        let mut cooling = 0;
        for unit in inner.units.values() {
            if unit.is_eligible(now, cooldown, lease_ttl) {
                eligible += 1;
            } else if unit.state == UnitState::Invalid {
                cooling += 1;
            }
        }
        (eligible, cooling)
    }

    /// Drop every record. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.write();
        let count = inner.units.len();
        inner.units.clear();
        inner.next_sequence = 0;
        count
    }

    /// Export for snapshotting, in insertion order.
    pub fn export(&self) -> (Vec<Unit>, u64) {
        let inner = self.inner.read();
        let mut units: Vec<Unit> = inner.units.values().cloned().collect();
        units.sort_by_key(|u| u.sequence);
        (units, inner.next_sequence)
    }

    /// Replace the table with snapshot contents.
    pub fn restore(&self, units: Vec<Unit>, next_sequence: u64) {
        let mut inner = self.inner.write();
        inner.units = units.into_iter().map(|u| (u.id.clone(), u)).collect();
        inner.next_sequence = next_sequence;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_upsert_is_idempotent_on_id() {
        let store = UnitStore::new();
        store.upsert("srv-1", true, json!({"finds": [1]}));
        store.upsert("srv-1", false, json!({}));
        assert_eq!(store.len(), 1);

        let unit = store.get("srv-1").unwrap();
        assert!(unit.tier_flag);
        assert_eq!(unit.payload, json!({"finds": [1]}));
    }

    #[test]
    fn test_insert_if_absent() {
        let store = UnitStore::new();
        assert!(store.insert_if_absent("srv-1"));
        assert!(!store.insert_if_absent("srv-1"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_candidate_is_fifo() {
        let store = UnitStore::new();
        store.insert_if_absent("srv-a");
        store.insert_if_absent("srv-b");
        let (id, _) = store
            .select_candidate(Duration::from_secs(300), None)
            .unwrap();
        assert_eq!(id, "srv-a");
    }

    #[test]
    fn test_cas_rejects_stale_version() {
        let store = UnitStore::new();
        store.insert_if_absent("srv-a");
        let (id, version) = store
            .select_candidate(Duration::from_secs(300), None)
            .unwrap();

        // Another writer touches the unit between select and claim.
        store.upsert(&id, true, json!(null));

        let result = store.compare_and_claim(&id, version, "worker-1", Duration::from_secs(300), None);
        assert!(matches!(result, Err(ScoutError::Conflict(_))));
    }

    #[test]
    fn test_claim_sets_lease_fields() {
        let store = UnitStore::new();
        store.insert_if_absent("srv-a");
        let (id, version) = store
            .select_candidate(Duration::from_secs(300), None)
            .unwrap();
        let unit = store
            .compare_and_claim(&id, version, "worker-1", Duration::from_secs(300), None)
            .unwrap();
        assert_eq!(unit.state, UnitState::Assigned);
        assert_eq!(unit.assigned_to.as_deref(), Some("worker-1"));
        assert!(unit.assigned_at.is_some());
    }

    #[test]
    fn test_invalid_unit_readmitted_after_cooldown() {
        let store = UnitStore::new();
        store.insert_if_absent("srv-a");
        store
            .with_unit_mut("srv-a", |unit| {
                unit.state = UnitState::Invalid;
                unit.invalid_since = Some(Utc::now() - chrono::Duration::milliseconds(50));
                Ok(())
            })
            .unwrap();

        let cooldown = Duration::from_millis(10);
        let (id, version) = store.select_candidate(cooldown, None).unwrap();
        let unit = store
            .compare_and_claim(&id, version, "worker-1", cooldown, None)
            .unwrap();
        assert_eq!(unit.state, UnitState::Assigned);
        assert!(unit.invalid_since.is_none());
    }

    #[test]
    fn test_expired_lease_is_reclaimed_by_next_claimer() {
        let store = UnitStore::new();
        store.insert_if_absent("srv-a");
        let cooldown = Duration::from_secs(300);
        let ttl = Some(Duration::from_millis(10));

        let (id, version) = store.select_candidate(cooldown, ttl).unwrap();
        store
            .compare_and_claim(&id, version, "worker-1", cooldown, ttl)
            .unwrap();

        std::thread::sleep(Duration::from_millis(30));
        let (id, version) = store.select_candidate(cooldown, ttl).unwrap();
        let unit = store
            .compare_and_claim(&id, version, "worker-2", cooldown, ttl)
            .unwrap();
        assert_eq!(unit.assigned_to.as_deref(), Some("worker-2"));
    }

    #[test]
    fn test_with_unit_mut_unknown_id() {
        let store = UnitStore::new();
        let result = store.with_unit_mut("ghost", |_| Ok(()));
        assert!(matches!(result, Err(ScoutError::NotFound(_))));
    }

    #[test]
    fn test_failed_mutation_leaves_unit_untouched() {
        let store = UnitStore::new();
        store.insert_if_absent("srv-a");
        let before = store.get("srv-a").unwrap();
        let result: Result<()> = store.with_unit_mut("srv-a", |unit| {
            unit.tier_flag = false;
            Err(ScoutError::StateTransitionError("staged".to_string()))
        });
        assert!(result.is_err());
        let after = store.get("srv-a").unwrap();
        assert_eq!(after.version, before.version);
        assert!(after.tier_flag);
    }

    #[test]
    fn test_clear_and_restore() {
        let store = UnitStore::new();
        store.insert_if_absent("srv-a");
        store.insert_if_absent("srv-b");
        let (units, next) = store.export();
        assert_eq!(store.clear(), 2);
        assert!(store.is_empty());

        store.restore(units, next);
        assert_eq!(store.len(), 2);
        assert!(!store.insert_if_absent("srv-b"));
    }
}
