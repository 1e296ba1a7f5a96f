//! # Unit Model
//!
//! The record kept for every discovered server identifier: lifecycle state,
//! lease fields, cooldown timestamp, and the opaque payload attached by the
//! last reporting client. The core never inspects payload contents; only the
//! notification renderer parses them.

use crate::state_machine::UnitState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// One unit of work: an externally-discovered server identifier that may or
/// may not warrant a claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    /// Opaque unique identifier (the server/job id).
    pub id: String,
    /// Current lifecycle state.
    pub state: UnitState,
    /// Monotonic "of interest" flag; once true it never reverts.
    pub tier_flag: bool,
    /// Opaque payload from the last reporting client. `Null` means empty.
    pub payload: Value,
    /// Claiming client currently holding the lease, if any.
    pub assigned_to: Option<String>,
    /// Lease acquisition time; set if and only if `state == Assigned`.
    pub assigned_at: Option<DateTime<Utc>>,
    /// When the unit entered cooldown, if it is (or was last) invalid.
    pub invalid_since: Option<DateTime<Utc>>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Bumped on every write; claim CAS checks it.
    pub version: u64,
    /// Insertion order, used as the stable tie-break on `first_seen`.
    pub sequence: u64,
}

impl Unit {
    pub fn new(id: impl Into<String>, tier_flag: bool, payload: Value, sequence: u64) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            state: UnitState::Pending,
            tier_flag,
            payload,
            assigned_to: None,
            assigned_at: None,
            invalid_since: None,
            first_seen: now,
            last_seen: now,
            version: 0,
            sequence,
        }
    }

    /// Fold a new report into this record without violating the upsert
    /// invariants: `tier_flag` never downgrades, a non-empty payload is never
    /// overwritten by an empty one, and `last_seen` only advances.
    pub fn absorb_report(&mut self, tier_flag: bool, payload: Value) {
        self.tier_flag = self.tier_flag || tier_flag;
        if !payload_is_empty(&payload) {
            self.payload = payload;
        }
        let now = Utc::now();
        if now > self.last_seen {
            self.last_seen = now;
        }
        self.version += 1;
    }

    /// Whether this unit may be handed to a claiming client at `now`.
    ///
    /// An Invalid unit whose cooldown has elapsed is implicitly Pending.
    /// When a lease TTL is configured, an Assigned unit whose lease has
    /// expired is reclaimable.
    pub fn is_eligible(
        &self,
        now: DateTime<Utc>,
        cooldown: Duration,
        lease_ttl: Option<Duration>,
    ) -> bool {
        if !self.tier_flag {
            return false;
        }
        match self.state {
            UnitState::Pending => true,
            UnitState::Invalid => self.cooldown_elapsed(now, cooldown),
            UnitState::Assigned => match (lease_ttl, self.assigned_at) {
                (Some(ttl), Some(at)) => elapsed_at_least(at, now, ttl),
                _ => false,
            },
            UnitState::Scanned => false,
        }
    }

    pub fn cooldown_elapsed(&self, now: DateTime<Utc>, cooldown: Duration) -> bool {
        match self.invalid_since {
            Some(since) => elapsed_at_least(since, now, cooldown),
            None => true,
        }
    }

    /// Drop any lease fields. Called on every transition out of Assigned.
    pub fn clear_lease(&mut self) {
        self.assigned_to = None;
        self.assigned_at = None;
    }
}

fn elapsed_at_least(since: DateTime<Utc>, now: DateTime<Utc>, duration: Duration) -> bool {
    match chrono::Duration::from_std(duration) {
        Ok(d) => now - since >= d,
        Err(_) => false,
    }
}

/// An empty payload carries no information worth storing: null, `{}`, `[]`,
/// or `""`.
pub fn payload_is_empty(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tier_flag_never_downgrades() {
        let mut unit = Unit::new("srv-1", true, Value::Null, 0);
        unit.absorb_report(false, Value::Null);
        assert!(unit.tier_flag);
    }

    #[test]
    fn test_empty_payload_does_not_overwrite() {
        let mut unit = Unit::new("srv-1", true, json!({"finds": [{"name": "x"}]}), 0);
        unit.absorb_report(true, json!({}));
        assert_eq!(unit.payload, json!({"finds": [{"name": "x"}]}));

        unit.absorb_report(true, json!({"finds": []}));
        assert_eq!(unit.payload["finds"], json!([]));
    }

    #[test]
    fn test_absorb_bumps_version() {
        let mut unit = Unit::new("srv-1", false, Value::Null, 0);
        let before = unit.version;
        unit.absorb_report(false, Value::Null);
        assert_eq!(unit.version, before + 1);
    }

    #[test]
    fn test_eligibility_requires_tier_flag() {
        let unit = Unit::new("srv-1", false, Value::Null, 0);
        assert!(!unit.is_eligible(Utc::now(), Duration::from_secs(300), None));
    }

    #[test]
    fn test_invalid_unit_waits_out_cooldown() {
        let mut unit = Unit::new("srv-1", true, Value::Null, 0);
        let t0 = Utc::now();
        unit.state = UnitState::Invalid;
        unit.invalid_since = Some(t0);

        let cooldown = Duration::from_secs(300);
        let during = t0 + chrono::Duration::seconds(100);
        let after = t0 + chrono::Duration::seconds(301);
        assert!(!unit.is_eligible(during, cooldown, None));
        assert!(unit.is_eligible(after, cooldown, None));
    }

    #[test]
    fn test_assigned_unit_reclaimable_only_with_ttl() {
        let mut unit = Unit::new("srv-1", true, Value::Null, 0);
        unit.state = UnitState::Assigned;
        unit.assigned_to = Some("worker-1".to_string());
        unit.assigned_at = Some(Utc::now() - chrono::Duration::seconds(3600));

        let now = Utc::now();
        assert!(!unit.is_eligible(now, Duration::from_secs(300), None));
        assert!(unit.is_eligible(now, Duration::from_secs(300), Some(Duration::from_secs(600))));
    }

    #[test]
    fn test_payload_emptiness() {
        assert!(payload_is_empty(&Value::Null));
        assert!(payload_is_empty(&json!({})));
        assert!(payload_is_empty(&json!([])));
        assert!(payload_is_empty(&json!("")));
        assert!(!payload_is_empty(&json!({"finds": []})));
        assert!(!payload_is_empty(&json!(0)));
    }
}
