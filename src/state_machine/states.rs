use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle states of a discovered unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    /// Discovered and waiting for a claim
    Pending,
    /// Leased to exactly one claiming client
    Assigned,
    /// Marked invalid by a client; cooling down before becoming claimable again
    Invalid,
    /// Processed to completion; terminal
    Scanned,
}

impl UnitState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Scanned)
    }

    /// Check if this is an active state (a client currently holds the lease)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Assigned)
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Assigned => write!(f, "assigned"),
            Self::Invalid => write!(f, "invalid"),
            Self::Scanned => write!(f, "scanned"),
        }
    }
}

impl std::str::FromStr for UnitState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "assigned" => Ok(Self::Assigned),
            "invalid" => Ok(Self::Invalid),
            "scanned" => Ok(Self::Scanned),
            _ => Err(format!("Invalid unit state: {s}")),
        }
    }
}

/// Default state for newly discovered units
impl Default for UnitState {
    fn default() -> Self {
        Self::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_check() {
        assert!(UnitState::Scanned.is_terminal());
        assert!(!UnitState::Pending.is_terminal());
        assert!(!UnitState::Assigned.is_terminal());
        assert!(!UnitState::Invalid.is_terminal());
    }

    #[test]
    fn test_string_conversion() {
        assert_eq!(UnitState::Assigned.to_string(), "assigned");
        assert_eq!("invalid".parse::<UnitState>().unwrap(), UnitState::Invalid);
        assert!("unknown".parse::<UnitState>().is_err());
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&UnitState::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
        let parsed: UnitState = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, UnitState::Pending);
    }
}
