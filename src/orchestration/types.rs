//! # Coordination Types
//!
//! Request/response shapes shared by the coordinator's public operations.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A result submission from a reporting (scanner) client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSubmission {
    /// Server identifier the report concerns.
    pub unit_id: String,
    /// Reporting client, if it identified itself; refreshes its liveness.
    #[serde(default)]
    pub client_id: Option<String>,
    /// Classification value. When absent, the dispatch renderer derives the
    /// peak value from the payload.
    #[serde(default)]
    pub value: Option<f64>,
    /// Whether the reporter considers this unit of interest.
    #[serde(default)]
    pub tier_flag: bool,
    /// Opaque payload; only the notification renderer parses it.
    #[serde(default)]
    pub payload: Value,
}

impl ReportSubmission {
    pub fn new(unit_id: impl Into<String>) -> Self {
        Self {
            unit_id: unit_id.into(),
            client_id: None,
            value: None,
            tier_flag: false,
            payload: Value::Null,
        }
    }

    pub fn with_client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_tier_flag(mut self, tier_flag: bool) -> Self {
        self.tier_flag = tier_flag;
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Acknowledgement returned to a reporting client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportAck {
    pub unit_id: String,
    /// Tier the result classified into, if it cleared the floor.
    pub tier: Option<String>,
    /// Whether an event was queued for notification dispatch.
    pub dispatched: bool,
}

/// Outcome of an explicit enqueue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnqueueOutcome {
    Created,
    AlreadyExists,
}

/// What an administrative reset cleared.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResetSummary {
    pub units_cleared: usize,
    pub results_cleared: u64,
}
