//! # Notification Sinks
//!
//! The seam between the coordinator and the outside world. [`NotifySink`]
//! abstracts per-tier delivery plus the edit-in-place path used by the
//! status reporter; [`WebhookSink`] is the Discord-style webhook
//! implementation, and [`MemorySink`] backs tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("No sink bound to tier {0}")]
    UnboundTier(String),
    #[error("No status endpoint configured")]
    NoStatusEndpoint,
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Sink responded with status {0}")]
    Status(u16),
    #[error("Sink response missing message id")]
    MissingMessageRef,
    #[error("Sink failure: {0}")]
    Unavailable(String),
}

impl From<SinkError> for crate::error::ScoutError {
    fn from(e: SinkError) -> Self {
        crate::error::ScoutError::SinkUnavailable(e.to_string())
    }
}

/// Best-effort notification delivery. Implementations are not required to be
/// idempotent; the router never retries.
#[async_trait]
pub trait NotifySink: Send + Sync {
    /// Deliver `message` to whatever endpoint is bound to `tier`.
    async fn send(&self, tier: &str, message: &Value) -> Result<(), SinkError>;

    /// Edit the message referenced by `previous` in place, or create a new
    /// one when there is no previous ref or the edit fails. Returns the ref
    /// to retain for the next edit.
    async fn edit_or_send(
        &self,
        previous: Option<&str>,
        message: &Value,
    ) -> Result<String, SinkError>;
}

/// Webhook-backed sink: one URL per tier plus a dedicated status endpoint.
pub struct WebhookSink {
    client: reqwest::Client,
    tier_urls: HashMap<String, String>,
    status_url: Option<String>,
}

impl WebhookSink {
    pub fn new(
        tier_urls: HashMap<String, String>,
        status_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            tier_urls,
            status_url,
        })
    }

    async fn post(&self, url: &str, message: &Value) -> Result<reqwest::Response, SinkError> {
        let response = self.client.post(url).json(message).send().await?;
        if !response.status().is_success() {
            return Err(SinkError::Status(response.status().as_u16()));
        }
        Ok(response)
    }

    /// Create a new status message and return its id.
    async fn create_status_message(&self, url: &str, message: &Value) -> Result<String, SinkError> {
        // wait=true makes the webhook return the created message body.
        let response = self.post(&format!("{url}?wait=true"), message).await?;
        let body: Value = response.json().await?;
        body.get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(SinkError::MissingMessageRef)
    }
}

#[async_trait]
impl NotifySink for WebhookSink {
    async fn send(&self, tier: &str, message: &Value) -> Result<(), SinkError> {
        let url = self
            .tier_urls
            .get(tier)
            .ok_or_else(|| SinkError::UnboundTier(tier.to_string()))?;
        self.post(url, message).await?;
        Ok(())
    }

    async fn edit_or_send(
        &self,
        previous: Option<&str>,
        message: &Value,
    ) -> Result<String, SinkError> {
        let url = self
            .status_url
            .as_deref()
            .ok_or(SinkError::NoStatusEndpoint)?;

        if let Some(message_ref) = previous {
            let edit_url = format!("{url}/messages/{message_ref}");
            let edited = self.client.patch(&edit_url).json(message).send().await;
            match edited {
                Ok(response) if response.status().is_success() => {
                    return Ok(message_ref.to_string());
                }
                // Edit failed (deleted message, transient error); fall back
                // to creating a fresh one.
                _ => {}
            }
        }

        self.create_status_message(url, message).await
    }
}

/// Records every delivery; optionally fails on demand.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub sent: parking_lot::Mutex<Vec<(String, Value)>>,
    pub status_edits: parking_lot::Mutex<Vec<(Option<String>, Value)>>,
    fail: std::sync::atomic::AtomicBool,
    fail_edits: std::sync::atomic::AtomicBool,
    next_ref: std::sync::atomic::AtomicU64,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    /// Simulate edits failing (deleted message, transient error) while
    /// message creation still works, as the webhook fallback path sees it.
    pub fn set_edit_failing(&self, failing: bool) {
        self.fail_edits
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    fn edits_failing(&self) -> bool {
        self.fail_edits.load(std::sync::atomic::Ordering::SeqCst)
    }

    fn check_failing(&self) -> Result<(), SinkError> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            Err(SinkError::Unavailable("sink forced down".to_string()))
        } else {
            Ok(())
        }
    }

    pub fn sent_tiers(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(tier, _)| tier.clone()).collect()
    }
}

#[async_trait]
impl NotifySink for MemorySink {
    async fn send(&self, tier: &str, message: &Value) -> Result<(), SinkError> {
        self.check_failing()?;
        self.sent.lock().push((tier.to_string(), message.clone()));
        Ok(())
    }

    async fn edit_or_send(
        &self,
        previous: Option<&str>,
        message: &Value,
    ) -> Result<String, SinkError> {
        self.check_failing()?;
        self.status_edits
            .lock()
            .push((previous.map(str::to_string), message.clone()));
        match previous {
            // A failed edit falls back to creating a new message, so the
            // caller gets a fresh ref rather than an error.
            Some(message_ref) if !self.edits_failing() => Ok(message_ref.to_string()),
            _ => {
                let seq = self
                    .next_ref
                    .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(format!("msg-{seq}"))
            }
        }
    }
}
