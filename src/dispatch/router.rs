//! # Dispatch Router
//!
//! Fans classified result events out to the sink bound to their tier.
//! Delivery rides a bounded queue drained by a background worker, so a slow
//! or unreachable endpoint never blocks the reporting path. Failures are
//! logged and swallowed; a full queue drops the event rather than waiting.

use crate::constants::events;
use crate::dispatch::sink::NotifySink;
use crate::error::ScoutError;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Debug)]
struct DispatchJob {
    tier: String,
    message: Value,
}

pub struct DispatchRouter {
    tx: Mutex<Option<mpsc::Sender<DispatchJob>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl DispatchRouter {
    /// Spawn the delivery worker over a queue of `queue_depth` slots.
    pub fn new(sink: Arc<dyn NotifySink>, queue_depth: usize) -> Self {
        let (tx, mut rx) = mpsc::channel::<DispatchJob>(queue_depth);

        let worker = tokio::spawn(async move {
            while let Some(job) = rx.recv().await {
                match sink.send(&job.tier, &job.message).await {
                    Ok(()) => {
                        debug!(event = events::DISPATCH_SENT, tier = %job.tier, "Dispatched event");
                    }
                    Err(e) => {
                        // Best-effort: no retry, never surfaced to the reporter.
                        let error = ScoutError::from(e);
                        warn!(
                            event = events::DISPATCH_FAILED,
                            tier = %job.tier,
                            error = %error,
                            "Dispatch failed"
                        );
                    }
                }
            }
        });

        Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Queue a rendered event for delivery. Fire-and-forget: returns
    /// immediately, drops the event with a warning when the queue is full or
    /// the router is shut down.
    pub fn dispatch(&self, tier: &str, message: Value) {
        let job = DispatchJob {
            tier: tier.to_string(),
            message,
        };
        let guard = self.tx.lock();
        let Some(tx) = guard.as_ref() else {
            warn!(event = events::DISPATCH_DROPPED, tier = %job.tier, "Router is shut down");
            return;
        };
        match tx.try_send(job) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!(
                    event = events::DISPATCH_DROPPED,
                    tier = %job.tier,
                    "Dispatch queue full, dropping event"
                );
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                warn!(
                    event = events::DISPATCH_DROPPED,
                    tier = %job.tier,
                    "Dispatch worker gone, dropping event"
                );
            }
        }
    }

    /// Close the queue and wait for in-flight deliveries to drain.
    pub async fn shutdown(&self) {
        self.tx.lock().take();
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}
