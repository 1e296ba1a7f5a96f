//! # Periodic Status Reporter
//!
//! A cancellable background task that renders a fleet summary on a fixed
//! interval and edits the previous status message in place when a message
//! ref was retained. A failed cycle logs, backs off with jitter, and never
//! terminates the loop.

use crate::constants::events;
use crate::dispatch::render;
use crate::dispatch::sink::NotifySink;
use crate::orchestration::stats::StatsSnapshot;
use parking_lot::Mutex;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Handle to the running status task; dropping it does not stop the task,
/// call [`StatusReporter::stop`].
pub struct StatusReporter {
    shutdown: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl StatusReporter {
    /// Spawn the reporter. `stats_source` is polled once per cycle;
    /// `status_ref` holds the retained message ref shared with snapshots.
    pub fn start<S>(
        sink: Arc<dyn NotifySink>,
        interval: Duration,
        status_ref: Arc<Mutex<Option<String>>>,
        stats_source: S,
    ) -> Self
    where
        S: Fn() -> StatsSnapshot + Send + Sync + 'static,
    {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // Consume the immediate first tick; the first report goes out one
            // full interval after start.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        let stats = stats_source();
                        let message = render::render_status(&stats);
                        let previous = status_ref.lock().clone();

                        match sink.edit_or_send(previous.as_deref(), &message).await {
                            Ok(new_ref) => {
                                debug!(
                                    event = events::STATUS_CYCLE_COMPLETED,
                                    message_ref = %new_ref,
                                    "Status cycle completed"
                                );
                                *status_ref.lock() = Some(new_ref);
                            }
                            Err(e) => {
                                warn!(
                                    event = events::STATUS_CYCLE_FAILED,
                                    error = %e,
                                    "Status cycle failed, backing off"
                                );
                                let jitter_ms = rand::thread_rng().gen_range(250..=1500);
                                tokio::select! {
                                    _ = shutdown_rx.changed() => break,
                                    _ = tokio::time::sleep(Duration::from_millis(jitter_ms)) => {}
                                }
                            }
                        }
                    }
                }
            }
        });

        Self {
            shutdown,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Cancel the task and wait for the current cycle to finish.
    pub async fn stop(&self) {
        let _ = self.shutdown.send(true);
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}
