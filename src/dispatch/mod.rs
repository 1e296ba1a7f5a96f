//! # Tiered Dispatch
//!
//! Classification of result events into value tiers and best-effort,
//! asynchronous fan-out to the notification sink bound to each tier, plus
//! the periodic edit-in-place status report.

pub mod classifier;
pub mod render;
pub mod router;
pub mod sink;
pub mod status;

pub use classifier::TierClassifier;
pub use router::DispatchRouter;
pub use sink::{MemorySink, NotifySink, SinkError, WebhookSink};
pub use status::StatusReporter;
