//! Replica sync controller
//!
//! - `reconciler`: the per-primary decision procedure
//! - `correlation`: the label contract linking a primary to its secondary
//! - `queue` / `backoff`: per-key serialization and retry pacing
//! - `dispatcher`: watch-driven event source, resync ticker, worker pool

mod backoff;
mod correlation;
mod dispatcher;
mod events;
mod metrics;
mod queue;
mod reconciler;

pub use backoff::Backoff;
pub use correlation::CorrelationLabel;
pub use dispatcher::Controller;
pub use events::{EventLog, EVENT_HISTORY};
pub use metrics::{ControllerMetrics, MetricsSnapshot};
pub use queue::WorkQueue;
pub use reconciler::{ReconcileResult, SyncOutcome, SyncReconciler};
