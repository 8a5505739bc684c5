//! Controller counters

use super::reconciler::SyncOutcome;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counters, one per reconcile outcome
#[derive(Debug, Default)]
pub struct ControllerMetrics {
    reconciliations: AtomicU64,
    primary_gone: AtomicU64,
    uncorrelated: AtomicU64,
    secondary_missing: AtomicU64,
    in_sync: AtomicU64,
    resized: AtomicU64,
    conflicts: AtomicU64,
    errors: AtomicU64,
}

/// Point-in-time copy of the counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub reconciliations: u64,
    pub primary_gone: u64,
    pub uncorrelated: u64,
    pub secondary_missing: u64,
    pub in_sync: u64,
    pub resized: u64,
    pub conflicts: u64,
    pub errors: u64,
}

impl ControllerMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_outcome(&self, outcome: &SyncOutcome) {
        self.reconciliations.fetch_add(1, Ordering::Relaxed);
        let counter = match outcome {
            SyncOutcome::PrimaryGone => &self.primary_gone,
            SyncOutcome::Uncorrelated => &self.uncorrelated,
            SyncOutcome::SecondaryMissing { .. } => &self.secondary_missing,
            SyncOutcome::InSync { .. } => &self.in_sync,
            SyncOutcome::Resized { .. } => &self.resized,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Conflicts count as errors too
    pub fn record_error(&self, conflict: bool) {
        self.reconciliations.fetch_add(1, Ordering::Relaxed);
        self.errors.fetch_add(1, Ordering::Relaxed);
        if conflict {
            self.conflicts.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            reconciliations: self.reconciliations.load(Ordering::Relaxed),
            primary_gone: self.primary_gone.load(Ordering::Relaxed),
            uncorrelated: self.uncorrelated.load(Ordering::Relaxed),
            secondary_missing: self.secondary_missing.load(Ordering::Relaxed),
            in_sync: self.in_sync.load(Ordering::Relaxed),
            resized: self.resized.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replisync_types::ObjectKey;

    #[test]
    fn test_counts_by_outcome() {
        let metrics = ControllerMetrics::new();
        metrics.record_outcome(&SyncOutcome::Uncorrelated);
        metrics.record_outcome(&SyncOutcome::Uncorrelated);
        metrics.record_outcome(&SyncOutcome::Resized {
            secondary: ObjectKey::new("ns", "cache-1"),
            from: 3,
            to: 5,
        });
        metrics.record_error(true);
        metrics.record_error(false);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.reconciliations, 5);
        assert_eq!(snapshot.uncorrelated, 2);
        assert_eq!(snapshot.resized, 1);
        assert_eq!(snapshot.errors, 2);
        assert_eq!(snapshot.conflicts, 1);
    }
}
