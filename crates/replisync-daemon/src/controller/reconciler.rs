//! Sync reconciler
//!
//! Given the key of a changed primary, bring the correlated secondary's
//! `spec.size` to the primary's `spec.replicas`:
//!
//! 1. Load the primary. Gone means deleted after the event; nothing to do.
//! 2. Read the correlation label. Absent means the primary does not take part.
//! 3. Load the secondary in the same namespace. Missing is not an error.
//! 4. Compare `replicas` with `size`. Equal means converged.
//! 5. Patch `size` with a merge patch conditioned on the version just read.
//!
//! Every call starts from fresh reads and keeps no state between calls, so a
//! failed or conflicting attempt is safe to repeat as-is.

use super::correlation::CorrelationLabel;
use crate::error::{ReconcileError, StoreError};
use crate::store::{PrimaryStore, ResourceStore, SecondaryStore};
use replisync_types::{ConditionalPatch, MergePatch, ObjectKey};
use std::fmt;
use std::sync::Arc;

/// What a successful reconciliation found or did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The primary no longer exists
    PrimaryGone,

    /// The primary carries no correlation label
    Uncorrelated,

    /// The label names a secondary that does not exist
    SecondaryMissing { secondary: ObjectKey },

    /// Replicas and size already agree
    InSync { secondary: ObjectKey, size: u32 },

    /// The secondary was patched
    Resized {
        secondary: ObjectKey,
        from: u32,
        to: u32,
    },
}

impl SyncOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOutcome::PrimaryGone => "primary_gone",
            SyncOutcome::Uncorrelated => "uncorrelated",
            SyncOutcome::SecondaryMissing { .. } => "secondary_missing",
            SyncOutcome::InSync { .. } => "in_sync",
            SyncOutcome::Resized { .. } => "resized",
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileResult {
    /// Ask the caller to run this request again
    pub requeue: bool,
    pub outcome: SyncOutcome,
}

impl ReconcileResult {
    fn done(outcome: SyncOutcome) -> Self {
        Self {
            requeue: false,
            outcome,
        }
    }
}

/// Propagates primary replicas to the correlated secondary's size
pub struct SyncReconciler {
    store: Arc<dyn ResourceStore>,
    correlation: CorrelationLabel,
}

impl SyncReconciler {
    pub fn new(store: Arc<dyn ResourceStore>, correlation: CorrelationLabel) -> Self {
        Self { store, correlation }
    }

    pub fn correlation(&self) -> &CorrelationLabel {
        &self.correlation
    }

    /// Reconcile the primary named by `request`
    pub async fn reconcile(&self, request: &ObjectKey) -> Result<ReconcileResult, ReconcileError> {
        let primary = match self.store.get_primary(request).await {
            Ok(Some(primary)) => primary,
            Ok(None) => {
                tracing::info!(primary = %request, "Primary not found, ignoring since it must be deleted");
                return Ok(ReconcileResult::done(SyncOutcome::PrimaryGone));
            }
            Err(source) => {
                tracing::error!(primary = %request, error = %source, "Failed to get primary");
                return Err(ReconcileError::GetPrimary {
                    key: request.clone(),
                    source,
                });
            }
        };

        let Some(secondary_key) = self.correlation.resolve(&primary.metadata) else {
            tracing::debug!(primary = %request, "No correlation label");
            return Ok(ReconcileResult::done(SyncOutcome::Uncorrelated));
        };
        let replicas = primary.spec.replicas;

        let secondary = match self.store.get_secondary(&secondary_key).await {
            Ok(Some(secondary)) => secondary,
            Ok(None) => {
                tracing::info!(
                    primary = %request,
                    secondary = %secondary_key,
                    "Secondary not found, nothing to do"
                );
                return Ok(ReconcileResult::done(SyncOutcome::SecondaryMissing {
                    secondary: secondary_key,
                }));
            }
            Err(source) => {
                tracing::error!(secondary = %secondary_key, error = %source, "Failed to get secondary");
                return Err(ReconcileError::GetSecondary {
                    key: secondary_key,
                    source,
                });
            }
        };

        let size = secondary.spec.size;
        if size == replicas {
            tracing::debug!(primary = %request, secondary = %secondary_key, size, "Already in sync");
            return Ok(ReconcileResult::done(SyncOutcome::InSync {
                secondary: secondary_key,
                size,
            }));
        }

        let mut desired = secondary.clone();
        desired.spec.size = replicas;
        let patch = MergePatch::between(&secondary, &desired).map_err(|e| ReconcileError::Patch {
            key: secondary_key.clone(),
            source: e.into(),
        })?;
        let patch = ConditionalPatch::new(patch, secondary.metadata.resource_version);

        tracing::info!(
            primary = %request,
            secondary = %secondary_key,
            from = size,
            to = replicas,
            "Replica count changed, syncing secondary"
        );

        match self.store.patch_secondary(&secondary_key, &patch).await {
            Ok(_) => Ok(ReconcileResult::done(SyncOutcome::Resized {
                secondary: secondary_key,
                from: size,
                to: replicas,
            })),
            Err(source @ StoreError::VersionConflict { .. }) => Err(ReconcileError::Conflict {
                key: secondary_key,
                source,
            }),
            Err(source) => Err(ReconcileError::Patch {
                key: secondary_key,
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{InMemoryStore, PrimaryStore, SecondaryStore};
    use replisync_types::{PrimaryInstance, SecondaryInstance};

    const LABEL: &str = "sync-key";

    fn reconciler(store: Arc<InMemoryStore>) -> SyncReconciler {
        SyncReconciler::new(store, CorrelationLabel::new(LABEL))
    }

    #[tokio::test]
    async fn test_resizes_divergent_secondary() {
        let store = Arc::new(InMemoryStore::new());
        let web = ObjectKey::new("ns", "web");
        let cache = ObjectKey::new("ns", "cache-1");
        store
            .upsert_primary(PrimaryInstance::new(&web, 5).with_label(LABEL, "cache-1"))
            .await
            .unwrap();
        store
            .upsert_secondary(SecondaryInstance::new(&cache, 3))
            .await
            .unwrap();

        let result = reconciler(store.clone()).reconcile(&web).await.unwrap();

        assert!(!result.requeue);
        assert_eq!(
            result.outcome,
            SyncOutcome::Resized {
                secondary: cache.clone(),
                from: 3,
                to: 5
            }
        );
        let secondary = store.get_secondary(&cache).await.unwrap().unwrap();
        assert_eq!(secondary.spec.size, 5);
    }

    #[tokio::test]
    async fn test_primary_gone_is_benign() {
        let store = Arc::new(InMemoryStore::new());
        let result = reconciler(store)
            .reconcile(&ObjectKey::new("ns", "deleted"))
            .await
            .unwrap();

        assert_eq!(result.outcome, SyncOutcome::PrimaryGone);
        assert!(!result.requeue);
    }

    #[tokio::test]
    async fn test_other_namespace_secondary_is_not_matched() {
        let store = Arc::new(InMemoryStore::new());
        let web = ObjectKey::new("ns", "web");
        store
            .upsert_primary(PrimaryInstance::new(&web, 5).with_label(LABEL, "cache-1"))
            .await
            .unwrap();
        store
            .upsert_secondary(SecondaryInstance::new(&ObjectKey::new("other", "cache-1"), 3))
            .await
            .unwrap();

        let result = reconciler(store.clone()).reconcile(&web).await.unwrap();

        assert_eq!(
            result.outcome,
            SyncOutcome::SecondaryMissing {
                secondary: ObjectKey::new("ns", "cache-1")
            }
        );
        let untouched = store
            .get_secondary(&ObjectKey::new("other", "cache-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(untouched.spec.size, 3);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(SyncOutcome::PrimaryGone.to_string(), "primary_gone");
        assert_eq!(SyncOutcome::Uncorrelated.as_str(), "uncorrelated");
    }
}
