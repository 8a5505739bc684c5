mod common;

use common::{key, labeled_primary, secondary, InstrumentedStore, LABEL};
use replisync_daemon::error::StoreError;
use replisync_daemon::store::{PrimaryStore, SecondaryStore};
use replisync_daemon::{CorrelationLabel, ReconcileError, SyncOutcome, SyncReconciler};
use replisync_types::PrimaryInstance;
use std::sync::Arc;

fn reconciler(store: &Arc<InstrumentedStore>) -> SyncReconciler {
    SyncReconciler::new(store.clone(), CorrelationLabel::new(LABEL))
}

async fn size_of(store: &InstrumentedStore, name: &str) -> u32 {
    store
        .get_secondary(&key(name))
        .await
        .unwrap()
        .expect("secondary exists")
        .spec
        .size
}

#[tokio::test]
async fn test_labeled_primary_resizes_then_settles() {
    let store = Arc::new(InstrumentedStore::new());
    store.upsert_primary(labeled_primary("web", 5, "cache-1")).await.unwrap();
    store.upsert_secondary(secondary("cache-1", 3)).await.unwrap();
    let reconciler = reconciler(&store);

    let first = reconciler.reconcile(&key("web")).await.unwrap();
    assert!(!first.requeue);
    assert_eq!(
        first.outcome,
        SyncOutcome::Resized {
            secondary: key("cache-1"),
            from: 3,
            to: 5
        }
    );
    assert_eq!(store.patch_count(), 1);
    assert_eq!(size_of(&store, "cache-1").await, 5);

    let second = reconciler.reconcile(&key("web")).await.unwrap();
    assert!(!second.requeue);
    assert_eq!(
        second.outcome,
        SyncOutcome::InSync {
            secondary: key("cache-1"),
            size: 5
        }
    );
    assert_eq!(store.patch_count(), 1);
}

#[tokio::test]
async fn test_unlabeled_primary_reads_no_secondary() {
    let store = Arc::new(InstrumentedStore::new());
    store
        .upsert_primary(PrimaryInstance::new(&key("web2"), 4))
        .await
        .unwrap();
    store.upsert_secondary(secondary("web2", 1)).await.unwrap();

    let result = reconciler(&store).reconcile(&key("web2")).await.unwrap();

    assert_eq!(result.outcome, SyncOutcome::Uncorrelated);
    assert!(!result.requeue);
    assert_eq!(store.secondary_get_count(), 0);
    assert_eq!(store.patch_count(), 0);
    assert_eq!(size_of(&store, "web2").await, 1);
}

#[tokio::test]
async fn test_equal_sizes_issue_no_patch() {
    let store = Arc::new(InstrumentedStore::new());
    store.upsert_primary(labeled_primary("web", 3, "cache-1")).await.unwrap();
    store.upsert_secondary(secondary("cache-1", 3)).await.unwrap();

    let result = reconciler(&store).reconcile(&key("web")).await.unwrap();

    assert!(matches!(result.outcome, SyncOutcome::InSync { size: 3, .. }));
    assert_eq!(store.patch_count(), 0);
}

#[tokio::test]
async fn test_dangling_label_creates_nothing() {
    let store = Arc::new(InstrumentedStore::new());
    store.upsert_primary(labeled_primary("web", 5, "missing")).await.unwrap();

    let result = reconciler(&store).reconcile(&key("web")).await.unwrap();

    assert_eq!(
        result.outcome,
        SyncOutcome::SecondaryMissing {
            secondary: key("missing")
        }
    );
    assert!(!result.requeue);
    assert_eq!(store.patch_count(), 0);
    assert!(store.list_secondaries().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deleted_primary_is_a_no_op() {
    let store = Arc::new(InstrumentedStore::new());

    let result = reconciler(&store).reconcile(&key("gone")).await.unwrap();

    assert_eq!(result.outcome, SyncOutcome::PrimaryGone);
    assert_eq!(store.secondary_get_count(), 0);
}

#[tokio::test]
async fn test_transient_read_failure_is_surfaced() {
    let store = Arc::new(InstrumentedStore::new());
    store.upsert_primary(labeled_primary("web", 5, "cache-1")).await.unwrap();
    store.upsert_secondary(secondary("cache-1", 3)).await.unwrap();
    store.fail_next_primary_get(StoreError::Unavailable("throttled".to_string()));
    let reconciler = reconciler(&store);

    let err = reconciler.reconcile(&key("web")).await.unwrap_err();
    assert!(matches!(err, ReconcileError::GetPrimary { .. }));
    assert!(!err.is_conflict());
    assert_eq!(size_of(&store, "cache-1").await, 3);

    // Retrying from scratch converges
    reconciler.reconcile(&key("web")).await.unwrap();
    assert_eq!(size_of(&store, "cache-1").await, 5);
}

#[tokio::test]
async fn test_transient_secondary_read_failure_is_surfaced() {
    let store = Arc::new(InstrumentedStore::new());
    store.upsert_primary(labeled_primary("web", 5, "cache-1")).await.unwrap();
    store.upsert_secondary(secondary("cache-1", 3)).await.unwrap();
    store.fail_next_secondary_get(StoreError::Unavailable("timeout".to_string()));
    let reconciler = reconciler(&store);

    let err = reconciler.reconcile(&key("web")).await.unwrap_err();
    match &err {
        ReconcileError::GetSecondary { key: failed, .. } => assert_eq!(failed, &key("cache-1")),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!err.is_conflict());
    assert_eq!(store.patch_count(), 0);
    assert_eq!(size_of(&store, "cache-1").await, 3);

    reconciler.reconcile(&key("web")).await.unwrap();
    assert_eq!(size_of(&store, "cache-1").await, 5);
    assert_eq!(store.patch_count(), 1);
}

#[tokio::test]
async fn test_transient_patch_failure_is_surfaced() {
    let store = Arc::new(InstrumentedStore::new());
    store.upsert_primary(labeled_primary("web", 5, "cache-1")).await.unwrap();
    store.upsert_secondary(secondary("cache-1", 3)).await.unwrap();
    store.fail_next_patch(StoreError::Unavailable("connection reset".to_string()));

    let err = reconciler(&store).reconcile(&key("web")).await.unwrap_err();

    assert!(matches!(err, ReconcileError::Patch { .. }));
    assert_eq!(size_of(&store, "cache-1").await, 3);
}

#[tokio::test]
async fn test_concurrent_write_yields_conflict_then_converges() {
    let store = Arc::new(InstrumentedStore::new());
    store.upsert_primary(labeled_primary("web", 5, "cache-1")).await.unwrap();
    store.upsert_secondary(secondary("cache-1", 3)).await.unwrap();
    store.race_next_patch();
    let reconciler = reconciler(&store);

    let err = reconciler.reconcile(&key("web")).await.unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(size_of(&store, "cache-1").await, 3);

    let retry = reconciler.reconcile(&key("web")).await.unwrap();
    assert!(matches!(retry.outcome, SyncOutcome::Resized { from: 3, to: 5, .. }));
    assert_eq!(size_of(&store, "cache-1").await, 5);
    assert_eq!(store.patch_count(), 2);
}

#[tokio::test]
async fn test_alternate_label_key() {
    let store = Arc::new(InstrumentedStore::new());
    store
        .upsert_primary(PrimaryInstance::new(&key("api"), 7).with_label("team/secondary", "cache-2"))
        .await
        .unwrap();
    store.upsert_secondary(secondary("cache-2", 1)).await.unwrap();

    let default_key = reconciler(&store).reconcile(&key("api")).await.unwrap();
    assert_eq!(default_key.outcome, SyncOutcome::Uncorrelated);

    let custom = SyncReconciler::new(store.clone(), CorrelationLabel::new("team/secondary"));
    custom.reconcile(&key("api")).await.unwrap();
    assert_eq!(size_of(&store, "cache-2").await, 7);
}

#[tokio::test]
async fn test_scale_to_zero_is_synced() {
    let store = Arc::new(InstrumentedStore::new());
    store.upsert_primary(labeled_primary("web", 0, "cache-1")).await.unwrap();
    store.upsert_secondary(secondary("cache-1", 2)).await.unwrap();

    reconciler(&store).reconcile(&key("web")).await.unwrap();

    assert_eq!(size_of(&store, "cache-1").await, 0);
}
