//! In-memory store implementation

use super::traits::*;
use crate::error::StoreError;
use async_trait::async_trait;
use replisync_types::{
    ConditionalPatch, ObjectKey, PrimaryInstance, Resource, ResourceVersion, SecondaryInstance,
    WatchEvent, WatchEventType,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, RwLock};

const WATCH_CHANNEL_CAPACITY: usize = 1024;

type Table<R> = RwLock<HashMap<ObjectKey, R>>;

/// In-memory resource store for development and testing.
///
/// Every write takes a fresh value from a store-wide version counter and
/// publishes a `WatchEvent`.
#[derive(Debug)]
pub struct InMemoryStore {
    primaries: Table<PrimaryInstance>,
    secondaries: Table<SecondaryInstance>,
    version: AtomicU64,
    watch_tx: broadcast::Sender<WatchEvent>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create a new, empty in-memory store
    pub fn new() -> Self {
        let (watch_tx, _) = broadcast::channel(WATCH_CHANNEL_CAPACITY);
        Self {
            primaries: RwLock::new(HashMap::new()),
            secondaries: RwLock::new(HashMap::new()),
            version: AtomicU64::new(0),
            watch_tx,
        }
    }

    fn next_version(&self) -> ResourceVersion {
        ResourceVersion::new(self.version.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn notify<R: Resource>(&self, event_type: WatchEventType, key: ObjectKey, version: ResourceVersion) {
        // No subscribers is fine
        let _ = self.watch_tx.send(WatchEvent {
            event_type,
            kind: R::KIND,
            key,
            resource_version: version,
        });
    }

    async fn get<R: Resource>(&self, table: &Table<R>, key: &ObjectKey) -> Option<R> {
        table.read().await.get(key).cloned()
    }

    async fn list<R: Resource>(&self, table: &Table<R>) -> Vec<R> {
        let mut items: Vec<R> = table.read().await.values().cloned().collect();
        items.sort_by_key(|item| item.key());
        items
    }

    async fn upsert<R: Resource>(&self, table: &Table<R>, mut object: R) -> R {
        let key = object.key();
        let now = chrono::Utc::now();

        let mut objects = table.write().await;
        let event_type = match objects.get(&key) {
            Some(existing) => {
                object.metadata_mut().created_at = existing.metadata().created_at;
                WatchEventType::Modified
            }
            None => {
                object.metadata_mut().created_at = now;
                WatchEventType::Added
            }
        };

        let version = self.next_version();
        let meta = object.metadata_mut();
        meta.updated_at = now;
        meta.resource_version = version;

        objects.insert(key.clone(), object.clone());
        self.notify::<R>(event_type, key, version);

        object
    }

    async fn delete<R: Resource>(&self, table: &Table<R>, key: &ObjectKey) -> bool {
        let mut objects = table.write().await;
        match objects.remove(key) {
            Some(removed) => {
                self.notify::<R>(
                    WatchEventType::Deleted,
                    key.clone(),
                    removed.metadata().resource_version,
                );
                true
            }
            None => false,
        }
    }

    async fn patch<R: Resource>(
        &self,
        table: &Table<R>,
        key: &ObjectKey,
        patch: &ConditionalPatch,
    ) -> StoreResult<R> {
        let mut objects = table.write().await;
        let current = objects
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;

        let actual = current.metadata().resource_version;
        if actual != patch.based_on {
            return Err(StoreError::VersionConflict {
                key: key.clone(),
                expected: patch.based_on,
                actual,
            });
        }

        if patch.patch.is_empty() {
            return Ok(current.clone());
        }

        let mut patched = patch.patch.apply(current)?;

        // Identity and bookkeeping are owned by the store
        let version = self.next_version();
        let meta = patched.metadata_mut();
        meta.namespace = key.namespace.clone();
        meta.name = key.name.clone();
        meta.created_at = current.metadata().created_at;
        meta.updated_at = chrono::Utc::now();
        meta.resource_version = version;

        objects.insert(key.clone(), patched.clone());
        self.notify::<R>(WatchEventType::Modified, key.clone(), version);

        Ok(patched)
    }
}

#[async_trait]
impl PrimaryStore for InMemoryStore {
    async fn get_primary(&self, key: &ObjectKey) -> StoreResult<Option<PrimaryInstance>> {
        Ok(self.get(&self.primaries, key).await)
    }

    async fn list_primaries(&self) -> StoreResult<Vec<PrimaryInstance>> {
        Ok(self.list(&self.primaries).await)
    }

    async fn upsert_primary(&self, primary: PrimaryInstance) -> StoreResult<PrimaryInstance> {
        Ok(self.upsert(&self.primaries, primary).await)
    }

    async fn delete_primary(&self, key: &ObjectKey) -> StoreResult<bool> {
        Ok(self.delete(&self.primaries, key).await)
    }
}

#[async_trait]
impl SecondaryStore for InMemoryStore {
    async fn get_secondary(&self, key: &ObjectKey) -> StoreResult<Option<SecondaryInstance>> {
        Ok(self.get(&self.secondaries, key).await)
    }

    async fn list_secondaries(&self) -> StoreResult<Vec<SecondaryInstance>> {
        Ok(self.list(&self.secondaries).await)
    }

    async fn upsert_secondary(
        &self,
        secondary: SecondaryInstance,
    ) -> StoreResult<SecondaryInstance> {
        Ok(self.upsert(&self.secondaries, secondary).await)
    }

    async fn delete_secondary(&self, key: &ObjectKey) -> StoreResult<bool> {
        Ok(self.delete(&self.secondaries, key).await)
    }

    async fn patch_secondary(
        &self,
        key: &ObjectKey,
        patch: &ConditionalPatch,
    ) -> StoreResult<SecondaryInstance> {
        self.patch(&self.secondaries, key, patch).await
    }
}

impl WatchSource for InMemoryStore {
    fn watch(&self) -> broadcast::Receiver<WatchEvent> {
        self.watch_tx.subscribe()
    }
}
