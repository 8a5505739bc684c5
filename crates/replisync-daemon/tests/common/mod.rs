//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use replisync_daemon::error::StoreError;
use replisync_daemon::store::{
    InMemoryStore, PrimaryStore, SecondaryStore, StoreResult, WatchSource,
};
use replisync_types::{
    ConditionalPatch, ObjectKey, PrimaryInstance, SecondaryInstance, WatchEvent,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::broadcast;

pub const LABEL: &str = "sync-key";

/// In-memory store that counts calls and injects failures
#[derive(Default)]
pub struct InstrumentedStore {
    pub inner: InMemoryStore,
    pub primary_gets: AtomicUsize,
    pub secondary_gets: AtomicUsize,
    pub patches: AtomicUsize,
    /// Next primary read fails with this error
    pub fail_primary_get: Mutex<Option<StoreError>>,
    /// Next secondary read fails with this error
    pub fail_secondary_get: Mutex<Option<StoreError>>,
    /// Next patch fails with this error before reaching the store
    pub fail_patch: Mutex<Option<StoreError>>,
    /// Next patch is preceded by a concurrent write to the same secondary
    pub race_next_patch: AtomicBool,
}

impl InstrumentedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn patch_count(&self) -> usize {
        self.patches.load(Ordering::SeqCst)
    }

    pub fn secondary_get_count(&self) -> usize {
        self.secondary_gets.load(Ordering::SeqCst)
    }

    pub fn fail_next_primary_get(&self, err: StoreError) {
        *self.fail_primary_get.lock().unwrap() = Some(err);
    }

    pub fn fail_next_secondary_get(&self, err: StoreError) {
        *self.fail_secondary_get.lock().unwrap() = Some(err);
    }

    pub fn fail_next_patch(&self, err: StoreError) {
        *self.fail_patch.lock().unwrap() = Some(err);
    }

    pub fn race_next_patch(&self) {
        self.race_next_patch.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl PrimaryStore for InstrumentedStore {
    async fn get_primary(&self, key: &ObjectKey) -> StoreResult<Option<PrimaryInstance>> {
        self.primary_gets.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail_primary_get.lock().unwrap().take() {
            return Err(err);
        }
        self.inner.get_primary(key).await
    }

    async fn list_primaries(&self) -> StoreResult<Vec<PrimaryInstance>> {
        self.inner.list_primaries().await
    }

    async fn upsert_primary(&self, primary: PrimaryInstance) -> StoreResult<PrimaryInstance> {
        self.inner.upsert_primary(primary).await
    }

    async fn delete_primary(&self, key: &ObjectKey) -> StoreResult<bool> {
        self.inner.delete_primary(key).await
    }
}

#[async_trait]
impl SecondaryStore for InstrumentedStore {
    async fn get_secondary(&self, key: &ObjectKey) -> StoreResult<Option<SecondaryInstance>> {
        self.secondary_gets.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.fail_secondary_get.lock().unwrap().take() {
            return Err(err);
        }
        self.inner.get_secondary(key).await
    }

    async fn list_secondaries(&self) -> StoreResult<Vec<SecondaryInstance>> {
        self.inner.list_secondaries().await
    }

    async fn upsert_secondary(
        &self,
        secondary: SecondaryInstance,
    ) -> StoreResult<SecondaryInstance> {
        self.inner.upsert_secondary(secondary).await
    }

    async fn delete_secondary(&self, key: &ObjectKey) -> StoreResult<bool> {
        self.inner.delete_secondary(key).await
    }

    async fn patch_secondary(
        &self,
        key: &ObjectKey,
        patch: &ConditionalPatch,
    ) -> StoreResult<SecondaryInstance> {
        self.patches.fetch_add(1, Ordering::SeqCst);

        if let Some(err) = self.fail_patch.lock().unwrap().take() {
            return Err(err);
        }

        if self.race_next_patch.swap(false, Ordering::SeqCst) {
            if let Some(current) = self.inner.get_secondary(key).await? {
                self.inner.upsert_secondary(current).await?;
            }
        }

        self.inner.patch_secondary(key, patch).await
    }
}

impl WatchSource for InstrumentedStore {
    fn watch(&self) -> broadcast::Receiver<WatchEvent> {
        self.inner.watch()
    }
}

pub fn key(name: &str) -> ObjectKey {
    ObjectKey::new("ns", name)
}

pub fn labeled_primary(name: &str, replicas: u32, secondary: &str) -> PrimaryInstance {
    PrimaryInstance::new(&key(name), replicas).with_label(LABEL, secondary)
}

pub fn secondary(name: &str, size: u32) -> SecondaryInstance {
    SecondaryInstance::new(&key(name), size)
}
