//! Resource store trait definitions

use crate::error::StoreError;
use async_trait::async_trait;
use replisync_types::{
    ConditionalPatch, ObjectKey, PrimaryInstance, SecondaryInstance, WatchEvent,
};
use tokio::sync::broadcast;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Combined store trait
pub trait ResourceStore: PrimaryStore + SecondaryStore + WatchSource + Send + Sync {}

impl<T> ResourceStore for T where T: PrimaryStore + SecondaryStore + WatchSource + Send + Sync {}

/// Storage for primaries
#[async_trait]
pub trait PrimaryStore: Send + Sync {
    /// Get a primary by key, `None` when absent
    async fn get_primary(&self, key: &ObjectKey) -> StoreResult<Option<PrimaryInstance>>;

    /// List all primaries
    async fn list_primaries(&self) -> StoreResult<Vec<PrimaryInstance>>;

    /// Create or replace a primary, returning it with its new version
    async fn upsert_primary(&self, primary: PrimaryInstance) -> StoreResult<PrimaryInstance>;

    /// Delete a primary by key
    async fn delete_primary(&self, key: &ObjectKey) -> StoreResult<bool>;
}

/// Storage for secondaries
#[async_trait]
pub trait SecondaryStore: Send + Sync {
    /// Get a secondary by key, `None` when absent
    async fn get_secondary(&self, key: &ObjectKey) -> StoreResult<Option<SecondaryInstance>>;

    /// List all secondaries
    async fn list_secondaries(&self) -> StoreResult<Vec<SecondaryInstance>>;

    /// Create or replace a secondary, returning it with its new version
    async fn upsert_secondary(&self, secondary: SecondaryInstance)
        -> StoreResult<SecondaryInstance>;

    /// Delete a secondary by key
    async fn delete_secondary(&self, key: &ObjectKey) -> StoreResult<bool>;

    /// Apply a merge patch if the stored version still equals `patch.based_on`.
    ///
    /// Fails with `StoreError::VersionConflict` on a stale version and
    /// `StoreError::NotFound` when the object is gone.
    async fn patch_secondary(
        &self,
        key: &ObjectKey,
        patch: &ConditionalPatch,
    ) -> StoreResult<SecondaryInstance>;
}

/// Change notifications for every write
pub trait WatchSource: Send + Sync {
    fn watch(&self) -> broadcast::Receiver<WatchEvent>;
}
