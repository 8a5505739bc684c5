//! Primary resource handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::store::PrimaryStore;
use axum::{
    extract::{Path, State},
    Json,
};
use replisync_types::{ObjectKey, ObjectMeta, PrimaryInstance, PrimarySpec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Create or replace primary request
#[derive(Debug, Deserialize)]
pub struct PutPrimaryRequest {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub replicas: u32,
}

/// Delete response
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub deleted: bool,
}

/// Reconcile trigger response
#[derive(Debug, Serialize, Deserialize)]
pub struct ReconcileTriggerResponse {
    pub key: String,
    pub queued: bool,
}

pub(crate) fn object_key(namespace: String, name: String) -> ApiResult<ObjectKey> {
    if namespace.is_empty() || name.is_empty() {
        return Err(ApiError::BadRequest(
            "namespace and name must not be empty".to_string(),
        ));
    }
    Ok(ObjectKey::new(namespace, name))
}

/// List all primaries
pub async fn list_primaries(State(state): State<AppState>) -> ApiResult<Json<Vec<PrimaryInstance>>> {
    Ok(Json(state.store.list_primaries().await?))
}

/// Get a specific primary
pub async fn get_primary(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> ApiResult<Json<PrimaryInstance>> {
    let key = object_key(namespace, name)?;
    let primary = state
        .store
        .get_primary(&key)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Primary {} not found", key)))?;

    Ok(Json(primary))
}

/// Create or replace a primary
pub async fn put_primary(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
    Json(request): Json<PutPrimaryRequest>,
) -> ApiResult<Json<PrimaryInstance>> {
    let key = object_key(namespace, name)?;

    let mut metadata = ObjectMeta::new(&key);
    metadata.labels = request.labels;

    let stored = state
        .store
        .upsert_primary(PrimaryInstance {
            metadata,
            spec: PrimarySpec {
                replicas: request.replicas,
            },
        })
        .await?;

    tracing::info!(
        primary = %key,
        replicas = stored.spec.replicas,
        version = %stored.metadata.resource_version,
        "Stored primary"
    );

    Ok(Json(stored))
}

/// Delete a primary
pub async fn delete_primary(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> ApiResult<Json<DeleteResponse>> {
    let key = object_key(namespace, name)?;
    let deleted = state.store.delete_primary(&key).await?;

    if deleted {
        tracing::info!(primary = %key, "Deleted primary");
    }

    Ok(Json(DeleteResponse { deleted }))
}

/// Queue a reconcile of one primary
pub async fn reconcile_primary(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> ApiResult<Json<ReconcileTriggerResponse>> {
    let key = object_key(namespace, name)?;
    state.controller.enqueue(key.clone());

    Ok(Json(ReconcileTriggerResponse {
        key: key.to_string(),
        queued: !state.controller.queue().is_shutting_down(),
    }))
}
