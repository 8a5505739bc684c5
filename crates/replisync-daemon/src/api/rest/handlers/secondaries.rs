//! Secondary resource handlers

use super::primaries::{object_key, DeleteResponse};
use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::store::SecondaryStore;
use axum::{
    extract::{Path, State},
    Json,
};
use replisync_types::{ObjectMeta, SecondaryInstance, SecondarySpec};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Create or replace secondary request
#[derive(Debug, Deserialize)]
pub struct PutSecondaryRequest {
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub size: u32,
}

/// List all secondaries
pub async fn list_secondaries(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<SecondaryInstance>>> {
    Ok(Json(state.store.list_secondaries().await?))
}

/// Get a specific secondary
pub async fn get_secondary(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> ApiResult<Json<SecondaryInstance>> {
    let key = object_key(namespace, name)?;
    let secondary = state
        .store
        .get_secondary(&key)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Secondary {} not found", key)))?;

    Ok(Json(secondary))
}

/// Create or replace a secondary.
///
/// Direct edits are not watched; the next resync reconciles them.
pub async fn put_secondary(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
    Json(request): Json<PutSecondaryRequest>,
) -> ApiResult<Json<SecondaryInstance>> {
    let key = object_key(namespace, name)?;

    let mut metadata = ObjectMeta::new(&key);
    metadata.labels = request.labels;

    let stored = state
        .store
        .upsert_secondary(SecondaryInstance {
            metadata,
            spec: SecondarySpec { size: request.size },
        })
        .await?;

    tracing::info!(
        secondary = %key,
        size = stored.spec.size,
        version = %stored.metadata.resource_version,
        "Stored secondary"
    );

    Ok(Json(stored))
}

/// Delete a secondary
pub async fn delete_secondary(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
) -> ApiResult<Json<DeleteResponse>> {
    let key = object_key(namespace, name)?;
    let deleted = state.store.delete_secondary(&key).await?;

    if deleted {
        tracing::info!(secondary = %key, "Deleted secondary");
    }

    Ok(Json(DeleteResponse { deleted }))
}
