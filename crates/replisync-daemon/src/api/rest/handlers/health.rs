//! Health and status handlers

use crate::api::rest::state::AppState;
use crate::controller::MetricsSnapshot;
use crate::error::ApiResult;
use crate::store::{PrimaryStore, SecondaryStore};
use axum::{extract::State, Json};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
    })
}

/// Daemon status response
#[derive(Debug, Serialize)]
pub struct DaemonStatusResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub correlation_label_key: String,
    pub stats: DaemonStats,
    pub reconciles: MetricsSnapshot,
}

/// Object and queue counts
#[derive(Debug, Serialize)]
pub struct DaemonStats {
    pub total_primaries: usize,
    pub correlated_primaries: usize,
    pub total_secondaries: usize,
    pub queue_depth: usize,
}

/// Daemon status endpoint
pub async fn daemon_status(State(state): State<AppState>) -> ApiResult<Json<DaemonStatusResponse>> {
    let primaries = state.store.list_primaries().await?;
    let secondaries = state.store.list_secondaries().await?;
    let correlation = state.controller.reconciler().correlation();

    let correlated = primaries
        .iter()
        .filter(|p| correlation.lookup(&p.metadata).is_some())
        .count();

    Ok(Json(DaemonStatusResponse {
        status: "healthy".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
        started_at: state.started_at,
        correlation_label_key: correlation.key().to_string(),
        stats: DaemonStats {
            total_primaries: primaries.len(),
            correlated_primaries: correlated,
            total_secondaries: secondaries.len(),
            queue_depth: state.controller.queue().len(),
        },
        reconciles: state.controller.metrics().snapshot(),
    }))
}
