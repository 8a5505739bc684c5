//! Sync event handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures_util::stream::{self, Stream};
use replisync_types::{ObjectKey, SyncEventEnvelope};
use serde::Deserialize;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

/// Get events query params
#[derive(Debug, Deserialize)]
pub struct GetEventsQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Only events about this primary, as `namespace/name`
    pub primary: Option<String>,
}

fn default_limit() -> usize {
    100
}

/// Get recent sync events, oldest first
pub async fn get_events(
    State(state): State<AppState>,
    Query(query): Query<GetEventsQuery>,
) -> ApiResult<Json<Vec<SyncEventEnvelope>>> {
    let events = match query.primary {
        None => state.controller.events().recent(query.limit).await,
        Some(primary) => {
            let primary: ObjectKey = primary
                .parse()
                .map_err(|e| ApiError::BadRequest(format!("Invalid primary filter: {}", e)))?;

            let mut matching: Vec<SyncEventEnvelope> = state
                .controller
                .events()
                .recent(usize::MAX)
                .await
                .into_iter()
                .filter(|envelope| envelope.event.primary() == &primary)
                .collect();
            let start = matching.len().saturating_sub(query.limit);
            matching.drain(..start);
            matching
        }
    };

    Ok(Json(events))
}

/// Stream sync events via SSE
pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.controller.events().subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        match rx.recv().await {
            Ok(event) => {
                let json = serde_json::to_string(&event).unwrap_or_default();
                Some((Ok(Event::default().data(json)), rx))
            }
            Err(RecvError::Lagged(_)) => Some((Ok(Event::default().comment("lagged")), rx)),
            Err(RecvError::Closed) => None,
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}
