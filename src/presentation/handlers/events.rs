use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::application::services::{BlobCreated, EnrichmentBatch};
use crate::domain::BlobKey;
use crate::presentation::handlers::ErrorResponse;
use crate::presentation::state::AppState;

/// One storage notification: the container it came from and the object key.
#[derive(Debug, Deserialize)]
pub struct BlobEvent {
    #[allow(dead_code)]
    pub bucket: Option<String>,
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct BlobEventsRequest {
    pub events: Vec<BlobEvent>,
}

#[derive(Serialize)]
pub struct EventsResponse {
    pub message: String,
    pub enqueued: usize,
}

/// Accepts blob-creation notifications from external storage infrastructure
/// and forwards them onto the enrichment queue. The response is informational
/// only; no caller waits on enrichment.
#[tracing::instrument(skip(state, request), fields(events = request.events.len()))]
pub async fn events_handler(
    State(state): State<AppState>,
    Json(request): Json<BlobEventsRequest>,
) -> impl IntoResponse {
    let events: Vec<BlobCreated> = request
        .events
        .into_iter()
        .map(|e| BlobCreated {
            key: BlobKey::from_raw(e.key),
        })
        .collect();
    let enqueued = events.len();

    if enqueued == 0 {
        return (
            StatusCode::ACCEPTED,
            Json(EventsResponse {
                message: "No events".to_string(),
                enqueued: 0,
            }),
        )
            .into_response();
    }

    // try_send, not send: a full queue is back-pressure the caller should
    // see, not something this handler waits out.
    let batch = EnrichmentBatch::first_delivery(events);
    if let Err(e) = state.enrichment_sender.try_send(batch) {
        tracing::error!(error = %e, "Failed to enqueue enrichment batch");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "queue_unavailable".to_string(),
                message: "Enrichment queue full or worker unavailable".to_string(),
            }),
        )
            .into_response();
    }

    (
        StatusCode::ACCEPTED,
        Json(EventsResponse {
            message: "Events enqueued".to_string(),
            enqueued,
        }),
    )
        .into_response()
}
