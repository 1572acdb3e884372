//! Server-Sent Events endpoint

use axum::{
    extract::{Query, State},
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use serde::Deserialize;
use std::convert::Infallible;
use uuid::Uuid;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Only stream events of this session
    #[serde(default)]
    session_id: Option<Uuid>,
}

/// GET /api/v1/events - SSE event stream
pub async fn event_stream(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    hnq_common::sse::create_event_sse_stream(state.events.subscribe(), query.session_id)
}
