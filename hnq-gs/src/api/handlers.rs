//! HTTP request handlers

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use hnq_common::{ItemRecord, StoryId};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use super::AppState;
use crate::browse::filter_items;
use crate::game::{GameError, RoundOutcome, ServiceError, SessionView};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: String,
    module: String,
    version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Set when a session could not be started at all
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unplayable: bool,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<T, ApiError>;

/// Guess as sent by the client: a JSON number or raw text
///
/// Non-integer numbers are kept as their text so the round records what the
/// player typed; they score like any other non-integer guess.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum GuessInput {
    Number(i64),
    Float(f64),
    Text(String),
}

impl GuessInput {
    fn into_raw(self) -> String {
        match self {
            GuessInput::Number(n) => n.to_string(),
            GuessInput::Float(f) => f.to_string(),
            GuessInput::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateGuessRequest {
    guess: GuessInput,
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmitGuessRequest {
    /// Falls back to the pending guess when absent
    #[serde(default)]
    guess: Option<GuessInput>,
}

#[derive(Debug, Serialize)]
pub struct SessionCreatedResponse {
    session_id: Uuid,
    view: SessionView,
}

#[derive(Debug, Serialize)]
pub struct GuessResponse {
    outcome: RoundOutcome,
    view: SessionView,
}

#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    #[serde(default)]
    q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BrowseResponse {
    query: String,
    total_fetched: usize,
    items: Vec<ItemRecord>,
    /// Identifiers that could not be fetched
    failed_ids: Vec<StoryId>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            unplayable: false,
        }),
    )
}

/// Map service failures onto HTTP status codes
fn service_error(e: ServiceError) -> ApiError {
    match e {
        ServiceError::SessionNotFound(_) => error_response(StatusCode::NOT_FOUND, e.to_string()),
        ServiceError::Acquisition(_) | ServiceError::Game(GameError::EmptyBatch) => {
            error!("Session could not be started: {}", e);
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                    unplayable: true,
                }),
            )
        }
        ServiceError::Game(_) => error_response(StatusCode::CONFLICT, e.to_string()),
    }
}

// ============================================================================
// Health
// ============================================================================

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        module: "hnq-gs".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============================================================================
// Session Endpoints
// ============================================================================

/// POST /api/v1/sessions - acquire a batch and start playing
pub async fn create_session(
    State(state): State<AppState>,
) -> ApiResult<(StatusCode, Json<SessionCreatedResponse>)> {
    let (session_id, view) = state.game.start_session().await.map_err(service_error)?;
    Ok((
        StatusCode::CREATED,
        Json(SessionCreatedResponse { session_id, view }),
    ))
}

/// GET /api/v1/sessions/:session_id
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    let view = state.game.view(session_id).await.map_err(service_error)?;
    Ok(Json(view))
}

/// PUT /api/v1/sessions/:session_id/guess - store the in-progress guess
pub async fn update_guess(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<UpdateGuessRequest>,
) -> ApiResult<Json<SessionView>> {
    let view = state
        .game
        .update_guess(session_id, req.guess.into_raw())
        .await
        .map_err(service_error)?;
    Ok(Json(view))
}

/// POST /api/v1/sessions/:session_id/guess - score the round
///
/// An empty body submits the pending guess. A body that is present but not a
/// valid request is rejected before the round is touched.
pub async fn submit_guess(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    body: Bytes,
) -> ApiResult<Json<GuessResponse>> {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        SubmitGuessRequest::default()
    } else {
        serde_json::from_slice::<SubmitGuessRequest>(&body).map_err(|e| {
            error_response(StatusCode::BAD_REQUEST, format!("Invalid guess request: {e}"))
        })?
    };
    let raw = req.guess.map(GuessInput::into_raw);
    let (outcome, view) = state
        .game
        .submit_guess(session_id, raw)
        .await
        .map_err(service_error)?;
    Ok(Json(GuessResponse { outcome, view }))
}

/// POST /api/v1/sessions/:session_id/advance
pub async fn advance(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionView>> {
    let view = state.game.advance(session_id).await.map_err(service_error)?;
    Ok(Json(view))
}

/// DELETE /api/v1/sessions/:session_id
pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.game.discard(session_id).await.map_err(service_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Browse Endpoint
// ============================================================================

/// GET /api/v1/stories?q=term - trending stories filtered by title
///
/// Uses the settled join: stories that fail to load are listed in
/// `failed_ids` instead of failing the whole page.
pub async fn list_stories(
    State(state): State<AppState>,
    Query(query): Query<BrowseQuery>,
) -> ApiResult<Json<BrowseResponse>> {
    let batch = state
        .pipeline
        .acquire_settled(state.browse_limit)
        .await
        .map_err(|e| {
            error!("Browse acquisition failed: {}", e);
            error_response(StatusCode::BAD_GATEWAY, format!("Acquisition failed: {e}"))
        })?;

    let term = query.q.unwrap_or_default();
    let items: Vec<ItemRecord> = filter_items(&batch.items, &term)
        .into_iter()
        .cloned()
        .collect();
    info!(
        query = %term,
        fetched = batch.items.len(),
        matched = items.len(),
        "Browse request served"
    );

    Ok(Json(BrowseResponse {
        query: term,
        total_fetched: batch.items.len(),
        items,
        failed_ids: batch.failed.iter().map(|f| f.id).collect(),
    }))
}
