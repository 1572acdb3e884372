//! REST API for the game server
//!
//! Sessions are created, played and discarded over JSON endpoints; game
//! events are streamed over SSE.

pub mod handlers;
pub mod sse;

use axum::{
    routing::{get, post},
    Router,
};
use hnq_common::events::EventBus;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::acquire::AcquisitionPipeline;
use crate::game::GameService;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub game: Arc<GameService>,
    /// Pipeline used by the browse view
    pub pipeline: AcquisitionPipeline,
    pub browse_limit: NonZeroUsize,
    pub events: Arc<EventBus>,
}

impl AppState {
    pub fn new(
        pipeline: AcquisitionPipeline,
        events: Arc<EventBus>,
        game_limit: NonZeroUsize,
        browse_limit: NonZeroUsize,
    ) -> Self {
        let game = Arc::new(GameService::new(
            pipeline.clone(),
            Arc::clone(&events),
            game_limit,
        ));
        Self {
            game,
            pipeline,
            browse_limit,
            events,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .nest(
            "/api/v1",
            Router::new()
                // Game sessions
                .route("/sessions", post(handlers::create_session))
                .route(
                    "/sessions/:session_id",
                    get(handlers::get_session).delete(handlers::delete_session),
                )
                .route(
                    "/sessions/:session_id/guess",
                    post(handlers::submit_guess).put(handlers::update_guess),
                )
                .route("/sessions/:session_id/advance", post(handlers::advance))
                // Browse view
                .route("/stories", get(handlers::list_stories))
                // SSE events
                .route("/events", get(sse::event_stream)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
