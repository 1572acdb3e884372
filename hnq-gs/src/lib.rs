//! # HNQ Game Server Library (hnq-gs)
//!
//! Trending-story trivia: acquire a batch of Hacker News stories, then let
//! players guess each story's score.
//!
//! - `acquire`: HN API client and the ordered, all-or-nothing batch pipeline
//! - `game`: scoring, the session state machine and session lifecycle
//! - `browse`: title search over a fetched batch
//! - `api`: axum router, handlers and SSE

pub mod acquire;
pub mod api;
pub mod browse;
pub mod game;

pub use api::{build_router, AppState};
