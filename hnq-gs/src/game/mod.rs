//! Guessing game engine
//!
//! - `scoring`: the pure difference-to-points tier table
//! - `session`: the per-player state machine
//! - `registry`: live sessions, one lock per session
//! - `service`: session lifecycle wired to acquisition and events

pub mod registry;
pub mod scoring;
pub mod service;
pub mod session;

pub use registry::{SessionHandle, SessionRegistry};
pub use scoring::score_for;
pub use service::{GameService, ServiceError};
pub use session::{
    Advance, GameError, GameSession, RoundOutcome, RoundPhase, RoundState, SessionState,
    SessionStatus, SessionView,
};
