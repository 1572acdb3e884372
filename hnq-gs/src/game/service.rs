//! Game service: ties acquisition, sessions and events together
//!
//! Starting a session holds it as `Loading` while the strict acquisition
//! pipeline runs, and registers it only once play has begun. A failed or
//! abandoned start leaves nothing behind in the registry.

use hnq_common::events::{EventBus, GameEvent};
use std::num::NonZeroUsize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use super::registry::{SessionHandle, SessionRegistry};
use super::session::{Advance, GameError, GameSession, RoundOutcome, SessionView};
use crate::acquire::{AcquisitionPipeline, FetchFailure};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Acquisition failed: {0}")]
    Acquisition(#[from] FetchFailure),

    #[error(transparent)]
    Game(#[from] GameError),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

pub struct GameService {
    registry: SessionRegistry,
    pipeline: AcquisitionPipeline,
    events: Arc<EventBus>,
    item_limit: NonZeroUsize,
}

impl GameService {
    pub fn new(
        pipeline: AcquisitionPipeline,
        events: Arc<EventBus>,
        item_limit: NonZeroUsize,
    ) -> Self {
        Self {
            registry: SessionRegistry::new(),
            pipeline,
            events,
            item_limit,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Acquire a batch and start a session over it
    pub async fn start_session(&self) -> ServiceResult<(Uuid, SessionView)> {
        let session_id = Uuid::new_v4();
        let mut session = GameSession::loading();
        info!(session_id = %session_id, limit = self.item_limit.get(), "Session loading");

        let items = match self.pipeline.acquire(self.item_limit).await {
            Ok(items) => items,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Session unplayable, acquisition failed");
                self.events.emit_lossy(GameEvent::AcquisitionFailed {
                    session_id,
                    reason: e.to_string(),
                    timestamp: chrono::Utc::now(),
                });
                return Err(e.into());
            }
        };

        session.begin(items).inspect_err(
            |e| warn!(session_id = %session_id, error = %e, "Session unplayable"),
        )?;

        let total_items = session.items().len();
        let view = session.view();
        self.registry.insert(session_id, session).await;

        info!(session_id = %session_id, total_items, "Session started");
        self.events.emit_lossy(GameEvent::SessionStarted {
            session_id,
            total_items,
            timestamp: chrono::Utc::now(),
        });
        Ok((session_id, view))
    }

    async fn handle(&self, session_id: Uuid) -> ServiceResult<SessionHandle> {
        self.registry
            .get(&session_id)
            .await
            .ok_or(ServiceError::SessionNotFound(session_id))
    }

    pub async fn view(&self, session_id: Uuid) -> ServiceResult<SessionView> {
        let handle = self.handle(session_id).await?;
        let session = handle.lock().await;
        Ok(session.view())
    }

    pub async fn update_guess(&self, session_id: Uuid, raw: String) -> ServiceResult<SessionView> {
        let handle = self.handle(session_id).await?;
        let mut session = handle.lock().await;
        session.update_guess(raw)?;
        Ok(session.view())
    }

    pub async fn submit_guess(
        &self,
        session_id: Uuid,
        raw: Option<String>,
    ) -> ServiceResult<(RoundOutcome, SessionView)> {
        let handle = self.handle(session_id).await?;
        let mut session = handle.lock().await;
        let outcome = session.submit_guess(raw.as_deref())?;

        info!(
            session_id = %session_id,
            cursor = outcome.cursor,
            item_id = %outcome.item_id,
            guess = ?outcome.guess,
            actual = outcome.actual_score,
            points = outcome.points,
            "Guess scored"
        );
        self.events.emit_lossy(GameEvent::GuessScored {
            session_id,
            cursor: outcome.cursor,
            item_id: outcome.item_id,
            points: outcome.points,
            cumulative_score: session.cumulative_score(),
            timestamp: chrono::Utc::now(),
        });
        Ok((outcome, session.view()))
    }

    pub async fn advance(&self, session_id: Uuid) -> ServiceResult<SessionView> {
        let handle = self.handle(session_id).await?;
        let mut session = handle.lock().await;

        let event = match session.advance()? {
            Advance::NextRound { cursor } => GameEvent::RoundAdvanced {
                session_id,
                cursor,
                timestamp: chrono::Utc::now(),
            },
            Advance::Finished { final_score } => {
                info!(session_id = %session_id, final_score, "Session finished");
                GameEvent::SessionFinished {
                    session_id,
                    final_score,
                    timestamp: chrono::Utc::now(),
                }
            }
        };
        self.events.emit_lossy(event);
        Ok(session.view())
    }

    pub async fn discard(&self, session_id: Uuid) -> ServiceResult<()> {
        if self.registry.remove(&session_id).await {
            info!(session_id = %session_id, "Session discarded");
            Ok(())
        } else {
            Err(ServiceError::SessionNotFound(session_id))
        }
    }
}
