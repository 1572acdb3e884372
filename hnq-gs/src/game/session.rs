//! Guessing game session state machine
//!
//! A session walks an immutable batch of items one round at a time:
//!
//! ```text
//! Loading --begin--> Playing{cursor, AwaitingGuess} --submit_guess--> Playing{cursor, Revealed}
//!                         ^                                                   |
//!                         +------------------advance (more items)-------------+
//!                                                                             |
//!                                              Finished{final_score} <--advance (last item)
//! ```
//!
//! All round state lives in [`SessionState`], so a revealed round always
//! carries the outcome that was applied to the score, and a finished session
//! has no cursor at all. Points are applied exactly once per round: a second
//! `submit_guess` in a revealed round is rejected without touching the score.

use hnq_common::{ItemRecord, StoryId};
use serde::Serialize;
use thiserror::Error;

use super::scoring::{difference, parse_guess, points_for_difference};

/// Illegal transition for the current session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("Session is still loading")]
    Loading,

    #[error("Session already started")]
    AlreadyStarted,

    #[error("Cannot start a session without items")]
    EmptyBatch,

    #[error("Round already revealed")]
    AlreadyRevealed,

    #[error("Round not revealed yet")]
    NotRevealed,

    #[error("Session is finished")]
    Finished,
}

/// Result of scoring one round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundOutcome {
    /// Round position within the session
    pub cursor: usize,
    pub item_id: StoryId,
    /// Input as the player entered it
    pub raw_guess: String,
    /// Parsed guess; `None` when the input was not an integer
    pub guess: Option<i64>,
    pub actual_score: u64,
    /// Distance to the actual score; `None` for invalid input
    pub difference: Option<u64>,
    pub points: u32,
}

/// Sub-state of the round at the cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundState {
    AwaitingGuess { pending_guess: Option<String> },
    Revealed { outcome: RoundOutcome },
}

/// Session lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Acquisition still in flight
    Loading,
    Playing { cursor: usize, round: RoundState },
    Finished { final_score: u64 },
}

/// What `advance` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    NextRound { cursor: usize },
    Finished { final_score: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Loading,
    Playing,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    AwaitingGuess,
    Revealed,
}

/// Item as shown to the player; the score stays hidden until the reveal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemView {
    pub id: StoryId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u64>,
}

impl ItemView {
    fn new(item: &ItemRecord, reveal: bool) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            url: item.url.clone().filter(|_| item.has_link()),
            score: reveal.then_some(item.score),
        }
    }
}

/// Read-only snapshot for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub status: SessionStatus,
    pub loading: bool,
    pub current_item: Option<ItemView>,
    pub round_state: Option<RoundPhase>,
    pub pending_guess: Option<String>,
    pub last_outcome: Option<RoundOutcome>,
    pub cumulative_score: u64,
    pub cursor: usize,
    pub total_items: usize,
    pub final_score: Option<u64>,
    pub history: Vec<RoundOutcome>,
}

/// One player's game over one acquired batch
#[derive(Debug, Clone)]
pub struct GameSession {
    items: Vec<ItemRecord>,
    cumulative_score: u64,
    history: Vec<RoundOutcome>,
    state: SessionState,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::loading()
    }
}

impl GameSession {
    /// Session waiting for its batch
    pub fn loading() -> Self {
        Self {
            items: Vec::new(),
            cumulative_score: 0,
            history: Vec::new(),
            state: SessionState::Loading,
        }
    }

    /// Session ready for its first guess
    pub fn new(items: Vec<ItemRecord>) -> Result<Self, GameError> {
        let mut session = Self::loading();
        session.begin(items)?;
        Ok(session)
    }

    /// Loading -> Playing at cursor 0
    pub fn begin(&mut self, items: Vec<ItemRecord>) -> Result<(), GameError> {
        if !matches!(self.state, SessionState::Loading) {
            return Err(GameError::AlreadyStarted);
        }
        if items.is_empty() {
            return Err(GameError::EmptyBatch);
        }

        self.items = items;
        self.state = SessionState::Playing {
            cursor: 0,
            round: RoundState::AwaitingGuess {
                pending_guess: None,
            },
        };
        Ok(())
    }

    fn playing_round(&mut self) -> Result<(usize, &mut RoundState), GameError> {
        match &mut self.state {
            SessionState::Loading => Err(GameError::Loading),
            SessionState::Finished { .. } => Err(GameError::Finished),
            SessionState::Playing { cursor, round } => Ok((*cursor, round)),
        }
    }

    /// Store the in-progress guess; no scoring side effect
    pub fn update_guess(&mut self, raw: impl Into<String>) -> Result<(), GameError> {
        let (_, round) = self.playing_round()?;
        match round {
            RoundState::AwaitingGuess { pending_guess } => {
                *pending_guess = Some(raw.into());
                Ok(())
            }
            RoundState::Revealed { .. } => Err(GameError::AlreadyRevealed),
        }
    }

    /// Score the round and reveal it
    ///
    /// `raw = None` submits the pending guess. Input that is not an integer
    /// scores zero rather than failing.
    pub fn submit_guess(&mut self, raw: Option<&str>) -> Result<RoundOutcome, GameError> {
        let (cursor, round) = match &mut self.state {
            SessionState::Loading => return Err(GameError::Loading),
            SessionState::Finished { .. } => return Err(GameError::Finished),
            SessionState::Playing { cursor, round } => (*cursor, round),
        };
        let RoundState::AwaitingGuess { pending_guess } = &mut *round else {
            return Err(GameError::AlreadyRevealed);
        };

        let raw_guess = raw
            .map(str::to_string)
            .or_else(|| pending_guess.take())
            .unwrap_or_default();
        let item = &self.items[cursor];
        let guess = parse_guess(&raw_guess);
        let diff = guess.map(|g| difference(g, item.score));
        let points = diff.map_or(0, points_for_difference);

        let outcome = RoundOutcome {
            cursor,
            item_id: item.id,
            raw_guess,
            guess,
            actual_score: item.score,
            difference: diff,
            points,
        };

        self.cumulative_score = self.cumulative_score.saturating_add(u64::from(points));
        self.history.push(outcome.clone());
        *round = RoundState::Revealed {
            outcome: outcome.clone(),
        };
        Ok(outcome)
    }

    /// Move past a revealed round, finishing after the last item
    pub fn advance(&mut self) -> Result<Advance, GameError> {
        let total = self.items.len();
        let (cursor, round) = self.playing_round()?;
        if !matches!(round, RoundState::Revealed { .. }) {
            return Err(GameError::NotRevealed);
        }

        if cursor + 1 < total {
            let next = cursor + 1;
            self.state = SessionState::Playing {
                cursor: next,
                round: RoundState::AwaitingGuess {
                    pending_guess: None,
                },
            };
            Ok(Advance::NextRound { cursor: next })
        } else {
            let final_score = self.cumulative_score;
            self.state = SessionState::Finished { final_score };
            Ok(Advance::Finished { final_score })
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn items(&self) -> &[ItemRecord] {
        &self.items
    }

    pub fn cumulative_score(&self) -> u64 {
        self.cumulative_score
    }

    pub fn history(&self) -> &[RoundOutcome] {
        &self.history
    }

    /// Cursor of the current round; after the last round, the number of items
    pub fn cursor(&self) -> usize {
        match &self.state {
            SessionState::Loading => 0,
            SessionState::Playing { cursor, .. } => *cursor,
            SessionState::Finished { .. } => self.items.len(),
        }
    }

    pub fn current_item(&self) -> Option<&ItemRecord> {
        match &self.state {
            SessionState::Playing { cursor, .. } => self.items.get(*cursor),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, SessionState::Finished { .. })
    }

    pub fn final_score(&self) -> Option<u64> {
        match self.state {
            SessionState::Finished { final_score } => Some(final_score),
            _ => None,
        }
    }

    pub fn view(&self) -> SessionView {
        let (status, current_item, round_state, pending_guess, last_outcome) = match &self.state {
            SessionState::Loading => (SessionStatus::Loading, None, None, None, None),
            SessionState::Playing { cursor, round } => {
                let item = &self.items[*cursor];
                match round {
                    RoundState::AwaitingGuess { pending_guess } => (
                        SessionStatus::Playing,
                        Some(ItemView::new(item, false)),
                        Some(RoundPhase::AwaitingGuess),
                        pending_guess.clone(),
                        None,
                    ),
                    RoundState::Revealed { outcome } => (
                        SessionStatus::Playing,
                        Some(ItemView::new(item, true)),
                        Some(RoundPhase::Revealed),
                        None,
                        Some(outcome.clone()),
                    ),
                }
            }
            SessionState::Finished { .. } => (
                SessionStatus::Finished,
                None,
                None,
                None,
                self.history.last().cloned(),
            ),
        };

        SessionView {
            status,
            loading: status == SessionStatus::Loading,
            current_item,
            round_state,
            pending_guess,
            last_outcome,
            cumulative_score: self.cumulative_score,
            cursor: self.cursor(),
            total_items: self.items.len(),
            final_score: self.final_score(),
            history: self.history.clone(),
        }
    }
}
