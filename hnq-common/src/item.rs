//! Item data model
//!
//! An [`ItemRecord`] is the materialized unit of content: one trending story
//! with the score the player has to guess. Records are created once during
//! acquisition and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a remote story
///
/// The upstream API uses integers, but callers must treat the value as a
/// token: it is only compared, printed and sent back to the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoryId(pub u64);

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for StoryId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// One materialized trending story
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Story identifier, unique within one fetched batch
    pub id: StoryId,
    /// Display title
    pub title: String,
    /// Popularity metric the player guesses
    pub score: u64,
    /// External link; stories without one are still playable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ItemRecord {
    pub fn new(id: impl Into<StoryId>, title: impl Into<String>, score: u64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            score,
            url: None,
        }
    }

    /// Attach an external link
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Whether the presentation layer can offer an "open" affordance
    pub fn has_link(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.is_empty())
    }
}
