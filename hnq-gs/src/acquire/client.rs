//! Hacker News API client
//!
//! Two read-only endpoints are used:
//! - `{base}/{feed}.json` returns the ordered identifier list
//! - `{base}/item/{id}.json` returns one story, or `null` for unknown ids
//!
//! The [`ItemSource`] trait is the seam between the acquisition pipeline and
//! the network, so the pipeline can be driven by an in-memory source in tests.

use async_trait::async_trait;
use hnq_common::config::{Feed, HackerNewsConfig};
use hnq_common::{ItemRecord, StoryId};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const USER_AGENT: &str = concat!("hnq-gs/", env!("CARGO_PKG_VERSION"));

/// Acquisition failure
///
/// Any single failure is fatal to the batch it occurred in; nothing here is
/// retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    /// The API answered `null`: deleted or never existed
    #[error("Item not found: {0}")]
    ItemNotFound(StoryId),

    /// The record cannot be played without this field
    #[error("Item {id} is missing required field '{field}'")]
    MissingField { id: StoryId, field: &'static str },
}

/// Source of identifier lists and item records
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Full ordered identifier list, freshest first
    async fn story_ids(&self) -> Result<Vec<StoryId>, FetchFailure>;

    /// Materialize one record
    async fn item(&self, id: StoryId) -> Result<ItemRecord, FetchFailure>;
}

/// Item as served by the API; every field may be absent on dead or
/// deleted stories
#[derive(Debug, Deserialize)]
struct RawItem {
    id: Option<u64>,
    title: Option<String>,
    score: Option<u64>,
    url: Option<String>,
}

impl RawItem {
    /// Validate into a playable record
    fn into_record(self, requested: StoryId) -> Result<ItemRecord, FetchFailure> {
        let id = self.id.map(StoryId).unwrap_or(requested);
        if id != requested {
            return Err(FetchFailure::Parse(format!(
                "requested item {} but received {}",
                requested, id
            )));
        }

        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or(FetchFailure::MissingField { id, field: "title" })?;
        let score = self
            .score
            .ok_or(FetchFailure::MissingField { id, field: "score" })?;

        Ok(ItemRecord {
            id,
            title,
            score,
            url: self.url.filter(|u| !u.is_empty()),
        })
    }
}

/// Decode an item response body
fn decode_item(body: &str, requested: StoryId) -> Result<ItemRecord, FetchFailure> {
    let raw: Option<RawItem> =
        serde_json::from_str(body).map_err(|e| FetchFailure::Parse(e.to_string()))?;

    raw.ok_or(FetchFailure::ItemNotFound(requested))?
        .into_record(requested)
}

/// Hacker News API client
pub struct HackerNewsClient {
    http_client: reqwest::Client,
    base_url: String,
    feed: Feed,
}

impl HackerNewsClient {
    pub fn new(config: &HackerNewsConfig) -> Result<Self, FetchFailure> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FetchFailure::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            feed: config.feed,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET a URL and return the body of a successful response
    async fn get_text(&self, url: &str) -> Result<String, FetchFailure> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchFailure::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(FetchFailure::Api(status.as_u16(), error_text));
        }

        response
            .text()
            .await
            .map_err(|e| FetchFailure::Network(e.to_string()))
    }
}

#[async_trait]
impl ItemSource for HackerNewsClient {
    async fn story_ids(&self) -> Result<Vec<StoryId>, FetchFailure> {
        let url = format!("{}/{}", self.base_url, self.feed.endpoint());
        tracing::debug!(url = %url, "Fetching story identifier list");

        let body = self.get_text(&url).await?;
        let ids: Vec<StoryId> =
            serde_json::from_str(&body).map_err(|e| FetchFailure::Parse(e.to_string()))?;

        tracing::debug!(count = ids.len(), "Retrieved story identifiers");
        Ok(ids)
    }

    async fn item(&self, id: StoryId) -> Result<ItemRecord, FetchFailure> {
        let url = format!("{}/item/{}.json", self.base_url, id);
        tracing::trace!(item_id = %id, url = %url, "Fetching item");

        let body = self.get_text(&url).await?;
        decode_item(&body, id)
    }
}
