//! Batch acquisition pipeline
//!
//! Turns the upstream identifier list into an ordered batch of records:
//! 1. Fetch the identifier list and keep its first `limit` entries as given
//!    (no sorting, no deduplication)
//! 2. Fan out one item fetch per retained identifier, concurrently
//! 3. Fan the results back in, in request order
//!
//! [`AcquisitionPipeline::acquire`] is all-or-nothing: one failed item fails
//! the batch, and the outstanding fetches are dropped with it.
//! [`AcquisitionPipeline::acquire_settled`] keeps the successes instead and
//! reports which identifiers failed; only the browse view uses it.

use futures::future::{join_all, try_join_all};
use futures::stream::{self, StreamExt, TryStreamExt};
use futures::TryFutureExt;
use hnq_common::{ItemRecord, StoryId};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::client::{FetchFailure, ItemSource};

/// An identifier whose fetch failed in a settled batch
#[derive(Debug, Clone, PartialEq)]
pub struct FailedItem {
    pub id: StoryId,
    pub error: FetchFailure,
}

/// Outcome of a settled (partial-success) acquisition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettledBatch {
    /// Successful records, in request order
    pub items: Vec<ItemRecord>,
    /// Failed identifiers, in request order
    pub failed: Vec<FailedItem>,
}

/// Keep the leading `limit` identifiers in their given order
pub fn retain_prefix(mut ids: Vec<StoryId>, limit: NonZeroUsize) -> Vec<StoryId> {
    ids.truncate(limit.get());
    ids
}

/// Fan-out/fan-in acquisition over an [`ItemSource`]
#[derive(Clone)]
pub struct AcquisitionPipeline {
    source: Arc<dyn ItemSource>,
    max_in_flight: Option<NonZeroUsize>,
}

impl AcquisitionPipeline {
    /// Create a pipeline; `max_in_flight = None` starts every fetch at once
    pub fn new(source: Arc<dyn ItemSource>, max_in_flight: Option<NonZeroUsize>) -> Self {
        Self {
            source,
            max_in_flight,
        }
    }

    async fn retained_ids(&self, limit: NonZeroUsize) -> Result<Vec<StoryId>, FetchFailure> {
        let ids = self
            .source
            .story_ids()
            .await
            .inspect_err(|e| warn!(error = %e, "Identifier list fetch failed"))?;
        let available = ids.len();
        let ids = retain_prefix(ids, limit);
        debug!(available, retained = ids.len(), "Retained identifier prefix");
        Ok(ids)
    }

    /// Materialize the first `limit` stories, all-or-nothing
    ///
    /// Element `i` of the result corresponds to identifier `i` of the retained
    /// prefix, regardless of completion order.
    pub async fn acquire(&self, limit: NonZeroUsize) -> Result<Vec<ItemRecord>, FetchFailure> {
        let started = Instant::now();
        let ids = self.retained_ids(limit).await?;

        let fetches = ids.into_iter().map(|id| {
            self.source.item(id).inspect_err(move |e| {
                warn!(item_id = %id, error = %e, "Item fetch failed, aborting batch")
            })
        });

        let items: Vec<ItemRecord> = match self.max_in_flight {
            None => try_join_all(fetches).await?,
            Some(n) => stream::iter(fetches).buffered(n.get()).try_collect().await?,
        };

        info!(
            count = items.len(),
            elapsed = ?started.elapsed(),
            "Acquired item batch"
        );
        Ok(items)
    }

    /// Materialize the first `limit` stories, keeping whatever succeeded
    ///
    /// Only the identifier list itself is fatal here.
    pub async fn acquire_settled(&self, limit: NonZeroUsize) -> Result<SettledBatch, FetchFailure> {
        let started = Instant::now();
        let ids = self.retained_ids(limit).await?;

        let fetches = ids
            .into_iter()
            .map(|id| async move { (id, self.source.item(id).await) });

        let results: Vec<(StoryId, Result<ItemRecord, FetchFailure>)> = match self.max_in_flight {
            None => join_all(fetches).await,
            Some(n) => stream::iter(fetches).buffered(n.get()).collect().await,
        };

        let mut batch = SettledBatch::default();
        for (id, result) in results {
            match result {
                Ok(item) => batch.items.push(item),
                Err(error) => {
                    warn!(item_id = %id, error = %error, "Item fetch failed, skipping");
                    batch.failed.push(FailedItem { id, error });
                }
            }
        }

        info!(
            count = batch.items.len(),
            failed = batch.failed.len(),
            elapsed = ?started.elapsed(),
            "Acquired settled item batch"
        );
        Ok(batch)
    }
}
