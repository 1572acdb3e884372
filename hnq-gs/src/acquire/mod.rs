//! Batch acquisition: the HN client and the fan-out/fan-in pipeline over it

pub mod client;
pub mod pipeline;

pub use client::{FetchFailure, HackerNewsClient, ItemSource};
pub use pipeline::{AcquisitionPipeline, FailedItem, SettledBatch};
