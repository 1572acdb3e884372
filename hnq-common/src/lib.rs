//! # HNQ Common Library
//!
//! Shared code for the HNQ game server and its clients:
//! - Item data model (story identifiers and materialized records)
//! - Event types and the EventBus
//! - Configuration loading
//! - Error types
//! - SSE helpers

pub mod config;
pub mod error;
pub mod events;
pub mod item;
pub mod sse;

pub use error::{Error, Result};
pub use item::{ItemRecord, StoryId};
