pub mod mock;
pub mod supabase;
pub mod types;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use types::{EventRow, PlaceRow};

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("JSON parsing failed: {0}")]
    JsonParsing(#[from] serde_json::Error),
    #[error("Rate limited, retry after: {0}s")]
    RateLimited(u64),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Provider unavailable: {0}")]
    Unavailable(String),
}

/// Source of place and event records.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Every place in the catalogue. Filtering happens locally.
    async fn fetch_all_places(&self) -> Result<Vec<PlaceRow>, ProviderError>;

    /// Events whose start time falls within `[start_after, start_before]`.
    async fn fetch_events(
        &self,
        start_after: DateTime<Utc>,
        start_before: DateTime<Utc>,
    ) -> Result<Vec<EventRow>, ProviderError>;
}
