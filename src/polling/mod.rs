//! Polling module - Auto-refresh loop for one watched item
//!
//! A `PollingScheduler` drives one `PollSession`: every tick it fetches raw
//! quotes through a `QuoteFetcher`, runs them through the market pipeline and
//! hands the result to a `DisplaySink`.

mod scheduler;
mod session;

pub use scheduler::{PollingScheduler, SHORT_DELAY};
pub use session::{PollSession, SessionState};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc::Sender;

use crate::market::PriceDifference;
use crate::types::{AggregatedQuote, ItemMetadata, LocationFilter, RawQuote};

/// Errors a fetch collaborator can report. Any of them skips the tick.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{url} answered with status {status}")]
    Status { status: u16, url: String },
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("no data available: {0}")]
    Unavailable(String),
}

/// Source of raw per-location quotes
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteFetcher: Send + Sync {
    /// Fetch current quotes for `item` at every location enabled in `filter`
    async fn fetch_quotes(
        &self,
        item: &str,
        filter: LocationFilter,
    ) -> Result<Vec<RawQuote>, FetchError>;
}

/// Source of static item descriptions
#[async_trait]
pub trait ItemMetadataFetcher: Send + Sync {
    async fn fetch_item_metadata(&self, item: &str) -> Result<ItemMetadata, FetchError>;
}

/// One tick's published result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Publication {
    pub item: String,
    pub quotes: Vec<AggregatedQuote>,
    pub difference: PriceDifference,
    pub updated_at: DateTime<Utc>,
}

/// Consumer of publications (usually bridging to the UI thread)
#[async_trait]
pub trait DisplaySink: Send + Sync {
    /// Returns false once the consumer is gone
    async fn publish(&self, publication: Publication) -> bool;
}

#[async_trait]
impl DisplaySink for Sender<Publication> {
    async fn publish(&self, publication: Publication) -> bool {
        self.send(publication).await.is_ok()
    }
}
