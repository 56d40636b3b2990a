use std::time::Duration;
use thiserror::Error;

/// Terminal failures of a scrape request
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid listing URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("search exhausted for \"{query}\": every search strategy failed")]
    SearchExhausted { query: String },

    #[error("search did not yield data (landed on {url})")]
    NoSearchData { url: String },

    #[error("search landed on an unrecognized page with no data ({url})")]
    UnrecognizedPage { url: String },

    #[error("direct fetch failed for {url}: {reason}")]
    DirectFetchFailed { url: String, reason: String },

    #[error("scrape of {url} exceeded the {:.1}s deadline", .limit.as_secs_f64())]
    DeadlineExceeded { url: String, limit: Duration },
}

impl ScrapeError {
    /// Rejected before any fetch was attempted
    pub fn is_input_error(&self) -> bool {
        matches!(self, ScrapeError::InvalidUrl { .. })
    }
}
