use crate::scrapers::types::{FetchOptions, FetchResult};
use anyhow::Result;
use async_trait::async_trait;

/// Renders a page and returns its content.
/// The retrieval chain only talks to the outside world through this trait,
/// so tests can swap in a scripted double.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` once with the given options
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchResult>;

    /// Get the name of the fetcher backend
    fn backend_name(&self) -> &'static str;
}
