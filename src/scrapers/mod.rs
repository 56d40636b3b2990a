pub mod chain;
pub mod error;
pub mod extractor;
pub mod firecrawl;
pub mod resolver;
pub mod traits;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use chain::RetrievalChain;
pub use error::ScrapeError;
pub use firecrawl::FirecrawlFetcher;
