mod configuration;
mod models;
mod routes;
mod scrapers;
mod startup;

use anyhow::Context;
use configuration::get_configuration;
use scrapers::{FirecrawlFetcher, RetrievalChain};
use std::net::TcpListener;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = get_configuration().context("Failed to read configuration")?;

    let fetcher = FirecrawlFetcher::new(&settings.firecrawl)?;
    let chain = RetrievalChain::new(Arc::new(fetcher), settings.site.clone());

    let address = format!("{}:{}", settings.application.host, settings.application.port);
    let listener = TcpListener::bind(&address).with_context(|| format!("Failed to bind {}", address))?;

    info!("🏠 Listing Scout listening on http://{}", address);
    if let Some(deadline) = settings.scraping.request_deadline() {
        info!("Per-request deadline: {:?}", deadline);
    }

    startup::run(listener, chain, settings.scraping)?.await?;

    Ok(())
}
