use crate::models::ScrapeOutcome;
use crate::scrapers::error::ScrapeError;
use crate::scrapers::extractor;
use crate::scrapers::resolver::{build_search_url, resolve_search_query};
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::{
    FetchOptions, FetchResult, PageAction, ProxyMode, SearchLanding, SiteProfile,
};
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const SIMULATED_SEARCH_TIMEOUT_MS: u64 = 60_000;
const FALLBACK_SEARCH_TIMEOUT_MS: u64 = 60_000;
const SEARCH_URL_TIMEOUT_MS: u64 = 45_000;

/// Search tactics, tried strictly in this order until one succeeds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Type the query into the home page search box and click submit
    SimulatedSearch,
    /// Same, with the alternate input selector and an Enter key press
    SimulatedSearchFallback,
    /// Fetch the site's search URL for the query
    SearchUrl,
}

impl SearchStrategy {
    pub const ORDER: [SearchStrategy; 3] = [
        SearchStrategy::SimulatedSearch,
        SearchStrategy::SimulatedSearchFallback,
        SearchStrategy::SearchUrl,
    ];

    fn target_url(&self, site: &SiteProfile, query: &str) -> String {
        match self {
            SearchStrategy::SimulatedSearch | SearchStrategy::SimulatedSearchFallback => {
                site.home_url()
            }
            SearchStrategy::SearchUrl => build_search_url(site, query),
        }
    }

    fn options(&self, site: &SiteProfile, query: &str) -> FetchOptions {
        match self {
            SearchStrategy::SimulatedSearch => FetchOptions::live_search(
                vec![
                    PageAction::Wait { milliseconds: 3_000 },
                    PageAction::Click {
                        selector: site.search_input_selector.clone(),
                    },
                    PageAction::Write {
                        text: query.to_string(),
                    },
                    PageAction::Click {
                        selector: site.search_submit_selector.clone(),
                    },
                    PageAction::Wait { milliseconds: 5_000 },
                ],
                SIMULATED_SEARCH_TIMEOUT_MS,
            ),
            SearchStrategy::SimulatedSearchFallback => FetchOptions::live_search(
                vec![
                    PageAction::Wait { milliseconds: 3_000 },
                    PageAction::Click {
                        selector: site.fallback_input_selector.clone(),
                    },
                    PageAction::Write {
                        text: query.to_string(),
                    },
                    PageAction::Press {
                        key: "ENTER".to_string(),
                    },
                    PageAction::Wait { milliseconds: 5_000 },
                ],
                FALLBACK_SEARCH_TIMEOUT_MS,
            ),
            SearchStrategy::SearchUrl => FetchOptions::live_search(Vec::new(), SEARCH_URL_TIMEOUT_MS),
        }
    }
}

/// How the winning page was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Direct,
    Search,
    /// Search ended on a page that is not a single listing
    NonCanonical,
}

/// Drives the page fetcher through direct and search retrieval, then extracts the listing.
/// Holds no mutable state; one instance serves every request.
pub struct RetrievalChain {
    fetcher: Arc<dyn PageFetcher>,
    site: SiteProfile,
}

impl RetrievalChain {
    pub fn new(fetcher: Arc<dyn PageFetcher>, site: SiteProfile) -> Self {
        Self { fetcher, site }
    }

    pub fn site(&self) -> &SiteProfile {
        &self.site
    }

    /// Like [`scrape`](Self::scrape), but gives up once `deadline` has passed
    pub async fn scrape_within(
        &self,
        url: &str,
        deadline: Option<Duration>,
    ) -> Result<ScrapeOutcome, ScrapeError> {
        let Some(limit) = deadline else {
            return self.scrape(url).await;
        };
        match tokio::time::timeout(limit, self.scrape(url)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Scrape of {} hit the {:?} deadline", url, limit);
                Err(ScrapeError::DeadlineExceeded {
                    url: url.to_string(),
                    limit,
                })
            }
        }
    }

    /// Scrape one listing URL
    pub async fn scrape(&self, url: &str) -> Result<ScrapeOutcome, ScrapeError> {
        info!("Scraping {} via {}", url, self.fetcher.backend_name());

        if self.site.has_identifier(url) {
            let page = self.direct_fetch(url).await?;
            return Ok(self.build_outcome(url, url, page, Route::Direct));
        }

        let query = resolve_search_query(&self.site, url);
        info!("No identifier in {}, searching for \"{}\"", url, query);
        self.search(url, &query).await
    }

    async fn search(&self, url: &str, query: &str) -> Result<ScrapeOutcome, ScrapeError> {
        let mut landed = None;
        for strategy in SearchStrategy::ORDER {
            if let Some(hit) = self.try_strategy(strategy, query).await {
                landed = Some(hit);
                break;
            }
        }

        let Some((target, page)) = landed else {
            error!("All search strategies failed for \"{}\"", query);
            return Err(ScrapeError::SearchExhausted {
                query: query.to_string(),
            });
        };

        let resolved = page.resolved_url().unwrap_or(&target).to_string();
        match self.site.classify(&resolved) {
            SearchLanding::Listing => {
                info!("Search landed on listing {}", resolved);
                Ok(self.build_outcome(url, &target, page, Route::Search))
            }
            SearchLanding::Results => {
                if let Some(link) = self.harvest_listing_link(&page.html) {
                    info!("Following first listing on results page: {}", link);
                    let listing = self.direct_fetch(&link).await?;
                    return Ok(self.build_outcome(url, &link, listing, Route::Search));
                }
                warn!("No listing link on results page {}, extracting from it directly", resolved);
                self.non_canonical(url, &target, page, ScrapeError::NoSearchData { url: resolved })
            }
            SearchLanding::Unrecognized => {
                warn!("Search landed on unrecognized page {}", resolved);
                self.non_canonical(
                    url,
                    &target,
                    page,
                    ScrapeError::UnrecognizedPage { url: resolved },
                )
            }
        }
    }

    /// One search attempt. Every failure becomes `None` so the next strategy runs.
    async fn try_strategy(
        &self,
        strategy: SearchStrategy,
        query: &str,
    ) -> Option<(String, FetchResult)> {
        let target = strategy.target_url(&self.site, query);
        let options = strategy.options(&self.site, query);
        debug!("Trying {:?} at {}", strategy, target);

        match self.fetcher.fetch(&target, &options).await {
            Ok(page) if page.success => Some((target, page)),
            Ok(page) => {
                warn!("{:?} failed: {}", strategy, page.failure_reason());
                None
            }
            Err(err) => {
                warn!("{:?} raised: {:#}", strategy, err);
                None
            }
        }
    }

    /// Fetch a listing by URL. A blocked status or reported failure gets one stealth retry;
    /// a raised error (on either attempt) gets its own stealth retry.
    async fn direct_fetch(&self, url: &str) -> Result<FetchResult, ScrapeError> {
        let stealth = FetchOptions::direct(ProxyMode::Stealth);

        let attempt = match self
            .fetcher
            .fetch(url, &FetchOptions::direct(ProxyMode::Basic))
            .await
        {
            Ok(page) if page.is_usable() => return Ok(page),
            Ok(page) => {
                info!(
                    "Direct fetch of {} got {}, retrying with stealth proxy",
                    url,
                    page.failure_reason()
                );
                self.fetcher.fetch(url, &stealth).await
            }
            Err(err) => Err(err),
        };

        let failed = |reason: String| {
            error!("Direct fetch of {} failed: {}", url, reason);
            ScrapeError::DirectFetchFailed {
                url: url.to_string(),
                reason,
            }
        };

        match attempt {
            Ok(page) if page.is_usable() => Ok(page),
            Ok(page) => Err(failed(page.failure_reason())),
            Err(err) => {
                warn!("Fetch of {} raised ({:#}), retrying with stealth proxy", url, err);
                match self.fetcher.fetch(url, &stealth).await {
                    Ok(page) if page.is_usable() => Ok(page),
                    Ok(page) => Err(failed(page.failure_reason())),
                    Err(err) => Err(failed(format!("{:#}", err))),
                }
            }
        }
    }

    /// First listing link in a results page: absolute links first, then site-relative ones
    fn harvest_listing_link(&self, html: &str) -> Option<String> {
        let base = self.site.base_url.trim_end_matches('/');
        let marker = regex::escape(&self.site.listing_marker);
        let token = regex::escape(&self.site.identifier_token);

        let absolute = Regex::new(&format!(
            r#"{}{}[^"'\s<>()]+?{}/?"#,
            regex::escape(base),
            marker,
            token
        ))
        .ok()?;
        if let Some(found) = absolute.find(html) {
            return Some(found.as_str().to_string());
        }

        let relative = Regex::new(&format!(r#"href=["']({}[^"']+?{}/?)["']"#, marker, token)).ok()?;
        relative
            .captures(html)
            .map(|caps| format!("{}{}", base, &caps[1]))
    }

    fn non_canonical(
        &self,
        url: &str,
        fetched_url: &str,
        page: FetchResult,
        empty_error: ScrapeError,
    ) -> Result<ScrapeOutcome, ScrapeError> {
        let outcome = self.build_outcome(url, fetched_url, page, Route::NonCanonical);
        if outcome.property.has_attributes() {
            Ok(outcome)
        } else {
            error!("{}", empty_error);
            Err(empty_error)
        }
    }

    fn build_outcome(
        &self,
        url: &str,
        fetched_url: &str,
        mut page: FetchResult,
        route: Route,
    ) -> ScrapeOutcome {
        extractor::fill_metadata_from_markup(&mut page.metadata, &page.html);
        let property = extractor::extract(&page.markdown, &page.metadata, &self.site.title_suffix);
        let final_url = page.resolved_url().unwrap_or(fetched_url).to_string();

        ScrapeOutcome {
            success: true,
            url: url.to_string(),
            final_url,
            property,
            raw_content: page.markdown,
            search_performed: route != Route::Direct,
            unexpected_page: route == Route::NonCanonical,
        }
    }
}
