use crate::configuration::FirecrawlSettings;
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::{FetchMetadata, FetchOptions, FetchResult, Format, PageAction, ProxyMode};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, warn};

/// Extra time granted to the HTTP call beyond the fetcher-side timeout
const TIMEOUT_SLACK: Duration = Duration::from_secs(10);

/// Page fetcher backed by the Firecrawl scrape API
pub struct FirecrawlFetcher {
    client: Client,
    api_key: String,
    endpoint: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeBody<'a> {
    url: &'a str,
    formats: &'a [Format],
    only_main_content: bool,
    wait_for: u64,
    proxy: ProxyMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_age: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<u64>,
    #[serde(skip_serializing_if = "no_actions")]
    actions: &'a [PageAction],
}

fn no_actions(actions: &&[PageAction]) -> bool {
    actions.is_empty()
}

impl<'a> ScrapeBody<'a> {
    fn new(url: &'a str, options: &'a FetchOptions) -> Self {
        Self {
            url,
            formats: &options.formats,
            only_main_content: options.only_main_content,
            wait_for: options.wait_for_ms,
            proxy: options.proxy,
            max_age: options.max_age_ms,
            timeout: options.timeout_ms,
            actions: &options.actions,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    data: Option<ScrapeData>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl FirecrawlFetcher {
    pub fn new(settings: &FirecrawlSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.client_timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: settings.api_key.clone(),
            endpoint: format!("{}/v1/scrape", settings.base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl PageFetcher for FirecrawlFetcher {
    async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchResult> {
        debug!("Scraping {} via Firecrawl (proxy {:?}, {} actions)", url, options.proxy, options.actions.len());

        let mut request = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&ScrapeBody::new(url, options));
        if let Some(timeout_ms) = options.timeout_ms {
            request = request.timeout(Duration::from_millis(timeout_ms) + TIMEOUT_SLACK);
        }

        let response = request
            .send()
            .await
            .context("Failed to reach Firecrawl")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Firecrawl returned status {} for {}", status, url);
            anyhow::bail!("Firecrawl returned {}: {}", status, body);
        }

        let parsed: ScrapeResponse = response
            .json()
            .await
            .context("Failed to decode Firecrawl response")?;

        Ok(into_fetch_result(parsed))
    }

    fn backend_name(&self) -> &'static str {
        "Firecrawl"
    }
}

fn into_fetch_result(response: ScrapeResponse) -> FetchResult {
    let data = response.data.unwrap_or_default();
    FetchResult {
        success: response.success,
        markdown: data.markdown.unwrap_or_default(),
        html: data.html.unwrap_or_default(),
        metadata: parse_metadata(&data.metadata),
        error: response.error,
    }
}

fn parse_metadata(raw: &Map<String, Value>) -> FetchMetadata {
    let text = |keys: &[&str]| {
        keys.iter().find_map(|key| {
            raw.get(*key)
                .and_then(first_string)
                .filter(|value| !value.is_empty())
        })
    };

    let status_code = raw
        .get("statusCode")
        .and_then(Value::as_u64)
        .and_then(|code| u16::try_from(code).ok());

    let og_images = match raw.get("ogImage").or_else(|| raw.get("og:image")) {
        Some(Value::String(image)) if !image.is_empty() => vec![image.clone()],
        Some(Value::Array(images)) => images
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    FetchMetadata {
        status_code,
        source_url: text(&["sourceURL", "url"]),
        title: text(&["title", "ogTitle", "og:title"]),
        description: text(&["description", "ogDescription", "og:description"]),
        og_images,
    }
}

/// Metadata values arrive either as a string or a list of strings
fn first_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(Value::as_str).map(str::to_string),
        _ => None,
    }
}
