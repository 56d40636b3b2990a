use crate::configuration::ScrapingSettings;
use crate::models::{AddressRequest, PropertyRecord, PropertyRequest, ScrapeOutcome, UrlRequest};
use crate::scrapers::resolver::{build_listing_url, validate_listing_url};
use crate::scrapers::{RetrievalChain, ScrapeError};
use actix_web::{post, web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::{error, info, warn};

/// Entries past this count in a batch request are skipped
pub const BATCH_LIMIT: usize = 3;

#[derive(Debug, Serialize)]
struct ScrapeResponse {
    success: bool,
    url: String,
    final_url: String,
    search_performed: bool,
    unexpected_page: bool,
    property_data: PropertyRecord,
    timestamp: String,
}

impl From<ScrapeOutcome> for ScrapeResponse {
    fn from(outcome: ScrapeOutcome) -> Self {
        Self {
            success: outcome.success,
            url: outcome.url,
            final_url: outcome.final_url,
            search_performed: outcome.search_performed,
            unexpected_page: outcome.unexpected_page,
            property_data: outcome.property,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub properties: Vec<PropertyRequest>,
}

/// Echo of what the caller sent for one batch entry
#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchTarget {
    Address(String),
    Url(String),
}

impl BatchTarget {
    fn label(&self) -> &str {
        match self {
            BatchTarget::Address(label) | BatchTarget::Url(label) => label,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BatchEntry {
    pub success: bool,
    #[serde(flatten)]
    pub target: BatchTarget,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property_data: Option<PropertyRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub results: Vec<BatchEntry>,
    pub timestamp: String,
}

fn failure_response(err: &ScrapeError) -> HttpResponse {
    let body = json!({"success": false, "error": format!("Scraping failed: {}", err)});
    if err.is_input_error() {
        HttpResponse::BadRequest().json(body)
    } else {
        HttpResponse::InternalServerError().json(body)
    }
}

#[post("/property")]
pub async fn scrape_by_address(
    chain: web::Data<RetrievalChain>,
    settings: web::Data<ScrapingSettings>,
    body: web::Json<AddressRequest>,
) -> HttpResponse {
    let url = build_listing_url(chain.site(), &body);
    info!("Attempting to scrape: {}", url);

    match chain.scrape_within(&url, settings.request_deadline()).await {
        Ok(outcome) => HttpResponse::Ok().json(ScrapeResponse::from(outcome)),
        Err(err) => {
            error!("Scraping failed for {}: {}", body.display(), err);
            failure_response(&err)
        }
    }
}

#[post("/property/url")]
pub async fn scrape_by_url(
    chain: web::Data<RetrievalChain>,
    settings: web::Data<ScrapingSettings>,
    body: web::Json<UrlRequest>,
) -> HttpResponse {
    let url = match validate_listing_url(chain.site(), &body.url) {
        Ok(parsed) => parsed,
        Err(err) => {
            warn!("Rejected {}: {}", body.url, err);
            return failure_response(&err);
        }
    };

    match chain.scrape_within(url.as_str(), settings.request_deadline()).await {
        Ok(outcome) => HttpResponse::Ok().json(ScrapeResponse::from(outcome)),
        Err(err) => {
            error!("URL scraping failed for {}: {}", body.url, err);
            failure_response(&err)
        }
    }
}

#[post("/property/batch")]
pub async fn scrape_batch(
    chain: web::Data<RetrievalChain>,
    settings: web::Data<ScrapingSettings>,
    body: web::Json<BatchRequest>,
) -> HttpResponse {
    let report = run_batch(&chain, settings.request_deadline(), &body.properties).await;
    HttpResponse::Ok().json(report)
}

/// Scrape the first [`BATCH_LIMIT`] entries one after another. A failing entry
/// is reported in place and does not stop the rest.
pub async fn run_batch(
    chain: &RetrievalChain,
    deadline: Option<Duration>,
    requests: &[PropertyRequest],
) -> BatchReport {
    if requests.len() > BATCH_LIMIT {
        info!("Batch of {} trimmed to {}", requests.len(), BATCH_LIMIT);
    }

    let mut results = Vec::with_capacity(BATCH_LIMIT);
    for request in requests.iter().take(BATCH_LIMIT) {
        results.push(scrape_entry(chain, deadline, request).await);
    }

    BatchReport {
        processed: results.len(),
        skipped: requests.len() - results.len(),
        results,
        timestamp: Utc::now().to_rfc3339(),
    }
}

async fn scrape_entry(
    chain: &RetrievalChain,
    deadline: Option<Duration>,
    request: &PropertyRequest,
) -> BatchEntry {
    let (target, url) = match request {
        PropertyRequest::Address(address) => (
            BatchTarget::Address(address.display()),
            Ok(build_listing_url(chain.site(), address)),
        ),
        PropertyRequest::Url(UrlRequest { url }) => (
            BatchTarget::Url(url.clone()),
            validate_listing_url(chain.site(), url).map(String::from),
        ),
    };

    let result = match url {
        Ok(url) => chain.scrape_within(&url, deadline).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(outcome) => BatchEntry {
            success: true,
            target,
            final_url: Some(outcome.final_url),
            property_data: Some(outcome.property),
            error: None,
        },
        Err(err) => {
            warn!("Batch entry {} failed: {}", target.label(), err);
            BatchEntry {
                success: false,
                target,
                final_url: None,
                property_data: None,
                error: Some(err.to_string()),
            }
        }
    }
}
