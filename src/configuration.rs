use crate::scrapers::types::SiteProfile;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub application: ApplicationSettings,
    pub firecrawl: FirecrawlSettings,
    #[serde(default)]
    pub scraping: ScrapingSettings,
    #[serde(default)]
    pub site: SiteProfile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FirecrawlSettings {
    pub api_key: String,
    #[serde(default = "default_firecrawl_url")]
    pub base_url: String,
    #[serde(default = "default_client_timeout")]
    pub client_timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScrapingSettings {
    /// Overall limit for one scrape request; unset means only per-attempt timeouts apply
    #[serde(default)]
    pub request_deadline_secs: Option<u64>,
}

impl ScrapingSettings {
    pub fn request_deadline(&self) -> Option<Duration> {
        self.request_deadline_secs.map(Duration::from_secs)
    }
}

fn default_firecrawl_url() -> String {
    "https://api.firecrawl.dev".to_string()
}

fn default_client_timeout() -> u64 {
    120
}

/// Load settings from `configuration.{toml,yaml,json}` (optional), then `APP__*`
/// environment variables. `FIRECRAWL_API_KEY` wins over both for the API key.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    Config::builder()
        .add_source(File::with_name("configuration").required(false))
        .add_source(Environment::with_prefix("APP").prefix_separator("__").separator("__"))
        .set_override_option("firecrawl.api_key", std::env::var("FIRECRAWL_API_KEY").ok())?
        .build()?
        .try_deserialize()
}
