use serde::{Deserialize, Serialize};

/// Cache age used for direct listing fetches (two days, in milliseconds)
pub const DIRECT_CACHE_MAX_AGE_MS: u64 = 172_800_000;

/// Status codes that send a direct fetch to the stealth retry
pub const BLOCKED_STATUS_CODES: [u16; 3] = [401, 403, 500];

/// Content formats requested from the page fetcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Markdown,
    Html,
}

/// Proxy routing for a fetch. `Stealth` is the anti-bot-evasion mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyMode {
    Basic,
    Stealth,
}

/// One step of a scripted browser interaction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PageAction {
    Wait { milliseconds: u64 },
    Click { selector: String },
    Write { text: String },
    Press { key: String },
    #[allow(dead_code)]
    Screenshot,
}

/// Options for a single fetch attempt. Built fresh for every attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    pub formats: Vec<Format>,
    pub only_main_content: bool,
    pub wait_for_ms: u64,
    pub proxy: ProxyMode,
    /// `Some(0)` disables caching on the fetcher side
    pub max_age_ms: Option<u64>,
    pub timeout_ms: Option<u64>,
    pub actions: Vec<PageAction>,
}

impl FetchOptions {
    /// Options for fetching a listing page by its canonical URL
    pub fn direct(proxy: ProxyMode) -> Self {
        Self {
            formats: vec![Format::Markdown, Format::Html],
            only_main_content: true,
            wait_for_ms: 2_000,
            proxy,
            max_age_ms: Some(DIRECT_CACHE_MAX_AGE_MS),
            timeout_ms: None,
            actions: Vec::new(),
        }
    }

    /// Options for a live search: stealth proxy, never cached, bounded
    pub fn live_search(actions: Vec<PageAction>, timeout_ms: u64) -> Self {
        Self {
            formats: vec![Format::Markdown, Format::Html],
            only_main_content: false,
            wait_for_ms: 3_000,
            proxy: ProxyMode::Stealth,
            max_age_ms: Some(0),
            timeout_ms: Some(timeout_ms),
            actions,
        }
    }
}

/// Response metadata reported by the fetcher
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchMetadata {
    pub status_code: Option<u16>,
    pub source_url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub og_images: Vec<String>,
}

/// Result of a single fetch attempt
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResult {
    pub success: bool,
    pub markdown: String,
    pub html: String,
    pub metadata: FetchMetadata,
    pub error: Option<String>,
}

impl FetchResult {
    /// Final URL after redirects, as reported by the fetcher
    pub fn resolved_url(&self) -> Option<&str> {
        self.metadata.source_url.as_deref()
    }

    pub fn is_blocked(&self) -> bool {
        self.metadata
            .status_code
            .map(|code| BLOCKED_STATUS_CODES.contains(&code))
            .unwrap_or(false)
    }

    /// Successful and not answered with a blocked status
    pub fn is_usable(&self) -> bool {
        self.success && !self.is_blocked()
    }

    pub fn failure_reason(&self) -> String {
        match (&self.error, self.metadata.status_code) {
            (Some(error), _) => error.clone(),
            (None, Some(code)) => format!("status code {}", code),
            (None, None) => "fetcher reported no success".to_string(),
        }
    }
}

/// Where a search landed, judged from the resolved URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLanding {
    Listing,
    Results,
    Unrecognized,
}

/// Everything site-specific the chain needs to know about the listing site
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteProfile {
    pub base_url: String,
    /// Path segment that precedes a listing slug, e.g. `/homedetails/`
    pub listing_marker: String,
    /// Fragment that only appears in URLs naming exactly one property
    pub identifier_token: String,
    /// Appended by the site to every page title
    pub title_suffix: String,
    /// Must contain a `{query}` placeholder
    pub search_url_template: String,
    pub results_keywords: Vec<String>,
    pub search_input_selector: String,
    pub fallback_input_selector: String,
    pub search_submit_selector: String,
}

impl Default for SiteProfile {
    fn default() -> Self {
        Self {
            base_url: "https://www.zillow.com".to_string(),
            listing_marker: "/homedetails/".to_string(),
            identifier_token: "_zpid".to_string(),
            title_suffix: " | Zillow".to_string(),
            search_url_template: "https://www.zillow.com/homes/{query}_rb/".to_string(),
            results_keywords: vec![
                "/homes/".to_string(),
                "_rb".to_string(),
                "searchQueryState".to_string(),
                "for_sale".to_string(),
            ],
            search_input_selector: "input#search-box-input".to_string(),
            fallback_input_selector: "input[placeholder*='Enter an address']".to_string(),
            search_submit_selector: "button[type='submit']".to_string(),
        }
    }
}

impl SiteProfile {
    /// Profile for an arbitrary site root, keeping the default markers
    #[cfg(test)]
    pub fn for_base_url(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            search_url_template: format!("{}/homes/{{query}}_rb/", base_url),
            base_url,
            ..Self::default()
        }
    }

    pub fn home_url(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }

    pub fn has_identifier(&self, url: &str) -> bool {
        url.contains(&self.identifier_token)
    }

    /// Registrable host of the site, without a leading `www.`
    pub fn domain(&self) -> Option<String> {
        let parsed = url::Url::parse(&self.base_url).ok()?;
        let host = parsed.host_str()?;
        Some(host.trim_start_matches("www.").to_string())
    }

    pub fn classify(&self, resolved_url: &str) -> SearchLanding {
        if resolved_url.contains(&self.listing_marker) && self.has_identifier(resolved_url) {
            SearchLanding::Listing
        } else if self
            .results_keywords
            .iter()
            .any(|keyword| resolved_url.contains(keyword.as_str()))
        {
            SearchLanding::Results
        } else {
            SearchLanding::Unrecognized
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_status_is_not_usable() {
        let mut page = FetchResult {
            success: true,
            ..FetchResult::default()
        };
        assert!(page.is_usable());

        page.metadata.status_code = Some(403);
        assert!(page.is_blocked());
        assert!(!page.is_usable());

        page.metadata.status_code = Some(404);
        assert!(page.is_usable());
    }

    #[test]
    fn classify_search_landings() {
        let site = SiteProfile::for_base_url("https://site.example");
        assert_eq!(
            site.classify("https://site.example/homedetails/1-Elm-St/555_zpid/"),
            SearchLanding::Listing
        );
        assert_eq!(
            site.classify("https://site.example/homes/Springfield-IL_rb/"),
            SearchLanding::Results
        );
        assert_eq!(
            site.classify("https://site.example/captcha"),
            SearchLanding::Unrecognized
        );
        // marker without identifier is not a listing
        assert_eq!(
            site.classify("https://site.example/homedetails/1-Elm-St"),
            SearchLanding::Unrecognized
        );
    }

    #[test]
    fn domain_strips_www() {
        assert_eq!(SiteProfile::default().domain().as_deref(), Some("zillow.com"));
        assert_eq!(
            SiteProfile::for_base_url("https://site.example/").domain().as_deref(),
            Some("site.example")
        );
    }

    #[test]
    fn action_wire_shape() {
        let json = serde_json::to_value(PageAction::Wait { milliseconds: 500 }).unwrap();
        assert_eq!(json, serde_json::json!({"type": "wait", "milliseconds": 500}));
        let json = serde_json::to_value(PageAction::Screenshot).unwrap();
        assert_eq!(json, serde_json::json!({"type": "screenshot"}));
    }
}
