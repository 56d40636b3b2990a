use crate::models::AddressRequest;
use crate::scrapers::error::ScrapeError;
use crate::scrapers::types::SiteProfile;
use url::{form_urlencoded, Url};

/// Build the listing URL the site would use for a street address.
/// It carries no identifier, so scraping it always goes through search.
pub fn build_listing_url(site: &SiteProfile, request: &AddressRequest) -> String {
    let address = request.address.trim().replace(',', "").replace(' ', "-");
    let city = request.city.trim().replace(' ', "-");
    format!(
        "{}{}{}-{}-{}-{}",
        site.base_url.trim_end_matches('/'),
        site.listing_marker,
        address,
        city,
        request.state.trim(),
        request.zip.trim()
    )
}

/// Turn a listing URL without an identifier back into a search query.
///
/// `.../homedetails/123-Main-St-Springfield-IL-62701` becomes
/// `123 Main St, Springfield, IL 62701`. Multi-word cities get split wrong and
/// URLs without the listing marker come back nearly untouched; both are best-effort.
pub fn resolve_search_query(site: &SiteProfile, url: &str) -> String {
    let Some(marker_pos) = url.find(&site.listing_marker) else {
        return url
            .strip_prefix(site.home_url().as_str())
            .unwrap_or(url)
            .trim_end_matches('/')
            .to_string();
    };

    let slug = url[marker_pos + site.listing_marker.len()..]
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();

    let tokens: Vec<&str> = slug.split('-').filter(|token| !token.is_empty()).collect();
    if tokens.len() < 4 {
        return slug.replace('-', " ").trim().to_string();
    }

    let n = tokens.len();
    let (zip, state, city) = (tokens[n - 1], tokens[n - 2], tokens[n - 3]);
    let address = tokens[..n - 3].join(" ");
    format!("{}, {}, {} {}", address, city, state, zip)
        .trim()
        .to_string()
}

/// Canonical search URL for a query, percent-encoded into the site's template
pub fn build_search_url(site: &SiteProfile, query: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
    // byte_serialize writes spaces as '+', literal pluses are already %2B
    let encoded = encoded.replace('+', "%20");
    site.search_url_template.replace("{query}", &encoded)
}

/// Reject anything that is not a listing page on the configured site
pub fn validate_listing_url(site: &SiteProfile, raw: &str) -> Result<Url, ScrapeError> {
    let invalid = |reason: &str| ScrapeError::InvalidUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let parsed = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }

    let domain = site
        .domain()
        .ok_or_else(|| invalid("site base URL has no host"))?;
    let host = parsed.host_str().unwrap_or_default();
    if host != domain && !host.ends_with(&format!(".{}", domain)) {
        return Err(invalid(&format!("URL must be a {} URL", domain)));
    }

    if !parsed.path().starts_with(&site.listing_marker) {
        return Err(invalid(&format!(
            "path must start with {}",
            site.listing_marker
        )));
    }

    Ok(parsed)
}
