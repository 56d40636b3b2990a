//! Best-effort extraction of listing attributes from rendered page text.
//!
//! Every field has its own matcher and a miss only leaves that field empty.
//! The patterns target the text a listing site renders today; nothing about
//! that markup is contractual, so treat every result as a guess.

use crate::models::{PropertyRecord, PropertyType};
use crate::scrapers::types::FetchMetadata;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$[\d,]+(?:\.\d{2})?").expect("price pattern is valid"));

static BEDROOMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+)\s*(?:bedrooms?|beds?|bds?)\b").expect("bedroom pattern is valid")
});

static BATHROOMS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d+(?:\.\d)?)\s*(?:bathrooms?|baths?|ba)\b")
        .expect("bathroom pattern is valid")
});

static SQUARE_FEET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3}(?:,\d{3})+|\d+)\s*(?:sq\.?\s*ft\.?|sqft|square\s+f(?:ee|oo)t)")
        .expect("square footage pattern is valid")
});

static LOT_SIZE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d+(?:,\d{3})*(?:\.\d+)?\s*(?:acres?|sq\.?\s*ft\.?\s+lot)\b")
        .expect("lot size pattern is valid")
});

/// Unit continued by "lot" on the same line, e.g. "6,098 sq ft lot"
static LOT_CONTINUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^[ \t]*lot\b").expect("lot continuation pattern is valid"));

static LOT_SIZE_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[ \t]*lot[ \t]+size\b").expect("lot size label pattern is valid")
});

static YEAR_BUILT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(?:year\s+built|built)\b.*?\b(\d{4})\b").expect("year pattern is valid")
});

/// Build a record from page text and metadata. Never fails.
pub fn extract(markdown: &str, metadata: &FetchMetadata, title_suffix: &str) -> PropertyRecord {
    PropertyRecord {
        address: extract_address(metadata.title.as_deref(), title_suffix),
        price: extract_price(markdown),
        bedrooms: extract_bedrooms(markdown),
        bathrooms: extract_bathrooms(markdown),
        square_feet: extract_square_feet(markdown),
        lot_size: extract_lot_size(markdown),
        year_built: extract_year_built(markdown),
        property_type: extract_property_type(markdown),
        description: metadata.description.clone().unwrap_or_default(),
        images: metadata.og_images.clone(),
    }
}

fn extract_address(title: Option<&str>, title_suffix: &str) -> String {
    let title = title.unwrap_or_default();
    let title = if title_suffix.is_empty() {
        title
    } else {
        title.strip_suffix(title_suffix).unwrap_or(title)
    };
    title.trim().to_string()
}

pub fn extract_price(text: &str) -> Option<String> {
    PRICE.find(text).map(|m| m.as_str().to_string())
}

pub fn extract_bedrooms(text: &str) -> Option<u32> {
    BEDROOMS
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

pub fn extract_bathrooms(text: &str) -> Option<f32> {
    BATHROOMS
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

/// First living-area figure. A figure whose unit continues with "lot" on the same
/// line is the lot size and is skipped; a following "Lot size" label is not.
pub fn extract_square_feet(text: &str) -> Option<u32> {
    SQUARE_FEET.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        let rest = &text[whole.end()..];
        if LOT_CONTINUATION.is_match(rest) && !LOT_SIZE_LABEL.is_match(rest) {
            return None;
        }
        caps[1].replace(',', "").parse().ok()
    })
}

pub fn extract_lot_size(text: &str) -> Option<String> {
    LOT_SIZE.find(text).map(|m| m.as_str().trim().to_string())
}

pub fn extract_year_built(text: &str) -> Option<u16> {
    YEAR_BUILT
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
}

pub fn extract_property_type(text: &str) -> Option<PropertyType> {
    let lowered = text.to_lowercase();
    PropertyType::PRIORITY
        .into_iter()
        .find(|kind| lowered.contains(kind.keyword()))
}

/// Fill metadata gaps from the raw markup (`<title>`, meta description, og:image)
pub fn fill_metadata_from_markup(metadata: &mut FetchMetadata, html: &str) {
    if html.trim().is_empty() {
        return;
    }
    let needs_title = metadata.title.as_deref().map_or(true, str::is_empty);
    let needs_description = metadata.description.as_deref().map_or(true, str::is_empty);
    let needs_images = metadata.og_images.is_empty();
    if !(needs_title || needs_description || needs_images) {
        return;
    }

    let document = Html::parse_document(html);

    if needs_title {
        metadata.title = select_text(&document, "title")
            .or_else(|| first_attr(&document, "meta[property='og:title']", "content"));
    }
    if needs_description {
        metadata.description = first_attr(&document, "meta[name='description']", "content")
            .or_else(|| first_attr(&document, "meta[property='og:description']", "content"));
    }
    if needs_images {
        metadata.og_images = select_attr(&document, "meta[property='og:image']", "content");
    }
}

fn select_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    let text = document
        .select(&selector)
        .next()?
        .text()
        .collect::<String>()
        .trim()
        .to_string();
    (!text.is_empty()).then_some(text)
}

fn first_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
    select_attr(document, css, attr).into_iter().next()
}

fn select_attr(document: &Html, css: &str, attr: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(css) else {
        return Vec::new();
    };
    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING: &str = "\
# 742 Evergreen Terrace, Springfield, IL 62704

$489,900

4 bd | 2.5 ba | 2,150 sqft

Single family residence · Built in 1998 · 0.25 acres lot

Price cut: $10,000 (3/1)
";

    #[test]
    fn extracts_full_listing() {
        let metadata = FetchMetadata {
            title: Some("742 Evergreen Terrace, Springfield, IL 62704 | Zillow".to_string()),
            description: Some("Lovely home".to_string()),
            og_images: vec!["https://img.example/1.jpg".to_string()],
            ..FetchMetadata::default()
        };
        let record = extract(LISTING, &metadata, " | Zillow");

        assert_eq!(record.address, "742 Evergreen Terrace, Springfield, IL 62704");
        assert_eq!(record.price.as_deref(), Some("$489,900"));
        assert_eq!(record.bedrooms, Some(4));
        assert_eq!(record.bathrooms, Some(2.5));
        assert_eq!(record.square_feet, Some(2150));
        assert_eq!(record.lot_size.as_deref(), Some("0.25 acres"));
        assert_eq!(record.year_built, Some(1998));
        assert_eq!(record.property_type, Some(PropertyType::SingleFamily));
        assert_eq!(record.description, "Lovely home");
        assert_eq!(record.images, vec!["https://img.example/1.jpg".to_string()]);
        assert!(record.has_attributes());
    }

    #[test]
    fn empty_text_yields_empty_record() {
        let record = extract("", &FetchMetadata::default(), " | Zillow");
        assert_eq!(record, PropertyRecord::default());
        assert!(!record.has_attributes());
    }

    #[test]
    fn price_absent_without_dollar_amount() {
        assert_eq!(extract_price("Contact agent for pricing. 3 bd 2 ba"), None);
        assert_eq!(extract_price("Price: 450000 USD"), None);
    }

    #[test]
    fn price_is_verbatim() {
        assert_eq!(extract_price("Listed at $1,250,000 today").as_deref(), Some("$1,250,000"));
        assert_eq!(extract_price("Rent $2,100.50/mo").as_deref(), Some("$2,100.50"));
        assert_eq!(extract_price("$350000").as_deref(), Some("$350000"));
    }

    #[test]
    fn first_price_wins() {
        // false positive risk: a price-cut amount listed before the asking price wins
        assert_eq!(
            extract_price("Price cut $5,000 · now $299,000").as_deref(),
            Some("$5,000")
        );
    }

    #[test]
    fn bedroom_tokens() {
        assert_eq!(extract_bedrooms("3 bd"), Some(3));
        assert_eq!(extract_bedrooms("3bd"), Some(3));
        assert_eq!(extract_bedrooms("5 Beds"), Some(5));
        assert_eq!(extract_bedrooms("2 BEDROOMS"), Some(2));
        assert_eq!(extract_bedrooms("a bed and breakfast"), None);
    }

    #[test]
    fn bathroom_tokens() {
        assert_eq!(extract_bathrooms("2 ba"), Some(2.0));
        assert_eq!(extract_bathrooms("1.5 Baths"), Some(1.5));
        assert_eq!(extract_bathrooms("3 bathrooms"), Some(3.0));
        // "basement" must not read as a bath unit
        assert_eq!(extract_bathrooms("2 basement rooms"), None);
    }

    #[test]
    fn square_feet_strips_commas() {
        assert_eq!(extract_square_feet("1,850 sqft"), Some(1850));
        assert_eq!(extract_square_feet("950 sq ft"), Some(950));
        assert_eq!(extract_square_feet("12,400 square feet"), Some(12400));
    }

    #[test]
    fn square_feet_skips_lot_area() {
        assert_eq!(extract_square_feet("6,098 sq ft lot · 1,420 sqft"), Some(1420));
        assert_eq!(extract_square_feet("6,098 sq ft lot"), None);
    }

    #[test]
    fn square_feet_ignores_lot_on_next_line() {
        assert_eq!(
            extract_square_feet("4 bd | 2 ba | 2,150 sqft\n\nLot: 0.25 acres"),
            Some(2150)
        );
    }

    #[test]
    fn square_feet_keeps_figure_before_lot_size_label() {
        assert_eq!(extract_square_feet("1,420 sq ft Lot size 6,000 sq ft"), Some(1420));
    }

    #[test]
    fn lot_size_units() {
        assert_eq!(extract_lot_size("Lot: 1.5 Acres").as_deref(), Some("1.5 Acres"));
        assert_eq!(extract_lot_size("1 acre parcel").as_deref(), Some("1 acre"));
        assert_eq!(extract_lot_size("6,098 sq ft lot").as_deref(), Some("6,098 sq ft lot"));
        assert_eq!(extract_lot_size("2,000 sqft"), None);
    }

    #[test]
    fn year_built_after_phrase() {
        assert_eq!(extract_year_built("Year built: 1985"), Some(1985));
        assert_eq!(extract_year_built("Built in 2004"), Some(2004));
        assert_eq!(extract_year_built("Built\n\nFacts: 1,200 sqft, 1972"), Some(1972));
        assert_eq!(extract_year_built("Renovated 2019"), None);
    }

    #[test]
    fn year_built_takes_any_later_year() {
        // false positive risk: the span is non-greedy but unbounded
        assert_eq!(
            extract_year_built("Built-in shelving. Listed 2023. Constructed 1950"),
            Some(2023)
        );
    }

    #[test]
    fn property_type_follows_priority() {
        assert_eq!(
            extract_property_type("Townhouse style condo near the park"),
            Some(PropertyType::Condo)
        );
        assert_eq!(
            extract_property_type("MOBILE home on LAND"),
            Some(PropertyType::Land)
        );
        assert_eq!(
            extract_property_type("Multi-Family duplex"),
            Some(PropertyType::MultiFamily)
        );
        assert_eq!(extract_property_type("Apartment"), None);
    }

    #[test]
    fn property_type_substring_false_positive() {
        // substring matching reads "Highland" as land
        assert_eq!(
            extract_property_type("Located in Highland Park"),
            Some(PropertyType::Land)
        );
    }

    #[test]
    fn address_keeps_title_without_suffix() {
        assert_eq!(extract_address(Some("1 Elm St"), " | Zillow"), "1 Elm St");
        assert_eq!(extract_address(None, " | Zillow"), "");
    }

    #[test]
    fn markup_fills_missing_metadata() {
        let html = r#"<html><head>
            <title>9 Oak Ave, Austin, TX 78701 | Zillow</title>
            <meta name="description" content="Corner lot">
            <meta property="og:image" content="https://img.example/a.jpg">
            <meta property="og:image" content="https://img.example/b.jpg">
        </head><body></body></html>"#;
        let mut metadata = FetchMetadata {
            description: Some("From fetcher".to_string()),
            ..FetchMetadata::default()
        };
        fill_metadata_from_markup(&mut metadata, html);

        assert_eq!(metadata.title.as_deref(), Some("9 Oak Ave, Austin, TX 78701 | Zillow"));
        assert_eq!(metadata.description.as_deref(), Some("From fetcher"));
        assert_eq!(metadata.og_images.len(), 2);
    }

    #[test]
    fn markup_prefers_first_meta_tag() {
        let html = r#"<html><head>
            <meta property="og:title" content="First title">
            <meta property="og:title" content="Second title">
            <meta name="description" content="First description">
            <meta name="description" content="Second description">
        </head><body></body></html>"#;
        let mut metadata = FetchMetadata::default();
        fill_metadata_from_markup(&mut metadata, html);

        assert_eq!(metadata.title.as_deref(), Some("First title"));
        assert_eq!(metadata.description.as_deref(), Some("First description"));
    }
}
