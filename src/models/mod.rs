use serde::{Deserialize, Serialize};

/// Closed set of property categories, in match priority order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PropertyType {
    #[serde(rename = "Single Family")]
    SingleFamily,
    Condo,
    Townhouse,
    #[serde(rename = "Multi-Family")]
    MultiFamily,
    Land,
    Mobile,
}

impl PropertyType {
    /// Priority order used when a page mentions more than one category
    pub const PRIORITY: [PropertyType; 6] = [
        PropertyType::SingleFamily,
        PropertyType::Condo,
        PropertyType::Townhouse,
        PropertyType::MultiFamily,
        PropertyType::Land,
        PropertyType::Mobile,
    ];

    /// Lowercase keyword searched for in page text
    pub fn keyword(&self) -> &'static str {
        match self {
            PropertyType::SingleFamily => "single family",
            PropertyType::Condo => "condo",
            PropertyType::Townhouse => "townhouse",
            PropertyType::MultiFamily => "multi-family",
            PropertyType::Land => "land",
            PropertyType::Mobile => "mobile",
        }
    }
}

/// Attributes extracted from a listing page. Every field is optional on its own.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PropertyRecord {
    pub address: String,
    pub price: Option<String>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f32>,
    pub square_feet: Option<u32>,
    pub lot_size: Option<String>,
    pub year_built: Option<u16>,
    pub property_type: Option<PropertyType>,
    pub description: String,
    pub images: Vec<String>,
}

impl PropertyRecord {
    /// True when at least one listing attribute was found.
    /// Address, description and images come from page metadata and do not count.
    pub fn has_attributes(&self) -> bool {
        self.price.is_some()
            || self.bedrooms.is_some()
            || self.bathrooms.is_some()
            || self.square_feet.is_some()
            || self.lot_size.is_some()
            || self.year_built.is_some()
            || self.property_type.is_some()
    }
}

/// Result of one scrape request
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScrapeOutcome {
    pub success: bool,
    /// URL the caller asked for
    pub url: String,
    /// URL the data actually came from
    pub final_url: String,
    pub property: PropertyRecord,
    pub raw_content: String,
    pub search_performed: bool,
    /// Data was pulled from a page that is not a canonical listing
    pub unexpected_page: bool,
}

/// Structured street address supplied by a caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddressRequest {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl AddressRequest {
    pub fn display(&self) -> String {
        format!("{}, {}, {} {}", self.address, self.city, self.state, self.zip)
    }
}

/// Direct listing URL supplied by a caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UrlRequest {
    pub url: String,
}

/// One entry of a batch request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum PropertyRequest {
    Address(AddressRequest),
    Url(UrlRequest),
}
