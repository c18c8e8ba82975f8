// Core structs: ScrapeTask, ExtractionResult, error types
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Value recorded for a field whose element could not be extracted.
pub const NOT_AVAILABLE: &str = "Not Available";
/// Value recorded for every field of a URL no site strategy claims.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone)]
pub struct ScrapeTask {
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Site {
    #[serde(rename = "AMAZON")]
    Amazon,
    #[serde(rename = "FLIPKART")]
    Flipkart,
    #[serde(rename = "1MG")]
    OneMg,
    #[serde(rename = "NETMEDS")]
    Netmeds,
    #[serde(rename = "UNKNOWN")]
    Unknown,
    #[serde(rename = "ERROR")]
    Error,
}

impl Site {
    pub fn label(&self) -> &'static str {
        match self {
            Site::Amazon => "AMAZON",
            Site::Flipkart => "FLIPKART",
            Site::OneMg => "1MG",
            Site::Netmeds => "NETMEDS",
            Site::Unknown => "UNKNOWN",
            Site::Error => "ERROR",
        }
    }
}

/// The three product fields pulled from a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFields {
    pub product_name: String,
    pub mrp: String,
    pub offer_price: String,
}

/// One output record per input URL.
///
/// Product fields are `None` only on `Site::Error` records, which carry
/// `error` instead.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionResult {
    #[serde(rename = "Website")]
    pub site: Site,
    #[serde(rename = "URL")]
    pub url: String,
    #[serde(rename = "Product Name", skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(rename = "MRP", skip_serializing_if = "Option::is_none")]
    pub mrp: Option<String>,
    #[serde(rename = "Offer Price", skip_serializing_if = "Option::is_none")]
    pub offer_price: Option<String>,
    #[serde(rename = "Error", skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "Scraped At")]
    pub scraped_at: DateTime<Utc>,
}

impl ExtractionResult {
    pub fn extracted(site: Site, url: &str, fields: ProductFields) -> Self {
        Self {
            site,
            url: url.to_string(),
            product_name: Some(fields.product_name),
            mrp: Some(fields.mrp),
            offer_price: Some(fields.offer_price),
            error: None,
            scraped_at: Utc::now(),
        }
    }

    pub fn unknown(url: &str) -> Self {
        Self::extracted(
            Site::Unknown,
            url,
            ProductFields {
                product_name: UNKNOWN.into(),
                mrp: UNKNOWN.into(),
                offer_price: UNKNOWN.into(),
            },
        )
    }

    pub fn failed(url: &str, error: impl Into<String>) -> Self {
        Self {
            site: Site::Error,
            url: url.to_string(),
            product_name: None,
            mrp: None,
            offer_price: None,
            error: Some(error.into()),
            scraped_at: Utc::now(),
        }
    }
}

/// Failures of the rendering session itself. Any of these turns the whole
/// record into an `Error` record.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to open session: {0}")]
    Open(String),
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("navigation to {url} timed out after {secs}s")]
    NavigationTimeout { url: String, secs: u64 },
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),
    #[error("DOM query failed: {0}")]
    Query(String),
    #[error("session used before navigation")]
    NotNavigated,
}

/// Failures of a single field. Never escapes the record: mapped to
/// [`NOT_AVAILABLE`] by the caller.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no element matched `{selector}` within {waited_ms}ms")]
    Timeout { selector: String, waited_ms: u128 },
    #[error("marker `{0}` not found in extracted text")]
    MarkerMissing(String),
    #[error(transparent)]
    Lookup(#[from] SessionError),
}
