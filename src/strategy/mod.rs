// Site strategies: which selectors to read on which site, and the table
// that picks one for a URL.

pub mod table;

pub use table::{Dispatch, StrategyTable};

use crate::browser::WaitCondition;
use crate::model::{ExtractError, Site};
use std::time::Duration;

/// Element wait budgets used when building the built-in table.
#[derive(Debug, Clone, Copy)]
pub struct WaitTimeouts {
    pub title: Duration,
    pub price: Duration,
}

impl Default for WaitTimeouts {
    fn default() -> Self {
        Self {
            title: Duration::from_secs(5),
            price: Duration::from_secs(5),
        }
    }
}

/// Post-processing applied to a successfully extracted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextTransform {
    None,
    /// Drops every occurrence of a literal label.
    Remove(&'static str),
    /// Keeps the text between the first occurrence of the marker and the
    /// next one (or the end).
    AfterMarker(&'static str),
}

impl TextTransform {
    pub fn apply(&self, text: &str) -> Result<String, ExtractError> {
        match self {
            TextTransform::None => Ok(text.trim().to_string()),
            TextTransform::Remove(label) => Ok(text.replace(label, "").trim().to_string()),
            TextTransform::AfterMarker(marker) => text
                .split(marker)
                .nth(1)
                .map(|rest| rest.trim().to_string())
                .ok_or_else(|| ExtractError::MarkerMissing(marker.to_string())),
        }
    }
}

/// How to find one field on a page.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub selector: &'static str,
    pub condition: WaitCondition,
    pub timeout: Duration,
    pub transform: TextTransform,
}

impl FieldRule {
    pub fn present(selector: &'static str, timeout: Duration) -> Self {
        Self {
            selector,
            condition: WaitCondition::Present,
            timeout,
            transform: TextTransform::None,
        }
    }

    pub fn visible(selector: &'static str, timeout: Duration) -> Self {
        Self {
            condition: WaitCondition::Visible,
            ..Self::present(selector, timeout)
        }
    }

    pub fn with_transform(mut self, transform: TextTransform) -> Self {
        self.transform = transform;
        self
    }
}

/// Selector bundle for one site. Immutable once built.
#[derive(Debug, Clone)]
pub struct SiteStrategy {
    pub site: Site,
    /// Host substrings that claim a URL for this site.
    pub domains: Vec<&'static str>,
    pub title: FieldRule,
    pub mrp: FieldRule,
    pub offer_price: FieldRule,
}

impl SiteStrategy {
    pub fn matches(&self, host: &str) -> bool {
        self.domains.iter().any(|domain| host.contains(domain))
    }
}
