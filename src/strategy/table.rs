use crate::model::Site;
use crate::strategy::{FieldRule, SiteStrategy, TextTransform, WaitTimeouts};
use reqwest::Url;

/// Result of resolving a URL against the table.
#[derive(Debug, Clone, Copy)]
pub enum Dispatch<'a> {
    Site(&'a SiteStrategy),
    /// No registered site claims the URL. Resolves to `"Unknown"` fields
    /// without touching a session.
    Unknown,
}

/// Ordered strategy registry. The first matching entry wins.
#[derive(Debug, Clone)]
pub struct StrategyTable {
    entries: Vec<SiteStrategy>,
}

impl StrategyTable {
    pub fn new(entries: Vec<SiteStrategy>) -> Self {
        Self { entries }
    }

    pub fn builtin(timeouts: WaitTimeouts) -> Self {
        let WaitTimeouts { title, price } = timeouts;
        Self::new(vec![
            SiteStrategy {
                site: Site::Amazon,
                domains: vec!["amazon.in"],
                title: FieldRule::present("#productTitle", title),
                mrp: FieldRule::present("span.a-size-small.aok-offscreen", price)
                    .with_transform(TextTransform::Remove("M.R.P.: ")),
                offer_price: FieldRule::present("span.a-price-whole", price),
            },
            SiteStrategy {
                site: Site::Flipkart,
                domains: vec!["flipkart.com"],
                title: FieldRule::visible("span.B_NuCI", title),
                mrp: FieldRule::present(r"div.yRaY8j.A6\+E6v", price),
                offer_price: FieldRule::present("div.Nx9bqj.CxhGGd", price),
            },
            SiteStrategy {
                site: Site::OneMg,
                domains: vec!["1mg.com"],
                title: FieldRule::visible("h1.ProductTitle__product-title___3QMYH", title),
                mrp: FieldRule::present("span.DiscountDetails__discount-price___Mdcwo", price),
                offer_price: FieldRule::present("div.PriceDetails__discount-div___nb724", price),
            },
            SiteStrategy {
                site: Site::Netmeds,
                domains: vec!["netmeds.com"],
                title: FieldRule::visible("div.prodName h1.black-txt", title),
                mrp: FieldRule::present("span.final-price span", price),
                // The offer is whatever follows "MRP" in the price wrapper.
                offer_price: FieldRule::present("span.final-price", price)
                    .with_transform(TextTransform::AfterMarker("MRP")),
            },
        ])
    }

    pub fn resolve(&self, url: &str) -> Dispatch<'_> {
        let parsed = Url::parse(url).ok();
        let haystack = parsed
            .as_ref()
            .and_then(|u| u.host_str())
            .unwrap_or(url);

        self.entries
            .iter()
            .find(|strategy| strategy.matches(haystack))
            .map(Dispatch::Site)
            .unwrap_or(Dispatch::Unknown)
    }
}
