// Static-HTML backend: one GET per navigation, CSS selectors against the
// fetched document. No JavaScript runs, so client-rendered fields stay
// unavailable.
use crate::browser::traits::{RenderingSession, SessionFactory, WaitCondition};
use crate::model::SessionError;
use rand::seq::IndexedRandom;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

const FALLBACK_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) MrpSniperBot/0.1";

pub struct HttpFactory {
    client: Client,
    user_agents: Vec<String>,
}

impl HttpFactory {
    pub fn new(request_timeout: Duration, user_agents: Vec<String>) -> Result<Self, SessionError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| SessionError::Open(e.to_string()))?;
        Ok(Self { client, user_agents })
    }

    fn pick_user_agent(&self) -> String {
        self.user_agents
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| FALLBACK_USER_AGENT.to_string())
    }
}

#[async_trait::async_trait]
impl SessionFactory for HttpFactory {
    async fn open(&self) -> Result<Box<dyn RenderingSession>, SessionError> {
        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            user_agent: self.pick_user_agent(),
            html: None,
        }))
    }
}

pub struct HttpSession {
    client: Client,
    user_agent: String,
    html: Option<String>,
}

impl HttpSession {
    #[cfg(test)]
    pub(crate) fn with_html(html: &str) -> Self {
        Self {
            client: Client::new(),
            user_agent: FALLBACK_USER_AGENT.to_string(),
            html: Some(html.to_string()),
        }
    }
}

#[async_trait::async_trait]
impl RenderingSession for HttpSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        let navigation_error = |reason: String| SessionError::Navigation {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| navigation_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(navigation_error(format!("HTTP {}", status)));
        }

        let body = response.text().await.map_err(|e| navigation_error(e.to_string()))?;
        self.html = Some(body);
        Ok(())
    }

    async fn probe(
        &mut self,
        selector: &str,
        condition: WaitCondition,
    ) -> Result<Option<String>, SessionError> {
        let html = self.html.as_deref().ok_or(SessionError::NotNavigated)?;
        query_text(html, selector, condition)
    }

    async fn close(&mut self) {
        self.html = None;
    }

    fn is_live(&self) -> bool {
        false
    }
}

// `Html` is not `Send`, so the document is parsed and dropped without
// crossing an await point.
fn query_text(
    html: &str,
    selector: &str,
    condition: WaitCondition,
) -> Result<Option<String>, SessionError> {
    let parsed = Selector::parse(selector)
        .map_err(|_| SessionError::InvalidSelector(selector.to_string()))?;
    let document = Html::parse_document(html);

    // Only the first match counts, as in a live browser's visibility wait.
    let found = document.select(&parsed).next().filter(|element| match condition {
        WaitCondition::Present => true,
        WaitCondition::Visible => !is_hidden(element),
    });

    Ok(found.map(|element| {
        element
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }))
}

fn is_hidden(element: &ElementRef) -> bool {
    std::iter::once(*element)
        .chain(element.ancestors().filter_map(ElementRef::wrap))
        .any(|el| {
            let value = el.value();
            if value.attr("hidden").is_some() {
                return true;
            }
            value
                .attr("style")
                .map(|style| {
                    let compact: String = style
                        .chars()
                        .filter(|c| !c.is_whitespace())
                        .collect::<String>()
                        .to_lowercase();
                    compact.contains("display:none") || compact.contains("visibility:hidden")
                })
                .unwrap_or(false)
        })
}
