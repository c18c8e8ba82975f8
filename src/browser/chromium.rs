use crate::browser::traits::{RenderingSession, SessionFactory, WaitCondition};
use crate::model::SessionError;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

// Single DOM look-up evaluated in the page. Always returns an object so the
// result survives by-value transfer.
const PROBE_SCRIPT: &str = r#"(() => {
  let el;
  try { el = document.querySelector(__SELECTOR__); } catch (e) { return { status: "invalid", text: "" }; }
  if (!el) return { status: "miss", text: "" };
  if (__VISIBLE__) {
    const style = window.getComputedStyle(el);
    const rect = el.getBoundingClientRect();
    if (style.display === "none" || style.visibility === "hidden" || rect.width === 0 || rect.height === 0) {
      return { status: "miss", text: "" };
    }
  }
  return { status: "hit", text: el.innerText || el.textContent || "" };
})()"#;

#[derive(Debug, Deserialize)]
struct ProbeOutcome {
    status: String,
    text: String,
}

/// Launches one headless Chromium per session.
pub struct ChromiumFactory {
    headless: bool,
}

impl ChromiumFactory {
    pub fn new(headless: bool) -> Self {
        Self { headless }
    }

    fn browser_config(&self) -> Result<BrowserConfig, SessionError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .args(vec!["--disable-gpu", "--disable-dev-shm-usage"]);
        if !self.headless {
            builder = builder.with_head();
        }
        builder.build().map_err(SessionError::Open)
    }
}

#[async_trait::async_trait]
impl SessionFactory for ChromiumFactory {
    async fn open(&self) -> Result<Box<dyn RenderingSession>, SessionError> {
        let (browser, mut handler) = Browser::launch(self.browser_config()?)
            .await
            .map_err(|e| SessionError::Open(e.to_string()))?;

        // The CDP connection only makes progress while its handler is polled.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser event error: {}", e);
                }
            }
        });

        let page = browser.new_page("about:blank").await;
        let mut session = ChromiumSession {
            browser: Some(browser),
            page: None,
            handler_task: Some(handler_task),
        };
        match page {
            Ok(page) => {
                session.page = Some(page);
                Ok(Box::new(session))
            }
            Err(e) => {
                session.close().await;
                Err(SessionError::Open(format!("failed to create page: {}", e)))
            }
        }
    }
}

pub struct ChromiumSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler_task: Option<JoinHandle<()>>,
}

#[async_trait::async_trait]
impl RenderingSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        let page = self.page.as_ref().ok_or(SessionError::NotNavigated)?;
        page.goto(url).await.map_err(|e| SessionError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        Ok(())
    }

    async fn probe(
        &mut self,
        selector: &str,
        condition: WaitCondition,
    ) -> Result<Option<String>, SessionError> {
        let page = self.page.as_ref().ok_or(SessionError::NotNavigated)?;
        let quoted = serde_json::to_string(selector)
            .map_err(|_| SessionError::InvalidSelector(selector.to_string()))?;
        let visible = matches!(condition, WaitCondition::Visible);
        let script = PROBE_SCRIPT
            .replace("__SELECTOR__", &quoted)
            .replace("__VISIBLE__", if visible { "true" } else { "false" });

        let outcome: ProbeOutcome = page
            .evaluate(script)
            .await
            .map_err(|e| SessionError::Query(e.to_string()))?
            .into_value()
            .map_err(|e| SessionError::Query(e.to_string()))?;

        match outcome.status.as_str() {
            "hit" => Ok(Some(outcome.text)),
            "miss" => Ok(None),
            "invalid" => Err(SessionError::InvalidSelector(selector.to_string())),
            other => Err(SessionError::Query(format!("unexpected probe status `{}`", other))),
        }
    }

    async fn close(&mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("Page close failed: {}", e);
            }
        }
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("Browser close failed: {}", e);
            }
            if let Err(e) = browser.wait().await {
                warn!("Failed to reap browser process: {}", e);
            }
        }
        if let Some(task) = self.handler_task.take() {
            task.abort();
        }
    }
}
