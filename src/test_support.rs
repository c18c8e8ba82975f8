// In-memory rendering backend with scripted pages, used by the engine and
// extractor tests.
use crate::browser::{RenderingSession, SessionFactory, WaitCondition};
use crate::model::SessionError;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::time::{Instant, sleep};

#[derive(Debug, Clone)]
enum ScriptedElement {
    Text { text: String, appears_after: Duration },
    Hang,
}

/// What a scripted URL looks like once navigated to.
#[derive(Debug, Clone, Default)]
pub struct PageScript {
    elements: HashMap<String, ScriptedElement>,
    load_time: Duration,
    navigation_error: Option<String>,
    panic_on_probe: bool,
}

impl PageScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn element(self, selector: &str, text: &str) -> Self {
        self.element_after(selector, text, Duration::ZERO)
    }

    pub fn element_after(mut self, selector: &str, text: &str, after: Duration) -> Self {
        self.elements.insert(
            selector.to_string(),
            ScriptedElement::Text {
                text: text.to_string(),
                appears_after: after,
            },
        );
        self
    }

    pub fn hanging(mut self, selector: &str) -> Self {
        self.elements.insert(selector.to_string(), ScriptedElement::Hang);
        self
    }

    pub fn load_time(mut self, load_time: Duration) -> Self {
        self.load_time = load_time;
        self
    }

    pub fn navigation_error(mut self, reason: &str) -> Self {
        self.navigation_error = Some(reason.to_string());
        self
    }

    pub fn panicking(mut self) -> Self {
        self.panic_on_probe = true;
        self
    }
}

#[derive(Debug, Default)]
pub struct SessionStats {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub live: AtomicUsize,
    pub peak: AtomicUsize,
    pub probes: AtomicUsize,
}

impl SessionStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn probes(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

pub struct ScriptedFactory {
    pages: Arc<HashMap<String, PageScript>>,
    fail_open: bool,
    open_delay: Duration,
    pub stats: Arc<SessionStats>,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self {
            pages: Arc::new(HashMap::new()),
            fail_open: false,
            open_delay: Duration::ZERO,
            stats: Arc::new(SessionStats::default()),
        }
    }

    pub fn page(mut self, url: &str, script: PageScript) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.to_string(), script);
        self
    }

    pub fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = delay;
        self
    }
}

#[async_trait::async_trait]
impl SessionFactory for ScriptedFactory {
    async fn open(&self) -> Result<Box<dyn RenderingSession>, SessionError> {
        if self.fail_open {
            return Err(SessionError::Open("browser binary not found".into()));
        }
        sleep(self.open_delay).await;

        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        let live = self.stats.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak.fetch_max(live, Ordering::SeqCst);

        Ok(Box::new(ScriptedSession {
            pages: self.pages.clone(),
            stats: self.stats.clone(),
            current: None,
            closed: false,
        }))
    }
}

struct ScriptedSession {
    pages: Arc<HashMap<String, PageScript>>,
    stats: Arc<SessionStats>,
    current: Option<(PageScript, Instant)>,
    closed: bool,
}

#[async_trait::async_trait]
impl RenderingSession for ScriptedSession {
    async fn navigate(&mut self, url: &str) -> Result<(), SessionError> {
        let script = self.pages.get(url).cloned().ok_or_else(|| SessionError::Navigation {
            url: url.to_string(),
            reason: "net::ERR_NAME_NOT_RESOLVED".into(),
        })?;
        sleep(script.load_time).await;
        if let Some(reason) = &script.navigation_error {
            return Err(SessionError::Navigation {
                url: url.to_string(),
                reason: reason.clone(),
            });
        }
        self.current = Some((script, Instant::now()));
        Ok(())
    }

    async fn probe(
        &mut self,
        selector: &str,
        _condition: WaitCondition,
    ) -> Result<Option<String>, SessionError> {
        self.stats.probes.fetch_add(1, Ordering::SeqCst);
        let (script, loaded_at) = self.current.as_ref().ok_or(SessionError::NotNavigated)?;
        if script.panic_on_probe {
            panic!("renderer crashed while querying {}", selector);
        }
        match script.elements.get(selector) {
            None => Ok(None),
            Some(ScriptedElement::Hang) => std::future::pending().await,
            Some(ScriptedElement::Text { text, appears_after }) => {
                if loaded_at.elapsed() >= *appears_after {
                    Ok(Some(text.clone()))
                } else {
                    Ok(None)
                }
            }
        }
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.stats.closed.fetch_add(1, Ordering::SeqCst);
            self.stats.live.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

/// Serves fixed HTML pages on 127.0.0.1 until the test ends. Unknown paths
/// answer 404. Returns the base URL.
pub async fn serve_pages(routes: Vec<(&'static str, u16, &'static str)>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let routes = Arc::new(routes);

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let routes = routes.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&request);
                let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                let (status, body) = routes
                    .iter()
                    .find(|(route, _, _)| *route == path)
                    .map(|(_, status, body)| (*status, *body))
                    .unwrap_or((404, "not found"));
                let reason = if status == 200 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    base
}

/// Base URL of a local port nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
