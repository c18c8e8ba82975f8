use crate::browser::{RenderingSession, SessionFactory};
use crate::engine::EngineSettings;
use crate::engine::session::SessionGuard;
use crate::extractor::extract_product;
use crate::model::{ExtractionResult, ProductFields, ScrapeTask, SessionError};
use crate::strategy::{Dispatch, SiteStrategy, StrategyTable};
use futures::FutureExt;
use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::time::timeout;
use tracing::{Instrument, debug, info, info_span, warn};

pub(crate) type TaskQueue = Arc<Mutex<VecDeque<(usize, ScrapeTask)>>>;

/// Everything a worker needs, shared read-only across the pool.
pub(crate) struct WorkerContext {
    pub factory: Arc<dyn SessionFactory>,
    pub strategies: Arc<StrategyTable>,
    pub settings: EngineSettings,
}

/// Pulls tasks until the queue is empty, sending each record back tagged
/// with its input index.
pub(crate) async fn worker_loop(
    worker_id: usize,
    queue: TaskQueue,
    results: mpsc::UnboundedSender<(usize, ExtractionResult)>,
    ctx: Arc<WorkerContext>,
) {
    let mut handled = 0usize;
    loop {
        let next = queue.lock().await.pop_front();
        let Some((index, task)) = next else { break };

        let span = info_span!("task", worker = worker_id, index, url = %task.url);
        let record = scrape_one(&task, &ctx).instrument(span).await;
        handled += 1;

        if results.send((index, record)).is_err() {
            debug!("Worker {}: result channel closed", worker_id);
            break;
        }
    }
    debug!("Worker {} done after {} tasks", worker_id, handled);
}

/// Turns one URL into one record. Never fails: every problem ends up in
/// the record.
pub(crate) async fn scrape_one(task: &ScrapeTask, ctx: &WorkerContext) -> ExtractionResult {
    let strategy = match ctx.strategies.resolve(&task.url) {
        Dispatch::Site(strategy) => strategy,
        Dispatch::Unknown => {
            info!("No site strategy matches, skipping");
            return ExtractionResult::unknown(&task.url);
        }
    };

    let session = match ctx.factory.open().await {
        Ok(session) => session,
        Err(e) => {
            warn!("Session could not be opened: {}", e);
            return ExtractionResult::failed(&task.url, e.to_string());
        }
    };

    let mut guard = SessionGuard::new(session);
    let outcome = AssertUnwindSafe(visit(guard.session(), strategy, &task.url, &ctx.settings))
        .catch_unwind()
        .await;
    guard.release().await;

    match outcome {
        Ok(Ok(fields)) => {
            info!(
                "Scraped {}: {} | MRP {} | offer {}",
                strategy.site.label(),
                fields.product_name,
                fields.mrp,
                fields.offer_price
            );
            ExtractionResult::extracted(strategy.site, &task.url, fields)
        }
        Ok(Err(e)) => {
            warn!("Scrape failed: {}", e);
            ExtractionResult::failed(&task.url, e.to_string())
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            warn!("Extraction panicked: {}", message);
            ExtractionResult::failed(&task.url, format!("extraction panicked: {}", message))
        }
    }
}

async fn visit(
    session: &mut dyn RenderingSession,
    strategy: &SiteStrategy,
    url: &str,
    settings: &EngineSettings,
) -> Result<ProductFields, SessionError> {
    match timeout(settings.navigation_timeout, session.navigate(url)).await {
        Ok(navigated) => navigated?,
        Err(_) => {
            return Err(SessionError::NavigationTimeout {
                url: url.to_string(),
                secs: settings.navigation_timeout.as_secs(),
            });
        }
    }
    Ok(extract_product(session, strategy, settings.poll_interval).await)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
