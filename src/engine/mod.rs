// Engine module: bounded worker pool over rendering sessions, with
// positional aggregation of the results.

pub mod aggregator;
pub mod session;
mod worker;

pub use aggregator::BatchSummary;

use aggregator::ResultSlots;
use crate::browser::SessionFactory;
use crate::model::{ExtractionResult, ScrapeTask};
use crate::strategy::StrategyTable;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{info, warn};
use worker::{WorkerContext, worker_loop};

const DEADLINE_EXCEEDED: &str = "batch deadline exceeded";
const TASK_LOST: &str = "task did not complete";

#[derive(Debug, Clone, Copy)]
pub struct EngineSettings {
    /// Upper bound on simultaneously open rendering sessions.
    pub pool_size: usize,
    pub navigation_timeout: Duration,
    pub poll_interval: Duration,
    /// When set, tasks still unfinished after this long become `Error`
    /// records and their workers are aborted.
    pub batch_deadline: Option<Duration>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            pool_size: 4,
            navigation_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(250),
            batch_deadline: None,
        }
    }
}

pub struct ScrapeEngine {
    ctx: Arc<WorkerContext>,
}

impl ScrapeEngine {
    pub fn new(
        factory: Arc<dyn SessionFactory>,
        strategies: StrategyTable,
        settings: EngineSettings,
    ) -> Self {
        Self {
            ctx: Arc::new(WorkerContext {
                factory,
                strategies: Arc::new(strategies),
                settings,
            }),
        }
    }

    /// Scrapes every URL and returns one record per URL, in input order.
    pub async fn run_batch(&self, urls: Vec<String>) -> Vec<ExtractionResult> {
        if urls.is_empty() {
            info!("Empty batch, nothing to scrape");
            return Vec::new();
        }

        let settings = self.ctx.settings;
        let total = urls.len();
        let workers = settings.pool_size.max(1).min(total);
        info!("Starting batch: {} URLs, {} workers", total, workers);

        let queue = Arc::new(Mutex::new(
            urls.iter()
                .cloned()
                .map(|url| ScrapeTask { url })
                .enumerate()
                .collect::<VecDeque<_>>(),
        ));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut pool = JoinSet::new();
        for worker_id in 0..workers {
            pool.spawn(worker_loop(worker_id, queue.clone(), tx.clone(), self.ctx.clone()));
        }
        drop(tx);

        let mut slots = ResultSlots::new(total);
        let collect = async {
            while let Some((index, record)) = rx.recv().await {
                slots.place(index, record);
            }
        };

        let mut missing_reason = TASK_LOST;
        match settings.batch_deadline {
            Some(deadline) => {
                if timeout(deadline, collect).await.is_err() {
                    warn!("Batch deadline of {:?} exceeded, aborting unfinished tasks", deadline);
                    missing_reason = DEADLINE_EXCEEDED;
                    pool.abort_all();
                }
            }
            None => collect.await,
        }

        // Records sent just before the abort are still buffered.
        while let Ok((index, record)) = rx.try_recv() {
            slots.place(index, record);
        }
        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                if !e.is_cancelled() {
                    warn!("Worker terminated abnormally: {}", e);
                }
            }
        }

        let done = slots.filled();
        let results = slots.into_results(&urls, missing_reason);
        info!("Batch finished: {}/{} tasks completed", done, total);
        results
    }
}
