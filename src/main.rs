mod browser;
mod config;
mod engine;
mod extractor;
mod model;
mod strategy;
#[cfg(test)]
mod test_support;

use browser::{ChromiumFactory, HttpFactory, SessionFactory};
use config::{load_config, AppConfig, BackendKind};
use engine::{BatchSummary, ScrapeEngine};
use std::fs;
use std::sync::Arc;
use strategy::StrategyTable;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "config.json";

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Panic occurred: {}", panic_info);
    }));

    let config_path = std::env::var("SCRAPER_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = match load_config(&config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error: {}", e);
            std::process::exit(2);
        }
    };

    let Some(input_path) = std::env::args().nth(1) else {
        error!("Usage: mrp-sniper <url-list-file>");
        std::process::exit(2);
    };
    let urls = match read_urls(&input_path) {
        Ok(urls) => urls,
        Err(e) => {
            error!("Failed to read URL list {}: {}", input_path, e);
            std::process::exit(1);
        }
    };
    info!("Loaded {} URLs from {}", urls.len(), input_path);

    let factory = match build_factory(&config) {
        Ok(factory) => factory,
        Err(e) => {
            error!("Failed to set up {:?} backend: {}", config.backend, e);
            std::process::exit(1);
        }
    };

    let engine = ScrapeEngine::new(
        factory,
        StrategyTable::builtin(config.wait_timeouts()),
        config.engine_settings(),
    );
    let results = engine.run_batch(urls).await;

    let summary = BatchSummary::from_results(&results);
    info!(
        "Done: {} records, {} errors, per site: {:?}",
        summary.total, summary.errors, summary.by_site
    );

    match serde_json::to_string_pretty(&results) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            error!("Failed to serialize results: {}", e);
            std::process::exit(1);
        }
    }
}

fn build_factory(config: &AppConfig) -> Result<Arc<dyn SessionFactory>, model::SessionError> {
    match config.backend {
        BackendKind::Chromium => Ok(Arc::new(ChromiumFactory::new(config.headless))),
        BackendKind::Http => {
            if config.user_agents.is_empty() {
                warn!("No user agents configured, using the built-in one");
            }
            let factory = HttpFactory::new(
                std::time::Duration::from_secs(config.navigation_timeout_secs),
                config.user_agents.clone(),
            )?;
            Ok(Arc::new(factory))
        }
    }
}

/// One URL per line; blank lines are dropped.
fn read_urls(path: &str) -> std::io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(parse_url_list(&content))
}

fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
