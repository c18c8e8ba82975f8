use crate::engine::EngineSettings;
use crate::strategy::WaitTimeouts;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Chromium,
    Http,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub pool_size: usize,
    pub backend: BackendKind,
    pub headless: bool,
    pub navigation_timeout_secs: u64,
    pub title_wait_secs: u64,
    pub price_wait_secs: u64,
    pub poll_interval_ms: u64,
    pub batch_deadline_secs: Option<u64>,
    pub user_agents: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pool_size: 4,
            backend: BackendKind::Chromium,
            headless: true,
            navigation_timeout_secs: 30,
            title_wait_secs: 5,
            price_wait_secs: 5,
            poll_interval_ms: 250,
            batch_deadline_secs: None,
            user_agents: vec![
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".into(),
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".into(),
            ],
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool_size == 0 {
            return Err(ConfigError::Invalid("pool_size must be at least 1".into()));
        }
        let timeouts = [
            ("navigation_timeout_secs", self.navigation_timeout_secs),
            ("title_wait_secs", self.title_wait_secs),
            ("price_wait_secs", self.price_wait_secs),
            ("poll_interval_ms", self.poll_interval_ms),
            ("batch_deadline_secs", self.batch_deadline_secs.unwrap_or(1)),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{} must be greater than 0", name)));
            }
        }
        Ok(())
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            pool_size: self.pool_size,
            navigation_timeout: Duration::from_secs(self.navigation_timeout_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            batch_deadline: self.batch_deadline_secs.map(Duration::from_secs),
        }
    }

    pub fn wait_timeouts(&self) -> WaitTimeouts {
        WaitTimeouts {
            title: Duration::from_secs(self.title_wait_secs),
            price: Duration::from_secs(self.price_wait_secs),
        }
    }
}

/// Loads and validates the config. A missing file means defaults.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let config = match fs::read_to_string(path) {
        Ok(content) => serde_json::from_str(&content)?,
        Err(e) if e.kind() == ErrorKind::NotFound => AppConfig::default(),
        Err(e) => return Err(e.into()),
    };
    config.validate()?;
    Ok(config)
}
