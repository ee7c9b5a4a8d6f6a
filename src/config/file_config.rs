use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Core settings (can override CLI)
    pub graphql_url: Option<String>,
    pub log_dir: Option<String>,

    // Feature configs
    pub retry: Option<RetryConfig>,
    pub jobs: Option<JobsConfig>,
    pub log_streams: Option<LogStreamsConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: Option<u32>,
    pub attempt_timeout_secs: Option<u64>,
    pub initial_backoff_ms: Option<u64>,
    pub max_backoff_ms: Option<u64>,
    pub backoff_multiplier: Option<f64>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct JobsConfig {
    pub heartbeat_interval_secs: Option<u64>,
    pub low_stock_interval_secs: Option<u64>,
    pub weekly_report_interval_secs: Option<u64>,
    pub order_reminders_interval_secs: Option<u64>,
    pub low_stock_threshold: Option<i64>,
    pub restock_amount: Option<i64>,
    pub reminder_lookback_days: Option<u32>,
}

/// Per-stream file targets. Each overrides `log_dir` for its stream.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct LogStreamsConfig {
    pub heartbeat: Option<String>,
    pub stock: Option<String>,
    pub report: Option<String>,
    pub reminders: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}
