mod file_config;

pub use file_config::{FileConfig, JobsConfig, LogStreamsConfig, RetryConfig};

use crate::append_log::StreamId;
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};

pub const DEFAULT_GRAPHQL_URL: &str = "http://localhost:8000/graphql";
pub const DEFAULT_LOG_DIR: &str = "/tmp";

/// Longest accepted reminder window: ten years.
pub const MAX_REMINDER_LOOKBACK_DAYS: u32 = 3650;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub graphql_url: Option<String>,
    pub log_dir: Option<PathBuf>,
    pub max_attempts: Option<u32>,
    pub attempt_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub graphql_url: String,
    pub retry: RetrySettings,
    pub jobs: JobsSettings,
    pub log_streams: LogStreamsSettings,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let graphql_url = file
            .graphql_url
            .or_else(|| cli.graphql_url.clone())
            .unwrap_or_else(|| DEFAULT_GRAPHQL_URL.to_string());
        if !(graphql_url.starts_with("http://") || graphql_url.starts_with("https://")) {
            bail!("graphql_url must be an http(s) URL, got {:?}", graphql_url);
        }

        let log_dir = file
            .log_dir
            .map(PathBuf::from)
            .or_else(|| cli.log_dir.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR));

        // Retry settings - merge file config with CLI and defaults
        let retry_file = file.retry.unwrap_or_default();
        let retry_defaults = RetrySettings::default();
        let retry = RetrySettings {
            max_attempts: retry_file
                .max_attempts
                .or(cli.max_attempts)
                .unwrap_or(retry_defaults.max_attempts),
            attempt_timeout_secs: retry_file
                .attempt_timeout_secs
                .or(cli.attempt_timeout_secs)
                .unwrap_or(retry_defaults.attempt_timeout_secs),
            initial_backoff_ms: retry_file
                .initial_backoff_ms
                .unwrap_or(retry_defaults.initial_backoff_ms),
            max_backoff_ms: retry_file
                .max_backoff_ms
                .unwrap_or(retry_defaults.max_backoff_ms),
            backoff_multiplier: retry_file
                .backoff_multiplier
                .unwrap_or(retry_defaults.backoff_multiplier),
        };
        retry.validate()?;

        let jobs_file = file.jobs.unwrap_or_default();
        let jobs_defaults = JobsSettings::default();
        let jobs = JobsSettings {
            heartbeat_interval_secs: jobs_file
                .heartbeat_interval_secs
                .unwrap_or(jobs_defaults.heartbeat_interval_secs),
            low_stock_interval_secs: jobs_file
                .low_stock_interval_secs
                .unwrap_or(jobs_defaults.low_stock_interval_secs),
            weekly_report_interval_secs: jobs_file
                .weekly_report_interval_secs
                .unwrap_or(jobs_defaults.weekly_report_interval_secs),
            order_reminders_interval_secs: jobs_file
                .order_reminders_interval_secs
                .unwrap_or(jobs_defaults.order_reminders_interval_secs),
            low_stock_threshold: jobs_file
                .low_stock_threshold
                .unwrap_or(jobs_defaults.low_stock_threshold),
            restock_amount: jobs_file
                .restock_amount
                .unwrap_or(jobs_defaults.restock_amount),
            reminder_lookback_days: jobs_file
                .reminder_lookback_days
                .unwrap_or(jobs_defaults.reminder_lookback_days),
        };
        jobs.validate()?;

        // Explicit per-stream paths win over log_dir
        let streams_file = file.log_streams.unwrap_or_default();
        let in_dir = |explicit: Option<String>, stream: StreamId| {
            explicit
                .map(PathBuf::from)
                .unwrap_or_else(|| log_dir.join(LogStreamsSettings::default_file_name(stream)))
        };
        let log_streams = LogStreamsSettings {
            heartbeat: in_dir(streams_file.heartbeat, StreamId::Heartbeat),
            stock: in_dir(streams_file.stock, StreamId::Stock),
            report: in_dir(streams_file.report, StreamId::Report),
            reminders: in_dir(streams_file.reminders, StreamId::Reminders),
        };

        Ok(Self {
            graphql_url,
            retry,
            jobs,
            log_streams,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub attempt_timeout_secs: u64,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
}

impl RetrySettings {
    fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }
        if self.attempt_timeout_secs == 0 {
            bail!("retry.attempt_timeout_secs must be greater than 0");
        }
        if !(self.backoff_multiplier.is_finite() && self.backoff_multiplier >= 1.0) {
            bail!(
                "retry.backoff_multiplier must be at least 1.0, got {}",
                self.backoff_multiplier
            );
        }
        Ok(())
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout_secs: 30,
            initial_backoff_ms: 500,
            max_backoff_ms: 10_000,
            backoff_multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobsSettings {
    pub heartbeat_interval_secs: u64,
    pub low_stock_interval_secs: u64,
    pub weekly_report_interval_secs: u64,
    pub order_reminders_interval_secs: u64,
    pub low_stock_threshold: i64,
    pub restock_amount: i64,
    pub reminder_lookback_days: u32,
}

impl JobsSettings {
    fn validate(&self) -> Result<()> {
        for (name, secs) in [
            ("heartbeat_interval_secs", self.heartbeat_interval_secs),
            ("low_stock_interval_secs", self.low_stock_interval_secs),
            ("weekly_report_interval_secs", self.weekly_report_interval_secs),
            ("order_reminders_interval_secs", self.order_reminders_interval_secs),
        ] {
            if secs == 0 {
                bail!("jobs.{} must be greater than 0", name);
            }
        }
        if self.low_stock_threshold < 0 {
            bail!("jobs.low_stock_threshold must not be negative");
        }
        if self.restock_amount <= 0 {
            bail!("jobs.restock_amount must be greater than 0");
        }
        if self.reminder_lookback_days == 0 {
            bail!("jobs.reminder_lookback_days must be greater than 0");
        }
        if self.reminder_lookback_days > MAX_REMINDER_LOOKBACK_DAYS {
            bail!(
                "jobs.reminder_lookback_days must be at most {}, got {}",
                MAX_REMINDER_LOOKBACK_DAYS,
                self.reminder_lookback_days
            );
        }
        Ok(())
    }
}

impl Default for JobsSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: 5 * 60,
            low_stock_interval_secs: 12 * 60 * 60,
            weekly_report_interval_secs: 7 * 24 * 60 * 60,
            order_reminders_interval_secs: 24 * 60 * 60,
            low_stock_threshold: 10,
            restock_amount: 10,
            reminder_lookback_days: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogStreamsSettings {
    pub heartbeat: PathBuf,
    pub stock: PathBuf,
    pub report: PathBuf,
    pub reminders: PathBuf,
}

impl LogStreamsSettings {
    pub fn default_file_name(stream: StreamId) -> &'static str {
        match stream {
            StreamId::Heartbeat => "crm_heartbeat_log.txt",
            StreamId::Stock => "low_stock_updates_log.txt",
            StreamId::Report => "crm_report_log.txt",
            StreamId::Reminders => "order_reminders_log.txt",
        }
    }

    pub fn path(&self, stream: StreamId) -> &Path {
        match stream {
            StreamId::Heartbeat => &self.heartbeat,
            StreamId::Stock => &self.stock,
            StreamId::Report => &self.report,
            StreamId::Reminders => &self.reminders,
        }
    }

    /// `(stream, path)` pairs for every stream.
    pub fn targets(&self) -> Vec<(StreamId, PathBuf)> {
        StreamId::ALL
            .iter()
            .map(|stream| (*stream, self.path(*stream).to_path_buf()))
            .collect()
    }
}
