//! Job harness wiring the real transport and file streams
//!
//! Each harness owns a temporary log directory and a frozen clock, and runs
//! jobs against a [`StubGraphQlServer`] exactly as the binary would.

use super::constants::*;
use super::server::StubGraphQlServer;
use chrono::{DateTime, Local, TimeZone};
use crm_jobs::append_log::{FileAppendLog, StreamId};
use crm_jobs::background_jobs::{jobs, FixedClock, JobOutcome, JobSpec};
use crm_jobs::config::{AppConfig, CliConfig, FileConfig, RetryConfig};
use crm_jobs::{GraphQlClient, HttpTransport, JobRunner, RetryPolicy};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Test time: 14 March 2025, 09:30:00 local.
pub fn test_now() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2025, 3, 14, 9, 30, 0)
        .single()
        .expect("unambiguous local test time")
}

pub struct JobHarness {
    pub config: AppConfig,
    pub clock: Arc<FixedClock>,
    pub runner: Arc<JobRunner>,

    // Keep the log directory alive until drop
    _log_dir: TempDir,
}

impl JobHarness {
    /// Harness pointed at `server`, with fast retries.
    pub fn new(server: &StubGraphQlServer) -> Self {
        Self::with_endpoint(&server.url)
    }

    pub fn with_endpoint(endpoint: &str) -> Self {
        let log_dir = TempDir::new().expect("Failed to create temp log dir");
        let cli = CliConfig {
            graphql_url: Some(endpoint.to_string()),
            log_dir: Some(log_dir.path().to_path_buf()),
            max_attempts: Some(TEST_MAX_ATTEMPTS),
            attempt_timeout_secs: Some(TEST_ATTEMPT_TIMEOUT_SECS),
        };
        let file_config = FileConfig {
            retry: Some(RetryConfig {
                initial_backoff_ms: Some(TEST_BACKOFF_MS),
                max_backoff_ms: Some(TEST_BACKOFF_MS * 4),
                ..Default::default()
            }),
            ..Default::default()
        };
        let config = AppConfig::resolve(&cli, Some(file_config)).expect("valid test config");

        let transport = HttpTransport::new(&config.graphql_url).expect("Failed to build transport");
        let client = GraphQlClient::new(Arc::new(transport), RetryPolicy::new(&config.retry));
        let log = FileAppendLog::new(config.log_streams.targets());
        let clock = Arc::new(FixedClock::new(test_now()));
        let runner = Arc::new(JobRunner::new(client, Arc::new(log), clock.clone()));

        Self {
            config,
            clock,
            runner,
            _log_dir: log_dir,
        }
    }

    pub fn job(&self, id: &str) -> Arc<dyn JobSpec> {
        jobs::find_job(&self.config.jobs, id).unwrap_or_else(|| panic!("unknown job {}", id))
    }

    /// Run one tick of job `id`.
    pub fn run(&self, id: &str) -> JobOutcome {
        self.runner.run(self.job(id).as_ref())
    }

    pub fn stream_path(&self, stream: StreamId) -> PathBuf {
        self.config.log_streams.path(stream).to_path_buf()
    }

    /// Lines currently in `stream`'s file. A missing file reads as empty.
    pub fn lines(&self, stream: StreamId) -> Vec<String> {
        match std::fs::read_to_string(self.stream_path(stream)) {
            Ok(content) => content.lines().map(str::to_string).collect(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => panic!("Failed to read {:?}: {}", self.stream_path(stream), e),
        }
    }

    /// Raw file content of `stream`, for checks on line termination.
    pub fn raw(&self, stream: StreamId) -> String {
        std::fs::read_to_string(self.stream_path(stream)).unwrap_or_default()
    }
}
