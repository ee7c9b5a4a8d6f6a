//! CRM Jobs Library
//!
//! Periodic maintenance jobs against the CRM GraphQL API. Each job tick runs
//! one fixed query or mutation and appends timestamped records to its stream.

pub mod append_log;
pub mod background_jobs;
pub mod config;
pub mod graphql;

// Re-export commonly used types for convenience
pub use append_log::{AppendLog, FileAppendLog, StreamId};
pub use background_jobs::{JobOutcome, JobRunner, JobScheduler, JobSpec};
pub use config::AppConfig;
pub use graphql::{GraphQlClient, HttpTransport, RetryPolicy};
