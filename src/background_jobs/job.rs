use super::context::JobContext;
use crate::append_log::{LogRecord, Severity, StreamId};
use crate::graphql::{ApiError, QueryDocument, RawResult, Variables};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Errors that end a job tick as a failure.
#[derive(Debug)]
pub enum JobError {
    /// The query could not be executed.
    Api(ApiError),
    /// The tick panicked while querying or interpreting.
    Aborted(String),
    /// One or more records could not be appended.
    Sink(String),
}

impl std::fmt::Display for JobError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobError::Api(err) => write!(f, "API call failed: {}", err),
            JobError::Aborted(msg) => write!(f, "Tick aborted: {}", msg),
            JobError::Sink(msg) => write!(f, "Failed to write records: {}", msg),
        }
    }
}

impl std::error::Error for JobError {}

/// Result of one tick. Returned to the trigger, never raised.
#[derive(Debug)]
pub enum JobOutcome {
    Success(Vec<LogRecord>),
    /// Some records in the result were malformed and skipped or defaulted.
    PartialSuccess {
        records: Vec<LogRecord>,
        warnings: Vec<String>,
    },
    Failure {
        records: Vec<LogRecord>,
        error: JobError,
    },
}

impl JobOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            JobOutcome::Success(_) => "success",
            JobOutcome::PartialSuccess { .. } => "partial_success",
            JobOutcome::Failure { .. } => "failure",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, JobOutcome::Failure { .. })
    }

    /// Records written during the tick, in write order.
    pub fn records(&self) -> &[LogRecord] {
        match self {
            JobOutcome::Success(records)
            | JobOutcome::PartialSuccess { records, .. }
            | JobOutcome::Failure { records, .. } => records,
        }
    }
}

/// A message a job wants written, before it is timestamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub severity: Severity,
    pub message: String,
}

impl Entry {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Ordered entries produced from a query result, plus the anomalies met on the way.
#[derive(Debug, Default)]
pub struct Interpretation {
    entries: Vec<Entry>,
    warnings: Vec<String>,
}

impl Interpretation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.entries.push(Entry::info(message));
    }

    /// Record an anomaly; it is written in place and turns the tick into a partial success.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        self.entries.push(Entry {
            severity: Severity::Warning,
            message: message.clone(),
        });
        self.warnings.push(message);
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn into_parts(self) -> (Vec<Entry>, Vec<String>) {
        (self.entries, self.warnings)
    }
}

/// Declarative description of a job: what to ask the API and how to read the answer.
///
/// Implementations do no I/O; [`super::JobRunner`] performs the call and writes
/// the records.
pub trait JobSpec: Send + Sync {
    /// Unique identifier, used as the correlation key in logs.
    fn id(&self) -> &'static str;

    /// Human-readable name.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Cadence at which the trigger should run this job.
    fn interval(&self) -> Duration;

    /// Stream receiving every record of this job.
    fn stream(&self) -> StreamId;

    fn query(&self) -> &QueryDocument;

    fn variables(&self, _ctx: &JobContext) -> Variables {
        Variables::new()
    }

    /// Entries written before the query runs, whatever its outcome.
    fn preamble(&self, _ctx: &JobContext) -> Vec<Entry> {
        Vec::new()
    }

    /// Turn a successful result into entries.
    fn interpret(&self, data: &RawResult, ctx: &JobContext) -> Interpretation;

    /// The single entry written when the query fails.
    fn failure_message(&self, error: &ApiError) -> String;
}

/// Decode `field` of `data` into `T`.
///
/// An absent or null field yields `T::default()`. A field of the wrong shape
/// also yields the default, with a warning.
pub fn decode_field<T>(data: &RawResult, field: &str, out: &mut Interpretation) -> T
where
    T: DeserializeOwned + Default,
{
    match data.get(field) {
        None | Some(Value::Null) => T::default(),
        Some(value) => match T::deserialize(value) {
            Ok(decoded) => decoded,
            Err(e) => {
                out.warn(format!("Ignoring malformed '{}' field: {}", field, e));
                T::default()
            }
        },
    }
}
