use super::clock::Clock;
use super::context::JobContext;
use super::job::{Entry, JobError, JobOutcome, JobSpec};
use crate::append_log::{AppendLog, LogRecord};
use crate::graphql::GraphQlClient;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Executes one tick of a job: query, interpret, record.
///
/// `run` never panics and never returns an error; every path ends in at
/// least one appended record and a [`JobOutcome`]. The runner keeps no
/// per-tick state, so it can run any job concurrently with itself.
pub struct JobRunner {
    client: GraphQlClient,
    log: Arc<dyn AppendLog>,
    clock: Arc<dyn Clock>,
}

/// Records written so far in a tick and the append failures met.
#[derive(Default)]
struct Written {
    records: Vec<LogRecord>,
    sink_errors: Vec<String>,
}

impl JobRunner {
    pub fn new(client: GraphQlClient, log: Arc<dyn AppendLog>, clock: Arc<dyn Clock>) -> Self {
        Self { client, log, clock }
    }

    pub fn run(&self, job: &dyn JobSpec) -> JobOutcome {
        let start_time = Instant::now();
        let ctx = JobContext::new(self.clock.now());
        let mut written = Written::default();

        debug!(job = job.id(), "Starting tick");

        let preamble = job.preamble(&ctx);
        self.write(job, preamble, &mut written);

        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            let variables = job.variables(&ctx);
            self.client
                .execute(job.query(), &variables)
                .map(|data| job.interpret(&data, &ctx))
        }));

        let (failure, warnings) = match attempt {
            Ok(Ok(interpretation)) => {
                let (entries, warnings) = interpretation.into_parts();
                self.write(job, entries, &mut written);
                (None, warnings)
            }
            Ok(Err(api_error)) => {
                let message = job.failure_message(&api_error);
                self.write(job, vec![Entry::error(message)], &mut written);
                (Some(JobError::Api(api_error)), Vec::new())
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                let message = format!("{} aborted: {}", job.name(), reason);
                self.write(job, vec![Entry::error(message)], &mut written);
                (Some(JobError::Aborted(reason)), Vec::new())
            }
        };

        let Written {
            records,
            sink_errors,
        } = written;

        let failure = failure.or_else(|| {
            (!sink_errors.is_empty()).then(|| JobError::Sink(sink_errors.join("; ")))
        });

        let outcome = match failure {
            Some(error) => JobOutcome::Failure { records, error },
            None if warnings.is_empty() => JobOutcome::Success(records),
            None => JobOutcome::PartialSuccess { records, warnings },
        };

        let elapsed = start_time.elapsed();
        match &outcome {
            JobOutcome::Success(records) => info!(
                job = job.id(),
                records = records.len(),
                "Job completed successfully in {:?}",
                elapsed
            ),
            JobOutcome::PartialSuccess { records, warnings } => warn!(
                job = job.id(),
                records = records.len(),
                warnings = warnings.len(),
                "Job completed with skipped records in {:?}",
                elapsed
            ),
            JobOutcome::Failure { error, .. } => {
                error!(job = job.id(), "Job failed after {:?}: {}", elapsed, error)
            }
        }

        outcome
    }

    /// Timestamp and append `entries` in order. Keeps going past append failures.
    fn write(&self, job: &dyn JobSpec, entries: Vec<Entry>, written: &mut Written) {
        let stream = job.stream();
        for entry in entries {
            let record = LogRecord::new(self.clock.now(), stream, entry.severity, entry.message);
            match self.log.append(stream, &record) {
                Ok(()) => written.records.push(record),
                Err(e) => {
                    error!(job = job.id(), %stream, "Failed to append record: {}", e);
                    written.sink_errors.push(e.to_string());
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
