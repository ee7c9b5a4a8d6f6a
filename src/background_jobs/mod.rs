//! Background job definitions and execution.
//!
//! Jobs are declarative [`JobSpec`]s: a query document, the stream their
//! records go to and a pure interpretation of the result. [`JobRunner`] runs
//! one tick of a job and [`JobScheduler`] triggers ticks at each job's cadence.

mod clock;
mod context;
mod info;
mod job;
pub mod jobs;
mod runner;
mod scheduler;

pub use clock::{Clock, FixedClock, SystemClock};
pub use context::JobContext;
pub use info::{format_interval, JobInfo};
pub use job::{decode_field, Entry, Interpretation, JobError, JobOutcome, JobSpec};
pub use runner::JobRunner;
pub use scheduler::JobScheduler;
