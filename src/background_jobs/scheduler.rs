use super::job::{JobOutcome, JobSpec};
use super::runner::JobRunner;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How long shutdown waits for in-flight ticks by default.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Default check interval when no job is registered.
const IDLE_CHECK: Duration = Duration::from_secs(60);

/// In-process interval trigger for the registered jobs.
///
/// Each due job is run on the blocking pool through the shared [`JobRunner`].
/// Different jobs run concurrently; a job whose previous tick is still in
/// flight is skipped until that tick finishes.
pub struct JobScheduler {
    runner: Arc<JobRunner>,
    jobs: Vec<Arc<dyn JobSpec>>,

    /// Next due instant per job id.
    next_runs: HashMap<&'static str, Instant>,

    /// Ticks in flight, keyed by job id.
    running_handles: HashMap<&'static str, JoinHandle<JobOutcome>>,

    /// Token to signal scheduler shutdown.
    shutdown_token: CancellationToken,

    /// How long shutdown waits for in-flight ticks.
    shutdown_grace: Duration,
}

impl JobScheduler {
    pub fn new(runner: Arc<JobRunner>, shutdown_token: CancellationToken) -> Self {
        Self {
            runner,
            jobs: Vec::new(),
            next_runs: HashMap::new(),
            running_handles: HashMap::new(),
            shutdown_token,
            shutdown_grace: SHUTDOWN_GRACE,
        }
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Upper bound on how long in-flight ticks are awaited after shutdown.
    /// The owner of the runtime should use the same bound when tearing it down.
    pub fn shutdown_grace(&self) -> Duration {
        self.shutdown_grace
    }

    /// Register a job. It becomes due immediately.
    pub fn register_job(&mut self, job: Arc<dyn JobSpec>) {
        info!(
            "Registering job: {} - {} (every {:?})",
            job.id(),
            job.description(),
            job.interval()
        );
        self.next_runs.insert(job.id(), Instant::now());
        self.jobs.push(job);
    }

    pub fn job_count(&self) -> usize {
        self.jobs.len()
    }

    /// Whether a tick of `job_id` is still in flight. Finished but unreaped
    /// ticks do not count.
    pub fn is_running(&self, job_id: &str) -> bool {
        self.running_handles
            .get(job_id)
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Main scheduler loop. Returns once the shutdown token is cancelled.
    pub async fn run(&mut self) {
        info!("Starting job scheduler with {} registered jobs", self.job_count());

        loop {
            self.reap_finished_ticks().await;

            let sleep_duration = self.time_until_next_job();
            debug!("Scheduler sleeping for {:?}", sleep_duration);

            tokio::select! {
                _ = tokio::time::sleep(sleep_duration) => {
                    self.reap_finished_ticks().await;
                    self.run_due_jobs();
                }
                _ = self.shutdown_token.cancelled() => {
                    info!("Scheduler received shutdown signal");
                    self.shutdown().await;
                    break;
                }
            }
        }

        info!("Job scheduler stopped");
    }

    fn time_until_next_job(&self) -> Duration {
        let now = Instant::now();
        self.next_runs
            .values()
            .map(|next| next.saturating_duration_since(now))
            .min()
            .unwrap_or(IDLE_CHECK)
    }

    /// Spawn every job whose next run is due.
    pub fn run_due_jobs(&mut self) {
        let now = Instant::now();
        let due: Vec<Arc<dyn JobSpec>> = self
            .jobs
            .iter()
            .filter(|job| self.next_runs.get(job.id()).is_some_and(|next| *next <= now))
            .cloned()
            .collect();

        for job in due {
            self.next_runs.insert(job.id(), now + job.interval());

            if self.is_running(job.id()) {
                warn!(
                    job = job.id(),
                    "Previous tick still running, skipping this one"
                );
                continue;
            }
            // The runner already logged the outcome of a finished, unreaped tick
            self.running_handles.remove(job.id());
            self.spawn_tick(job);
        }
    }

    fn spawn_tick(&mut self, job: Arc<dyn JobSpec>) {
        let job_id = job.id();
        let runner = Arc::clone(&self.runner);
        debug!(job = job_id, "Spawning tick");

        let handle = tokio::task::spawn_blocking(move || runner.run(job.as_ref()));
        self.running_handles.insert(job_id, handle);
    }

    /// Collect the outcome of every finished tick.
    pub async fn reap_finished_ticks(&mut self) {
        let finished: Vec<&'static str> = self
            .running_handles
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(id, _)| *id)
            .collect();

        for job_id in finished {
            if let Some(handle) = self.running_handles.remove(job_id) {
                report_tick(job_id, handle.await);
            }
        }
    }

    /// Gracefully shut down the scheduler.
    async fn shutdown(&mut self) {
        info!("Shutting down scheduler...");

        for (job_id, handle) in self.running_handles.drain() {
            info!("Waiting for job {} to complete...", job_id);
            match tokio::time::timeout(self.shutdown_grace, handle).await {
                Ok(result) => report_tick(job_id, result),
                Err(_) => warn!(
                    job = job_id,
                    "Tick did not finish within {:?}", self.shutdown_grace
                ),
            }
        }

        info!("Scheduler shutdown complete");
    }
}

fn report_tick(job_id: &str, result: Result<JobOutcome, tokio::task::JoinError>) {
    match result {
        Ok(outcome) => debug!(job = job_id, outcome = outcome.label(), "Tick finished"),
        // JobRunner contains panics itself; this only triggers on runtime shutdown
        Err(e) => error!(job = job_id, "Tick task failed: {}", e),
    }
}
