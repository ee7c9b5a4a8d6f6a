use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crm_jobs::background_jobs::{format_interval, jobs, JobInfo, SystemClock};
use crm_jobs::config::{AppConfig, CliConfig, FileConfig};
use crm_jobs::{FileAppendLog, GraphQlClient, HttpTransport, JobRunner, JobScheduler, RetryPolicy};

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("CRM_JOBS_GIT_HASH"), ")");

#[derive(Parser, Debug)]
#[clap(version = VERSION, about = "Periodic maintenance jobs for the CRM GraphQL API")]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override CLI flags.
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// URL of the CRM GraphQL endpoint.
    #[clap(long, global = true)]
    pub graphql_url: Option<String>,

    /// Maximum number of attempts per API call, including the first one.
    #[clap(long, global = true)]
    pub max_attempts: Option<u32>,

    /// Timeout in seconds for a single API attempt.
    #[clap(long, global = true)]
    pub attempt_timeout_secs: Option<u64>,

    /// Directory holding all record streams, using their default file names.
    #[clap(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one tick of a job and exit.
    Run {
        /// Job id, as printed by `list`.
        job: String,
    },
    /// List the available jobs.
    List {
        /// Print the listing as JSON.
        #[clap(long)]
        json: bool,
    },
    /// Trigger every job at its own cadence until interrupted.
    Schedule,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            graphql_url: self.graphql_url.clone(),
            log_dir: self.log_dir.clone(),
            max_attempts: self.max_attempts,
            attempt_timeout_secs: self.attempt_timeout_secs,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}...", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    match &cli_args.command {
        Command::List { json } => {
            list_jobs(&config, *json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Run { job } => run_once(&config, job),
        Command::Schedule => {
            schedule(&config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn build_runner(config: &AppConfig) -> Result<Arc<JobRunner>> {
    info!("Using GraphQL endpoint {}", config.graphql_url);
    let transport = HttpTransport::new(&config.graphql_url)?;
    let client = GraphQlClient::new(Arc::new(transport), RetryPolicy::new(&config.retry));
    let log = FileAppendLog::new(config.log_streams.targets());
    Ok(Arc::new(JobRunner::new(
        client,
        Arc::new(log),
        Arc::new(SystemClock),
    )))
}

fn list_jobs(config: &AppConfig, json: bool) -> Result<()> {
    let infos: Vec<JobInfo> = jobs::all_jobs(&config.jobs)
        .iter()
        .map(|job| JobInfo::from(job.as_ref()))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&infos)?);
        return Ok(());
    }

    for job in infos {
        println!(
            "{:<20} {:<22} stream={:<10} every {}",
            job.id,
            job.name,
            job.stream,
            format_interval(job.interval_secs)
        );
    }
    Ok(())
}

fn run_once(config: &AppConfig, job_id: &str) -> Result<ExitCode> {
    let Some(job) = jobs::find_job(&config.jobs, job_id) else {
        let known: Vec<&str> = jobs::all_jobs(&config.jobs)
            .iter()
            .map(|job| job.id())
            .collect();
        bail!("Unknown job {:?}, expected one of: {}", job_id, known.join(", "));
    };

    let runner = build_runner(config)?;
    let outcome = runner.run(job.as_ref());

    if outcome.is_failure() {
        error!("Job {} failed", job.id());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn schedule(config: &AppConfig) -> Result<()> {
    // Built outside the runtime: the blocking HTTP client must not be created
    // or dropped from async code.
    let runner = build_runner(config)?;
    let shutdown_token = CancellationToken::new();

    let mut scheduler = JobScheduler::new(Arc::clone(&runner), shutdown_token.clone());
    for job in jobs::all_jobs(&config.jobs) {
        scheduler.register_job(job);
    }

    let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
    runtime.block_on(async {
        let token = shutdown_token.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl-C, shutting down...");
                    token.cancel();
                }
                Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
            }
        });

        scheduler.run().await;
    });
    // Ticks stuck past the grace period are abandoned rather than awaited
    runtime.shutdown_timeout(scheduler.shutdown_grace());

    Ok(())
}
