//! rjco-scraping: Rama Judicial "Consulta de Procesos" scraper
//!
//! Usage:
//!   rjco-scraping --text2search sura               - Search a party name in every city and entity
//!   rjco-scraping --text2search <DOCKET> --code    - Look up one process by docket number
//!   rjco-scraping --help                           - Show help

mod cli;
mod run;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use rjco_core::Config;
use rjco_portal::CancelFlag;
use tracing_subscriber::EnvFilter;

use crate::cli::Args;
use crate::run::{Job, RunStatus};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            return RunStatus::Aborted.into();
        }
    };

    // Initialize logging
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let job = match job(&args) {
        Ok(job) => job,
        Err(e) => {
            tracing::error!("{:#}", e);
            return RunStatus::Aborted.into();
        }
    };

    tracing::info!("Starting rjco-scraping...");
    tracing::info!("Portal: {}", config.portal.entry_url);

    run_job(config, job, args.output_file).await.into()
}

/// Configuration file, environment, then command line overrides
fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_toml_file(path)
            .with_context(|| format!("Failed to load {}", path.display()))?,
        None => Config::load()?,
    };

    if let Some(headless) = args.headless() {
        config.browser.headless = headless;
    }

    Ok(config)
}

fn job(args: &Args) -> anyhow::Result<Job> {
    let text = args.query().context("Failed to read the search text")?;
    Ok(if args.case_mode() {
        Job::CaseLookup { code: text }
    } else {
        Job::TextSearch { query: text }
    })
}

/// Run the blocking scraper on a worker thread; Ctrl+C asks it to stop
/// after the current step and still save what it gathered, a second
/// Ctrl+C exits right away
async fn run_job(config: Config, job: Job, output_base: String) -> RunStatus {
    let cancel = CancelFlag::new();
    let worker_cancel = cancel.clone();

    let worker = tokio::task::spawn_blocking(move || {
        run::execute(&config, &job, &output_base, worker_cancel)
    });

    let joined = match supervise(worker, &cancel, ctrl_c).await {
        Some(joined) => joined,
        None => {
            tracing::warn!("Aborting, results of this run are not saved");
            std::process::exit(i32::from(RunStatus::Interrupted.code()));
        }
    };

    match joined {
        Ok(status) => {
            tracing::info!("Exiting with status {:?}", status);
            status
        }
        Err(e) => {
            tracing::error!("Scraper thread failed: {}", e);
            RunStatus::Aborted
        }
    }
}

/// Resolves on Ctrl+C; never, if the handler cannot be installed
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Wait for `worker`, raising `cancel` on the first interrupt
///
/// Returns `None` if a second interrupt arrives before the worker ends.
async fn supervise<W, F, S>(mut worker: W, cancel: &CancelFlag, mut interrupt: F) -> Option<W::Output>
where
    W: Future + Unpin,
    F: FnMut() -> S,
    S: Future<Output = ()>,
{
    tokio::select! {
        done = &mut worker => return Some(done),
        () = interrupt() => {
            tracing::warn!("Stopping, partial results will be saved... (Ctrl+C again to abort)");
            cancel.cancel();
        }
    }

    tokio::select! {
        done = &mut worker => Some(done),
        () = interrupt() => None,
    }
}
