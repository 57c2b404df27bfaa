use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use snoofeeder::config::expand_home;
use snoofeeder::feed::HttpFeedReader;
use snoofeeder::publish::RedditConnector;
use snoofeeder::storage::LedgerStore;
use snoofeeder::sync::{config_paths, DriverOptions, Orchestrator, PersistPolicy, RunStatus};

const DEFAULT_OUTPUT_DIR: &str = "~/.snoofeeder";

#[derive(Parser, Debug)]
#[command(
    name = "snoofeeder",
    version,
    about = "Mirror RSS/Atom feeds to a subreddit"
)]
struct Args {
    /// Load a config file. Can be used multiple times.
    #[arg(short, long = "config", value_name = "FILE")]
    configs: Vec<PathBuf>,

    /// Directory holding ledgers (and configs when none are given)
    #[arg(short, long, value_name = "DIR", default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// Increase verbosity. Can be used multiple times.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Seconds to wait before retrying a rate limited submission
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    backoff_secs: u64,

    /// Write the ledger after every submission instead of once per batch
    #[arg(long)]
    persist_each: bool,
}

/// Log filter for a `-v` count. `RUST_LOG` wins when set.
fn log_filter(verbose: u8) -> EnvFilter {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return EnvFilter::from_default_env();
    }
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    EnvFilter::new(level)
}

async fn run(args: Args) -> Result<RunStatus> {
    let output_dir = expand_home(&args.output);
    let paths = config_paths(&args.configs, &output_dir).with_context(|| {
        format!(
            "Failed to list configurations in '{}'",
            output_dir.display()
        )
    })?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("snoofeeder/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let reader = HttpFeedReader::new(client.clone());
    let connector = RedditConnector::new(client);
    let store = LedgerStore::new(&output_dir);
    let options = DriverOptions {
        backoff: Duration::from_secs(args.backoff_secs),
        persist: if args.persist_each {
            PersistPolicy::EverySubmission
        } else {
            PersistPolicy::EndOfBatch
        },
    };

    let report = Orchestrator::new(&reader, &connector, &store, options)
        .run(&paths)
        .await;

    let status = report.status();
    match status {
        RunStatus::Success => tracing::info!(
            submitted = report.submitted(),
            "Everything up to date."
        ),
        RunStatus::PartialFailure => tracing::warn!(
            failed = report.failed(),
            total = report.configs.len(),
            "Some configurations failed"
        ),
        RunStatus::NoWork => {}
    }
    Ok(status)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(args.verbose))
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(status) => ExitCode::from(status.exit_code()),
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Run aborted");
            ExitCode::from(RunStatus::PartialFailure.exit_code())
        }
    }
}
