//! HPC ACM CLI
//!
//! Command-line client for the HPC ACM service: nodes, clusrun jobs and
//! diagnostic jobs.

mod commands;
mod config;
mod glob;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Time a cancelled command gets to report what it has before exiting
const CANCEL_GRACE: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(name = "hpc-acm")]
#[command(about = "HPC ACM command-line client", long_about = None)]
struct Cli {
    /// ACM REST API base URL (e.g. https://cluster/v1)
    #[arg(long, env = "HPC_ACM_HOST")]
    host: String,

    /// Milliseconds to sleep after a polling pass that finished nothing
    #[arg(long, env = "HPC_ACM_IDLE_BACKOFF_MS", default_value_t = 100)]
    idle_backoff_ms: u64,

    /// Give up on a missing task result after this many lookups
    #[arg(long, env = "HPC_ACM_RESULT_RETRIES")]
    result_retries: Option<u32>,

    /// Page size used when polling task output
    #[arg(long, env = "HPC_ACM_PAGE_SIZE", default_value_t = 1024)]
    page_size: u32,

    /// Stop waiting after this many seconds
    #[arg(long, env = "HPC_ACM_TIMEOUT")]
    timeout: Option<u64>,

    /// Do not draw a progress counter
    #[arg(long)]
    no_progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with listings on stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hpc_acm=warn,acm_ops=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        host: cli.host,
        idle_backoff: Duration::from_millis(cli.idle_backoff_ms),
        result_retries: cli.result_retries,
        page_size: cli.page_size,
        timeout: cli.timeout.map(Duration::from_secs),
        show_progress: !cli.no_progress,
    };
    config.validate()?;

    let cancel = CancellationToken::new();
    spawn_cancel_triggers(&cancel, config.timeout);

    // Waiting commands wind down on their own once cancelled; plain
    // requests are cut off after the grace period
    tokio::select! {
        result = handle_command(cli.command, &config, &cancel) => result,
        _ = async {
            cancel.cancelled().await;
            tokio::time::sleep(CANCEL_GRACE).await;
        } => anyhow::bail!("Cancelled"),
    }
}

/// Cancel on Ctrl-C, and after `timeout` when one is set
fn spawn_cancel_triggers(cancel: &CancellationToken, timeout: Option<Duration>) {
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, cancelling");
            token.cancel();
        }
    });

    if let Some(timeout) = timeout {
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            info!(seconds = timeout.as_secs(), "timeout reached, cancelling");
            token.cancel();
        });
    }
}
