//! `govwatch` entry point.
//!
//! ## Modes
//!
//! - **Service mode** (default): poll forever on the configured interval
//!   until Ctrl+C or SIGTERM; an in-flight cycle finishes before exit.
//! - **`--once`**: run one cycle and exit; non-zero if the feed could not be
//!   fetched.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use govwatch_core::{CycleOutcome, WatchConfig};
use govwatch_service::{Cli, build_scheduler, init_tracing, shutdown_signal};
use tokio_util::sync::CancellationToken;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("govwatch failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn run(cli: Cli) -> anyhow::Result<()> {
    tracing::info!("govwatch v{} starting", env!("CARGO_PKG_VERSION"));

    let config = WatchConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    let scheduler = build_scheduler(&config).await?;

    if cli.once {
        return match scheduler.run_once().await {
            CycleOutcome::Completed(_) => Ok(()),
            CycleOutcome::Aborted(e) => Err(e).context("cycle aborted"),
        };
    }

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Signal received, stopping after the current cycle");
        signal_token.cancel();
    });

    let cycles = scheduler
        .spawn(shutdown)
        .await
        .context("scheduler task panicked")?;

    tracing::info!(cycles, "govwatch exiting cleanly");
    Ok(())
}
