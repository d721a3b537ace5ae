//! `govwatch` process wiring.
//!
//! Collaborators are built exactly once here and handed to the engine; they
//! live for the rest of the process. Startup failures are fatal:
//! - configuration cannot be loaded,
//! - the store client cannot be constructed,
//! - the notification bot cannot authenticate.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use govwatch_core::{
    HttpProposalSource, ReconcileEngine, RedisStore, Scheduler, TelegramNotifier, WatchConfig,
};

/// Governance proposal watcher.
#[derive(Debug, Parser)]
#[command(name = "govwatch", version)]
pub struct Cli {
    /// Config file (defaults to $GOVWATCH_CONFIG, then ./config.yaml).
    #[arg(long = "config", short = 'c')]
    pub config: Option<PathBuf>,

    /// Run a single cycle and exit.
    #[arg(long = "once")]
    pub once: bool,
}

/// Install the fmt subscriber on stderr, filtered by `RUST_LOG` (default `info`).
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Construct every collaborator and the scheduler that drives them.
pub async fn build_scheduler(config: &WatchConfig) -> anyhow::Result<Scheduler> {
    let client = reqwest::Client::builder()
        .timeout(config.api.timeout)
        .user_agent(concat!("govwatch/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    let store = RedisStore::open(&config.store).context("failed to construct store client")?;
    tracing::info!(addr = %store.addr(), db_index = config.store.db_index, "Store client ready");

    let notifier = TelegramNotifier::connect(client.clone(), &config.telegram)
        .await
        .context("failed to authenticate notification bot")?;

    let source = HttpProposalSource::new(client, config.api.url.clone());
    tracing::info!(url = %source.url(), "Proposal feed configured");

    let engine = ReconcileEngine::new(
        Arc::new(source),
        Arc::new(store),
        Arc::new(notifier),
        config.explorer.url.clone(),
    );
    Ok(Scheduler::new(engine, config.ticker.interval))
}

/// Resolve when the process is asked to stop (Ctrl+C, or SIGTERM on unix).
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Cannot listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Cannot listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_flags() {
        let cli = Cli::parse_from(["govwatch", "--config", "/etc/govwatch.yaml", "--once"]);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/govwatch.yaml")));
        assert!(cli.once);

        let cli = Cli::parse_from(["govwatch"]);
        assert_eq!(cli.config, None);
        assert!(!cli.once);
    }
}
