//! # Pagerbell — PagerDuty On-Call Notifier
//!
//! Polls one PagerDuty schedule and tells you, through webhook, ntfy or
//! Pushover, when your on-call shift starts or is about to.
//!
//! Usage:
//!   pagerbell                              # Run until SIGINT/SIGTERM
//!   pagerbell --config ./pagerbell.toml    # Explicit config file
//!   pagerbell --once                       # One poll cycle, then exit

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use pagerbell_core::PagerbellConfig;
use pagerbell_core::traits::{Notifier, OnCallSource};
use pagerbell_core::types::Lifecycle;
use pagerbell_pagerduty::PagerDutyClient;
use pagerbell_scheduler::{Poller, PollerConfig, StateStore};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pagerbell",
    version,
    about = "🔔 Pagerbell — PagerDuty on-call shift notifier"
)]
struct Cli {
    /// TOML config file (default: ~/.pagerbell/config.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the state file path
    #[arg(long)]
    state_file: Option<String>,

    /// Run a single poll cycle and exit
    #[arg(long)]
    once: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn expand_path(p: &str) -> String {
    shellexpand::tilde(p).to_string()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "pagerbell=debug,pagerbell_scheduler=debug,pagerbell_pagerduty=debug,pagerbell_channels=debug"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .init();

    let mut config =
        PagerbellConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(path) = cli.state_file {
        config.state_file = path;
    }

    tracing::info!("🔔 Pagerbell v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("   Schedule: {}", config.pagerduty.schedule_id);
    tracing::info!("   User:     {}", config.pagerduty.user_id);
    tracing::info!("   Interval: {}s", config.check_interval_secs);
    if let Some(backend) = config.notification.backend {
        tracing::info!("   Backend:  {backend}");
    }
    if let Some(advance) = &config.advance_notification {
        tracing::info!("   Advance:  {advance}");
    }

    let source: Arc<dyn OnCallSource> = Arc::new(PagerDutyClient::from_config(&config.pagerduty)?);
    let notifier = pagerbell_channels::build_notifier(&config.notification)?;
    let store = StateStore::new(expand_path(&config.state_file));
    tracing::info!("   State:    {}", store.path().display());

    let poller = Poller::new(source, notifier.clone(), store, PollerConfig::from_config(&config)?);

    if cli.once {
        let mut state = poller.load_state()?;
        let report = poller.run_cycle(&mut state).await;
        tracing::info!(
            "Cycle done: on_call={:?} delivered={:?} failed={:?}",
            report.on_call,
            report.delivered,
            report.failed
        );
        return Ok(());
    }

    announce(notifier.as_ref(), Lifecycle::Started).await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut handle = tokio::spawn(async move { poller.run(shutdown_rx).await });

    let result = tokio::select! {
        joined = &mut handle => joined,
        signal = shutdown_signal() => {
            signal?;
            tracing::info!("🛑 Shutdown signal received, stopping poller...");
            let _ = shutdown_tx.send(true);
            handle.await
        }
    };

    finish(notifier.as_ref(), result.context("poller task panicked")?).await?;
    tracing::info!("👋 Pagerbell stopped");
    Ok(())
}

/// Send the will message after a clean stop. A fatal poller error exits
/// without it.
async fn finish(notifier: &dyn Notifier, outcome: pagerbell_core::Result<()>) -> Result<()> {
    outcome?;
    announce(notifier, Lifecycle::Stopping).await;
    Ok(())
}

/// Best-effort birth/will message.
async fn announce(notifier: &dyn Notifier, lifecycle: Lifecycle) {
    if !notifier.supports_lifecycle() {
        return;
    }
    match notifier.announce(lifecycle).await {
        Ok(()) => tracing::info!("📣 Sent {lifecycle} message via {}", notifier.name()),
        Err(e) => tracing::warn!("⚠️ Failed to send {lifecycle} message: {e}"),
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res.context("failed to listen for ctrl-c")?,
        _ = term.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c().await.context("failed to listen for ctrl-c")
}
