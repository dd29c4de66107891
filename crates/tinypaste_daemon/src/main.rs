//! Headless paste store daemon: opens the configured store and runs the
//! janitor until shutdown.

use std::sync::Arc;
use tinypaste_core::constants::DEFAULT_LOG_FILTER;
use tinypaste_core::{
    close_store, open_store, Config, Janitor, JanitorConfig, PasteStore, SweepOutcome,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct CliFlags {
    help: bool,
    sweep_once: bool,
}

fn parse_cli_flags(args: &[String]) -> anyhow::Result<CliFlags> {
    let mut flags = CliFlags::default();
    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" => flags.help = true,
            "--sweep-once" => flags.sweep_once = true,
            value if value.starts_with('-') => {
                anyhow::bail!(
                    "Unknown option: '{}'. Use --help to see supported options.",
                    value
                );
            }
            value => {
                anyhow::bail!(
                    "Unexpected positional argument: '{}'. Use --help to see supported options.",
                    value
                );
            }
        }
    }
    Ok(flags)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cli_flags = parse_cli_flags(&args)?;

    if cli_flags.help {
        print_help();
        return Ok(());
    }

    let config = Config::from_env();
    let store = open_store(&config.store())?;

    if cli_flags.sweep_once {
        let swept = run_sweep_once(store.clone(), config.janitor()).await;
        close_store(Some(store.as_ref()))?;
        println!("Removed {} expired paste(s)", swept?);
        return Ok(());
    }

    let shutdown = CancellationToken::new();
    let janitor = Janitor::new(store.clone(), config.janitor()).start(shutdown.clone());
    tracing::info!(
        backend = %config.backend,
        path = %config.db_path.display(),
        "tinypaste daemon running; press Ctrl+C to stop"
    );

    shutdown_signal().await;
    tracing::info!("Shutdown requested");
    shutdown.cancel();

    if let Err(err) = janitor.await {
        tracing::error!("Janitor task ended abnormally: {}", err);
    }

    close_store(Some(store.as_ref()))?;
    tracing::info!("Store closed");
    Ok(())
}

/// One janitor sweep outside the timer loop, for maintenance runs.
async fn run_sweep_once(
    store: Arc<dyn PasteStore>,
    config: JanitorConfig,
) -> anyhow::Result<usize> {
    let janitor = Janitor::new(store, config);
    match janitor.sweep_once(&CancellationToken::new()).await {
        SweepOutcome::Removed(count) => Ok(count),
        SweepOutcome::Skipped => anyhow::bail!("Another sweep is already running"),
        SweepOutcome::TimedOut => {
            anyhow::bail!("Sweep did not finish within {:?}", config.timeout)
        }
        SweepOutcome::Failed(err) => Err(err.into()),
    }
}

fn print_help() {
    println!("tinypaste daemon\n");
    println!("Usage: tinypasted [OPTIONS]\n");
    println!("Options:");
    println!("  --sweep-once      Delete expired pastes once and exit");
    println!("  --help            Show this help message");
    println!("\nEnvironment variables:");
    println!("  DB_PATH                 Database path (default: ~/.cache/tinypaste/tinypaste.redb)");
    println!("  STORE_BACKEND           embedded | sqlite | memory (default: embedded)");
    println!("  JANITOR_INTERVAL_SECS   Seconds between sweeps (default: 60)");
    println!("  JANITOR_TIMEOUT_SECS    Per-sweep timeout in seconds (default: 5)");
    println!("  JANITOR_ALLOW_OVERLAP   Let a new sweep start while one is running");
    println!("  RUST_LOG                Log filter (default: {})", DEFAULT_LOG_FILTER);
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
