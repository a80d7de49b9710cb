//! healthwatchd: health monitor and recovery daemon.
//!
//! Usage:
//!   healthwatchd --check                      # one evaluation, exit 0/1
//!   healthwatchd --daemon                     # run the monitoring loop
//!   healthwatchd --config /path/to/config.json

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use healthwatch_core::config::DEFAULT_CONFIG_PATH;
use healthwatch_core::{CheckResult, Config};
use healthwatch_health::Evaluator;
use healthwatch_scheduler::{Monitor, Scheduler};

const DEFAULT_LOG_FILE: &str = "/var/log/pwnagotchi/health_monitor.log";
const DEFAULT_LOG_FILTER: &str = "info,healthwatch=debug";

#[derive(Parser, Debug)]
#[command(name = "healthwatchd", about = "Health monitor and auto-recovery daemon")]
struct Cli {
    /// Path to the JSON config file (created with defaults if missing).
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Run one health check, print it, and exit 0 when healthy, 1 otherwise.
    #[arg(long, conflicts_with = "daemon")]
    check: bool,

    /// Run the monitoring loop until interrupted.
    #[arg(long)]
    daemon: bool,

    /// Log file written alongside stderr.
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(&cli.log_file);

    let config = Config::load(&cli.config);

    if cli.daemon {
        run_daemon(&config).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let result = Evaluator::from_config(&config).run().await;
    print_result(&result)?;

    if cli.check && !result.is_healthy() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn print_result(result: &CheckResult) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(result).context("encoding check result")?;
    println!("{json}");
    Ok(())
}

async fn run_daemon(config: &Config) -> anyhow::Result<()> {
    info!(service = %config.service.name, api_url = %config.api_url, "starting health monitor");

    let monitor = Monitor::from_config(config).await;
    let mut scheduler = Scheduler::from_config(monitor, config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let loop_handle = tokio::spawn(async move {
        scheduler.run(shutdown_rx).await;
    });

    let signal = wait_for_shutdown().await;
    info!("shutdown signal received, stopping health monitor");
    let _ = shutdown_tx.send(true);
    loop_handle.await.context("monitor loop task failed")?;

    signal.context("listening for shutdown signal")?;
    info!("health monitor stopped");
    Ok(())
}

/// Resolves on ctrl-c or SIGTERM.
#[cfg(unix)]
async fn wait_for_shutdown() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = terminate.recv() => Ok(()),
    }
}

/// Resolves on ctrl-c.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// stderr always; the log file too when it can be opened.
fn init_logging(log_file: &Path) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let (file_layer, file_error) = match open_log_file(log_file) {
        Ok(file) => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        warn!(path = %log_file.display(), error = %e, "file logging disabled");
    }
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
