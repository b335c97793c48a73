// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Infrastructure controller daemon (infrad)
//!
//! Seeds clusters from the settings file into the in-process store, runs the
//! reconcile controller against it and executes created jobs as local
//! subprocesses.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use infra_daemon::lifecycle::{self, Config, LifecycleError};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("infrad {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("infrad {}", env!("CARGO_PKG_VERSION"));
                println!("Infrastructure controller daemon - provisions and deprovisions clusters");
                println!();
                println!("USAGE:");
                println!("    infrad");
                println!();
                println!("ENVIRONMENT:");
                println!("    INFRAD_STATE_DIR       State directory (default ~/.local/state/infrad)");
                println!("    INFRAD_CONFIG          Settings file (default <state>/config.toml)");
                println!("    INFRAD_WORKERS         Number of sync workers");
                println!("    INFRAD_JOB_TIMEOUT_MS  Job command timeout");
                println!("    RUST_LOG               Log filter (default info)");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: infrad [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    // Written before tracing is set up so the marker always precedes this run's logs
    write_startup_marker(&config)?;
    let log_guard = setup_logging(&config)?;

    info!("Starting infrastructure controller daemon");

    let daemon = match lifecycle::startup(&config) {
        Ok(daemon) => daemon,
        Err(LifecycleError::LockFailed(_)) => {
            let pid = std::fs::read_to_string(&config.lock_path)
                .unwrap_or_default()
                .trim()
                .to_string();
            eprintln!("infrad is already running");
            if !pid.is_empty() {
                eprintln!("  pid: {pid}");
            }
            std::process::exit(1);
        }
        Err(e) => {
            write_startup_error(&config, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            return Err(e.into());
        }
    };

    let (stop_tx, stop_rx) = watch::channel(false);
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
            _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
        }
        let _ = stop_tx.send(true);
    });

    info!(
        workers = daemon.settings.workers,
        clusters = daemon.settings.clusters.len(),
        "Daemon ready"
    );
    println!("READY");

    daemon.run(stop_rx).await;
    daemon.shutdown();
    info!("Daemon stopped");
    Ok(())
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- infrad: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- infrad: starting (pid: ";

/// Write startup marker to log file (appends to existing log)
fn write_startup_marker(config: &Config) -> Result<(), LifecycleError> {
    use std::io::Write;

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;
    Ok(())
}

/// Write startup error synchronously; tracing is non-blocking and may not
/// flush before exit.
fn write_startup_error(config: &Config, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        config
            .log_path
            .file_name()
            .ok_or(LifecycleError::NoStateDir)?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
