// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sprig Daemon (sprigd)
//!
//! Owns the scheduler: runs cycles and monitoring flows on their timers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use sprig_daemon::{read_status, startup, Config, Daemon, LifecycleError, Paths, CONFIG_FILE};

#[derive(Parser)]
#[command(
    name = "sprigd",
    version,
    about = "Sprig - hydroponics execution scheduler"
)]
struct Cli {
    /// Config file (defaults to ./sprig.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scheduler until SIGTERM or SIGINT
    Run,
    /// Run one manual check, wait for the work it started, and exit
    Tick,
    /// Print the scheduler status from persisted state as JSON
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let explicit = cli.config.is_some();
    let config_path = cli.config.unwrap_or_else(|| PathBuf::from(CONFIG_FILE));
    let config = Config::load(&config_path, explicit)?;
    let base = match config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir()?,
    };
    let paths = config.paths(&base)?;

    match cli.command {
        Command::Status => {
            let report = read_status(&paths, chrono::Utc::now())?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Run => {
            let (daemon, _log_guard) = start(&config, &paths)?;
            run(daemon, &config).await
        }
        Command::Tick => {
            let (daemon, _log_guard) = start(&config, &paths)?;
            tick(daemon, &config).await
        }
    }
}

/// Marker, logging, then startup; the guard must outlive the daemon
fn start(
    config: &Config,
    paths: &Paths,
) -> Result<(Daemon, tracing_appender::non_blocking::WorkerGuard)> {
    // Written before tracing exists, so a reader can find this attempt in the log
    write_startup_marker(&paths.log)?;
    let log_guard = setup_logging(&paths.log)?;

    info!("Starting sprigd, state in {}", paths.state_dir.display());

    match startup(config, paths) {
        Ok(daemon) => Ok((daemon, log_guard)),
        Err(e) => {
            // Write error synchronously (tracing is non-blocking and may not flush in time)
            write_startup_error(&paths.log, &e);
            error!("Failed to start daemon: {}", e);
            drop(log_guard);
            Err(e.into())
        }
    }
}

async fn run(daemon: Daemon, config: &Config) -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!("Daemon ready");
    println!("READY");

    let timers = Arc::clone(&daemon.scheduler).run_timers();
    tokio::select! {
        () = timers => {}
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
    }

    daemon.shutdown(config.shutdown_grace).await;
    info!("Daemon stopped");
    Ok(())
}

async fn tick(daemon: Daemon, config: &Config) -> Result<()> {
    let report = daemon.scheduler.trigger_manual_check().await?;
    for key in &report.cycles_started {
        info!(cycle = %key, "cycle started by manual check");
    }
    for key in &report.overruns {
        info!(cycle = %key, "cycle over budget");
    }
    daemon.scheduler.wait_idle().await;

    println!("{}", serde_json::to_string_pretty(&daemon.scheduler.status())?);
    daemon.shutdown(config.shutdown_grace).await;
    Ok(())
}

/// Startup marker prefix written to log before anything else.
/// Full format: "--- sprigd: starting (pid: 12345) ---"
pub const STARTUP_MARKER_PREFIX: &str = "--- sprigd: starting (pid: ";

fn write_startup_marker(log_path: &Path) -> Result<(), LifecycleError> {
    use std::io::Write;

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;
    writeln!(file, "{}{}) ---", STARTUP_MARKER_PREFIX, std::process::id())?;
    Ok(())
}

fn write_startup_error(log_path: &Path, error: &LifecycleError) {
    use std::io::Write;

    let Ok(mut file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    else {
        return;
    };
    let _ = writeln!(file, "ERROR Failed to start daemon: {}", error);
}

fn setup_logging(
    log_path: &Path,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let (Some(dir), Some(file)) = (log_path.parent(), log_path.file_name()) else {
        return Err(LifecycleError::NoStateDir);
    };
    let file_appender = tracing_appender::rolling::never(dir, file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
