//! `binwatch-tui`: live terminal dashboard for a dustbin fleet.
//!
//! Built on [ratatui](https://ratatui.rs) and driven by `binwatch-core`'s
//! [`Monitor`](binwatch_core::Monitor). Three screens are reachable with the
//! number keys: Dashboard, Map and Settings.
//!
//! Logs go to a file under the binwatch data directory so they never
//! corrupt the terminal. A background data bridge forwards monitor events
//! into the TUI action loop.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
#[cfg(test)]
mod fixtures;
mod screen;
mod screens;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use binwatch_core::{Monitor, MonitorConfig};

use crate::app::App;

const LOG_FILE_NAME: &str = "binwatch-tui.log";

/// Terminal dashboard for an IoT dustbin fleet.
#[derive(Parser, Debug)]
#[command(name = "binwatch-tui", version, about)]
struct Cli {
    /// Config profile to use
    #[arg(short = 'p', long, env = "BINWATCH_PROFILE")]
    profile: Option<String>,

    /// Backend URL, overriding the profile (e.g. http://localhost:8000)
    #[arg(short = 'b', long, env = "BINWATCH_BACKEND")]
    backend: Option<String>,

    /// Poll interval in seconds, overriding the profile
    #[arg(short = 'i', long)]
    interval: Option<u64>,

    /// Log file path (defaults to binwatch-tui.log in the data directory)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-backed tracing. Nothing may be written to the terminal while the
/// UI owns it; hold the returned guard until exit so the log is flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "binwatch_tui={log_level},binwatch_core={log_level},binwatch_api={log_level}"
        ))
    });

    let log_file = cli
        .log_file
        .clone()
        .unwrap_or_else(|| binwatch_config::data_dir().join(LOG_FILE_NAME));
    let log_dir = log_file
        .parent()
        .map_or_else(std::env::temp_dir, std::path::Path::to_path_buf);
    let _ = std::fs::create_dir_all(&log_dir);
    let file_name = log_file
        .file_name()
        .map_or_else(|| LOG_FILE_NAME.into(), std::ffi::OsStr::to_os_string);

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    guard
}

/// Resolve the monitor config: flags > profile > `[defaults]`.
fn build_monitor_config(cli: &Cli) -> Result<MonitorConfig> {
    let cfg = binwatch_config::load_config_or_default();
    let mut config = binwatch_config::resolve_monitor_config(
        &cfg,
        cli.profile.as_deref(),
        cli.backend.as_deref(),
    )?;
    if let Some(secs) = cli.interval {
        config.poll_interval = Duration::from_secs(secs.max(1));
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks go in before the terminal is touched.
    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    let config = build_monitor_config(&cli)?;
    info!(
        backend = %config.url,
        poll_secs = config.poll_interval.as_secs(),
        "starting binwatch-tui"
    );

    let monitor = Monitor::new(config)?;
    let mut app = App::new(monitor);
    app.run().await?;

    Ok(())
}
