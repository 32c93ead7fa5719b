mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use binwatch_core::Monitor;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let Cli {
        mut global,
        command,
    } = cli;
    let cfg = config::load_config_or_default();
    config::apply_defaults(&mut global, &cfg.defaults);

    match command {
        // Config commands don't touch the backend
        Command::Config(args) => commands::config_cmd::handle(args, &global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "binwatch", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let mut monitor_config = config::build_monitor_config(&global, &cfg)?;
            match &cmd {
                Command::Watch(args) => {
                    if let Some(secs) = args.interval {
                        monitor_config.poll_interval = Duration::from_secs(secs.max(1));
                    }
                }
                // One-shot commands never start the timer.
                _ => monitor_config.poll_interval = Duration::ZERO,
            }
            tracing::debug!(backend = %monitor_config.url, "using backend");
            let monitor = Monitor::new(monitor_config)?;

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &monitor, &global).await;
            monitor.shutdown().await;
            result
        }
    }
}
