//! Command dispatch: bridges CLI args -> monitor calls -> output formatting.

pub mod bins;
pub mod config_cmd;
pub mod demo;
pub mod notifications;
pub mod stats;
pub mod status;
pub mod util;
pub mod watch;

use binwatch_core::Monitor;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, monitor: &Monitor, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(monitor, global).await,
        Command::Bins(args) => bins::handle(monitor, args, global).await,
        Command::Notifications(args) => notifications::handle(monitor, args, global).await,
        Command::Stats(args) => stats::handle(monitor, args, global).await,
        Command::Demo(args) => demo::handle(monitor, args, global).await,
        Command::Watch(_) => watch::handle(monitor, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
