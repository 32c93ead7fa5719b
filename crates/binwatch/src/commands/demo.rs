//! Demo data controls.

use binwatch_core::Monitor;

use crate::cli::{DemoArgs, DemoCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle(monitor: &Monitor, args: DemoArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let message = match args.command {
        DemoCommand::Reset => {
            if !util::confirm(
                "Replace ALL backend data with a fresh demo fleet?",
                "demo reset",
                global.yes,
            )? {
                eprintln!("Aborted.");
                return Ok(());
            }
            let spinner = util::spinner("Resetting demo data...", global.quiet);
            let result = monitor.reset_demo_data().await;
            spinner.finish_and_clear();
            result?
        }
        DemoCommand::Simulate => {
            let spinner = util::spinner("Simulating sensor update...", global.quiet);
            let result = monitor.simulate_update().await;
            spinner.finish_and_clear();
            result?
        }
    };

    output::print_output(&message, global.quiet);
    Ok(())
}
