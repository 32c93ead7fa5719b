//! Backend health probe.

use serde::Serialize;

use binwatch_core::{BackendStatus, Monitor};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output::{self, Painter};

#[derive(Serialize)]
struct StatusView {
    backend: String,
    #[serde(flatten)]
    status: BackendStatus,
}

pub async fn handle(monitor: &Monitor, global: &GlobalOpts) -> Result<(), CliError> {
    let status = monitor.backend_status().await?;
    let view = StatusView {
        backend: monitor.config().url.to_string(),
        status,
    };

    let painter = Painter::new(&global.color_mode());
    let out = output::render_single(
        &global.format(),
        &view,
        |v| {
            let state = if v.status.is_active() {
                painter.hue(binwatch_core::Hue::Green, &v.status.status)
            } else {
                painter.hue(binwatch_core::Hue::Red, &v.status.status)
            };
            [
                format!("Backend:  {}", v.backend),
                format!("Status:   {state}"),
                format!("Message:  {}", v.status.message),
                format!("Bins:     {}", v.status.bins_count),
            ]
            .join("\n")
        },
        |v| v.status.status.clone(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
