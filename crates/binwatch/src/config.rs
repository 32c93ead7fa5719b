//! CLI configuration: thin wrapper around `binwatch_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--backend, --timeout, ...).

use std::time::Duration;

use clap::ValueEnum;

use binwatch_core::MonitorConfig;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use binwatch_config::{
    Config, Defaults, Profile, active_profile_name, config_path, load_config_or_default,
    save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Fill in `--output` / `--color` from config defaults when not given.
pub fn apply_defaults(global: &mut GlobalOpts, defaults: &Defaults) {
    if global.output.is_none() {
        global.output = OutputFormat::from_str(&defaults.output, true).ok();
    }
    if global.color.is_none() {
        global.color = ColorMode::from_str(&defaults.color, true).ok();
    }
}

/// Build the `MonitorConfig` for this invocation.
///
/// Flag overrides take priority over profile values, which take priority
/// over `[defaults]`.
pub fn build_monitor_config(global: &GlobalOpts, cfg: &Config) -> Result<MonitorConfig, CliError> {
    let resolved = binwatch_config::resolve_monitor_config(
        cfg,
        global.profile.as_deref(),
        global.backend.as_deref(),
    );
    let mut monitor_config = resolved.map_err(|e| match e {
        binwatch_config::ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
            name,
            available: available_profiles(cfg),
        },
        other => other.into(),
    })?;

    if let Some(secs) = global.timeout {
        if secs == 0 {
            return Err(CliError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        monitor_config.timeout = Duration::from_secs(secs);
    }
    Ok(monitor_config)
}

/// Comma-separated profile names, or `(none)`.
pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        "(none)".into()
    } else {
        cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
    }
}
