//! Config subcommand handlers.

use std::io::IsTerminal;

use dialoguer::Input;
use serde::Serialize;
use tabled::Tabled;

use binwatch_core::config::DEFAULT_BACKEND_URL;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn save_config(cfg: &Config) -> Result<(), CliError> {
    let path = config::save_config(cfg)?;
    eprintln!("Saved {}", path.display());
    Ok(())
}

#[derive(Serialize)]
struct ProfileView {
    name: String,
    default: bool,
    #[serde(flatten)]
    profile: Profile,
}

#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "")]
    marker: &'static str,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Backend")]
    backend: String,
    #[tabled(rename = "Poll")]
    poll: String,
    #[tabled(rename = "Timeout")]
    timeout: String,
}

fn seconds(v: Option<u64>) -> String {
    v.map_or_else(|| "-".into(), |s| format!("{s}s"))
}

// ── Init ────────────────────────────────────────────────────────────

/// Gather a profile, interactively unless `--yes` was passed.
///
/// With `--yes` the profile name and backend come from `--profile` /
/// `--backend` (or their defaults) and nothing is prompted.
fn gather_profile(global: &GlobalOpts) -> Result<(String, Profile), CliError> {
    let default_name = global.profile.clone().unwrap_or_else(|| "default".into());
    let default_backend = global
        .backend
        .clone()
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.into());

    if global.yes {
        return Ok((default_name, Profile::new(default_backend)));
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: "config init".into(),
        });
    }

    let name: String = Input::new()
        .with_prompt("Profile name")
        .default(default_name)
        .interact_text()
        .map_err(prompt_err)?;

    let backend: String = Input::new()
        .with_prompt("Backend URL")
        .default(default_backend)
        .interact_text()
        .map_err(prompt_err)?;

    let poll_interval: u64 = Input::new()
        .with_prompt("Poll interval (seconds)")
        .default(config::Defaults::default().poll_interval)
        .interact_text()
        .map_err(prompt_err)?;

    let mut profile = Profile::new(backend);
    profile.poll_interval = Some(poll_interval);
    Ok((name, profile))
}

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    eprintln!("binwatch configuration");
    eprintln!("   Config path: {}\n", config::config_path().display());

    let (name, profile) = gather_profile(global)?;

    let mut cfg = config::load_config_or_default();
    // Reject bad URLs before anything is written.
    binwatch_config::profile_to_monitor_config(&profile, &cfg.defaults)?;

    let replaced = cfg.profiles.insert(name.clone(), profile).is_some();
    if cfg.profiles.len() == 1 || cfg.default_profile.is_none() {
        cfg.default_profile = Some(name.clone());
    }
    save_config(&cfg)?;

    let verb = if replaced { "Updated" } else { "Created" };
    output::print_output(&format!("{verb} profile '{name}'"), global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(global),

        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let active = config::active_profile_name(&cfg, global.profile.as_deref());
            let out = output::render_single(
                &global.format(),
                &cfg,
                |c| {
                    let body = toml::to_string_pretty(c).unwrap_or_default();
                    format!(
                        "# {}\n# active profile: {active}\n\n{body}",
                        config::config_path().display()
                    )
                },
                |_| active.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            let active = config::active_profile_name(&cfg, None);
            let views: Vec<ProfileView> = cfg
                .profiles
                .iter()
                .map(|(name, p)| ProfileView {
                    name: name.clone(),
                    default: *name == active,
                    profile: p.clone(),
                })
                .collect();
            let out = output::render_list(
                &global.format(),
                &views,
                |v| ProfileRow {
                    marker: if v.default { "*" } else { "" },
                    name: v.name.clone(),
                    backend: v.profile.backend.clone(),
                    poll: seconds(v.profile.poll_interval),
                    timeout: seconds(v.profile.timeout),
                },
                |v| v.name.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            save_config(&cfg)?;
            output::print_output(&format!("Default profile set to '{name}'"), global.quiet);
            Ok(())
        }
    }
}
