//! Shared configuration for the binwatch CLI and TUI.
//!
//! TOML profiles naming a backend, global defaults for output and polling,
//! and translation to `binwatch_core::MonitorConfig`. Both binaries depend
//! on this crate; the CLI layers its `GlobalOpts` flags on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use binwatch_core::MonitorConfig;
use binwatch_core::config::DEFAULT_BACKEND_URL;

pub const ENV_PREFIX: &str = "BINWATCH_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named backend profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::ProfileNotFound { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Background poll period in seconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Notifications requested per poll.
    #[serde(default = "default_notification_limit")]
    pub notification_limit: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            notification_limit: default_notification_limit(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    binwatch_core::config::DEFAULT_TIMEOUT.as_secs()
}
fn default_poll_interval() -> u64 {
    binwatch_core::config::DEFAULT_POLL_INTERVAL.as_secs()
}
fn default_notification_limit() -> u32 {
    binwatch_core::config::DEFAULT_NOTIFICATION_LIMIT
}

/// A named backend profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Backend base URL (e.g., "http://localhost:8000").
    pub backend: String,

    /// Override timeout.
    pub timeout: Option<u64>,

    /// Override poll interval.
    pub poll_interval: Option<u64>,

    /// Override notification limit.
    pub notification_limit: Option<u32>,
}

impl Profile {
    pub fn new(backend: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            timeout: None,
            poll_interval: None,
            notification_limit: None,
        }
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "binwatch", "binwatch")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || dirs_fallback().join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory for log files and other runtime data.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(dirs_fallback, |dirs| dirs.data_local_dir().to_path_buf())
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("binwatch");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file + environment.
///
/// Nested keys use a double underscore in env vars, e.g.
/// `BINWATCH_DEFAULTS__POLL_INTERVAL=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(&path, cfg)?;
    Ok(path)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Translation to core config ──────────────────────────────────────

/// Pick the active profile name: explicit choice, then the configured
/// default, then `"default"`.
pub fn active_profile_name(cfg: &Config, requested: Option<&str>) -> String {
    requested
        .map(str::to_owned)
        .or_else(|| cfg.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

fn parse_backend(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|e| ConfigError::Validation {
        field: "backend".into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "backend".into(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

/// Build a `MonitorConfig` from a profile, falling back to `defaults`
/// for anything the profile leaves unset.
pub fn profile_to_monitor_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<MonitorConfig, ConfigError> {
    let url = parse_backend(&profile.backend)?;
    Ok(MonitorConfig {
        url,
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        poll_interval: Duration::from_secs(profile.poll_interval.unwrap_or(defaults.poll_interval)),
        notification_limit: profile
            .notification_limit
            .unwrap_or(defaults.notification_limit),
    })
}

/// Resolve the monitor config for `profile_name`, with an optional
/// backend URL override.
///
/// A missing profile is only an error when it was asked for explicitly;
/// otherwise the built-in local backend URL is used, so a fresh install
/// works without a config file.
pub fn resolve_monitor_config(
    cfg: &Config,
    profile_name: Option<&str>,
    backend_override: Option<&str>,
) -> Result<MonitorConfig, ConfigError> {
    let name = active_profile_name(cfg, profile_name);
    let mut profile = match cfg.profiles.get(&name) {
        Some(p) => p.clone(),
        None if profile_name.is_none() => Profile::new(DEFAULT_BACKEND_URL),
        None => return Err(ConfigError::ProfileNotFound { name }),
    };
    if let Some(url) = backend_override {
        profile.backend = url.to_owned();
    }
    profile_to_monitor_config(&profile, &cfg.defaults)
}
