//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use binwatch_config::ConfigError;
use binwatch_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 3;
    pub const NETWORK: i32 = 4;
    pub const BACKEND: i32 = 5;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connectivity ─────────────────────────────────────────────────

    #[error("Could not reach the backend: {reason}")]
    #[diagnostic(
        code(binwatch::network),
        help(
            "Check that the backend is running and reachable.\n\
             Override the URL with --backend, or raise --timeout for slow links."
        )
    )]
    Network { reason: String },

    // ── Backend responses ────────────────────────────────────────────

    #[error("Backend returned HTTP {status}: {message}")]
    #[diagnostic(code(binwatch::backend))]
    Backend { status: u16, message: String },

    #[error("Backend sent a response binwatch could not read: {reason}")]
    #[diagnostic(
        code(binwatch::malformed_response),
        help("The backend may be a different version. Run with -vv to see the request.")
    )]
    MalformedResponse { reason: String },

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(binwatch::not_found),
        help("Run: binwatch {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("{operation} is already in progress")]
    #[diagnostic(code(binwatch::busy), help("Wait for it to finish and try again."))]
    Busy { operation: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(binwatch::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(binwatch::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: binwatch config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(binwatch::config))]
    Config(ConfigError),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(binwatch::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────

    #[error(transparent)]
    #[diagnostic(code(binwatch::io))]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(binwatch::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(binwatch::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Network { .. } => exit_code::NETWORK,
            Self::Backend { .. } | Self::MalformedResponse { .. } => exit_code::BACKEND,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. }
            | Self::ProfileNotFound { .. }
            | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }

    /// Turn a backend 404 into a resource-specific `NotFound`; anything
    /// else goes through the generic mapping.
    pub fn not_found_or(
        err: CoreError,
        resource_type: &str,
        identifier: &str,
        list_command: &str,
    ) -> Self {
        if err.is_not_found() {
            Self::NotFound {
                resource_type: resource_type.into(),
                identifier: identifier.into(),
                list_command: list_command.into(),
            }
        } else {
            err.into()
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NetworkFailure { reason } => CliError::Network { reason },
            CoreError::BackendError { status, message } => CliError::Backend { status, message },
            CoreError::MalformedResponse { reason } => CliError::MalformedResponse { reason },
            CoreError::Busy { operation } => CliError::Busy { operation },
            CoreError::Config { message } => CliError::Validation {
                field: "backend".into(),
                reason: message,
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}
