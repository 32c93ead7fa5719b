// ── Core error types ──
//
// Every backend failure is folded into one of three kinds: the request
// never completed, the backend answered with a failure status, or the
// answer did not parse. Errors are `Clone` so they can ride the monitor's
// broadcast channel to every subscriber.

use thiserror::Error;

/// Coarse failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    NetworkFailure,
    BackendError,
    MalformedResponse,
    Busy,
    Config,
}

/// Unified error type for the core crate.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    // ── Backend failures ─────────────────────────────────────────────
    #[error("Network failure: {reason}")]
    NetworkFailure { reason: String },

    #[error("Backend error (HTTP {status}): {message}")]
    BackendError { status: u16, message: String },

    #[error("Malformed response: {reason}")]
    MalformedResponse { reason: String },

    // ── Local rejections ─────────────────────────────────────────────
    #[error("{operation} is already in progress")]
    Busy { operation: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NetworkFailure { .. } => ErrorKind::NetworkFailure,
            Self::BackendError { .. } => ErrorKind::BackendError,
            Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            Self::Busy { .. } => ErrorKind::Busy,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    /// Returns `true` if the backend reported the entity as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::BackendError { status: 404, .. })
    }

    /// Returns `true` if retrying later might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::NetworkFailure { .. } | Self::Busy { .. } => true,
            Self::BackendError { status, .. } => *status >= 500,
            Self::MalformedResponse { .. } | Self::Config { .. } => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<binwatch_api::Error> for CoreError {
    fn from(err: binwatch_api::Error) -> Self {
        match err {
            binwatch_api::Error::Transport(e) => match e.status() {
                Some(status) => CoreError::BackendError {
                    status: status.as_u16(),
                    message: e.to_string(),
                },
                None => CoreError::NetworkFailure {
                    reason: e.to_string(),
                },
            },
            binwatch_api::Error::Timeout { timeout_secs } => CoreError::NetworkFailure {
                reason: format!("request timed out after {timeout_secs}s"),
            },
            binwatch_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            binwatch_api::Error::Api { status, message } => {
                CoreError::BackendError { status, message }
            }
            binwatch_api::Error::Deserialization { message, .. } => {
                CoreError::MalformedResponse { reason: message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_map_onto_taxonomy() {
        let backend: CoreError = binwatch_api::Error::Api {
            status: 404,
            message: "Notification not found".into(),
        }
        .into();
        assert_eq!(backend.kind(), ErrorKind::BackendError);
        assert!(backend.is_not_found());

        let timeout: CoreError = binwatch_api::Error::Timeout { timeout_secs: 10 }.into();
        assert_eq!(timeout.kind(), ErrorKind::NetworkFailure);
        assert!(timeout.is_transient());

        let malformed: CoreError = binwatch_api::Error::Deserialization {
            message: "missing field `id`".into(),
            body: "{}".into(),
        }
        .into();
        assert_eq!(malformed.kind(), ErrorKind::MalformedResponse);
        assert!(!malformed.is_transient());
    }

    #[test]
    fn kind_displays_as_snake_case() {
        assert_eq!(ErrorKind::MalformedResponse.to_string(), "malformed_response");
    }
}
