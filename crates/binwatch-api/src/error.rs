use thiserror::Error;

/// Top-level error type for the `binwatch-api` crate.
///
/// `binwatch-core` folds these into its three-way failure taxonomy
/// (network, backend, malformed response).
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Backend ─────────────────────────────────────────────────────
    /// Non-success HTTP status. `message` is the backend's `detail`
    /// field when present, otherwise a preview of the raw body.
    #[error("Backend error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_404_is_not_found() {
        let err = Error::Api {
            status: 404,
            message: "Dustbin not found".into(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_transient());
        assert_eq!(err.status(), Some(404));
    }

    #[test]
    fn server_errors_and_timeouts_are_transient() {
        assert!(
            Error::Api {
                status: 503,
                message: String::new()
            }
            .is_transient()
        );
        assert!(Error::Timeout { timeout_secs: 10 }.is_transient());
        assert!(
            !Error::Deserialization {
                message: "eof".into(),
                body: String::new()
            }
            .is_transient()
        );
    }
}
