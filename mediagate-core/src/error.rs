use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // Configuration errors
    #[error("Config file not found at {path}. A template has been created - please edit it with your gallery server address and restart.")]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid config: {message}")]
    ConfigInvalid { message: String },

    #[error("Missing required config field: {field}")]
    ConfigMissingField { field: String },

    #[error("Failed to parse config file: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    // Gallery errors
    #[error("Authentication rejected: {reason}")]
    AuthRejected { reason: String },

    #[error("Gallery session expired")]
    SessionExpired,

    #[error("Media item not found in catalog: {id}")]
    MediaNotFound { id: String },

    #[error("Gallery endpoint {endpoint} returned status {status}")]
    UnexpectedStatus { endpoint: String, status: u16 },

    // Network errors
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid gallery URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Failed to decode gallery response: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// How a failure is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Bad credential, shown inline on the login surface.
    AuthRejected,
    /// The server no longer recognises the session; the client reinitializes.
    SessionExpired,
    /// Anything else: logged and shown through the generic error indicator.
    TransportFailure,
}

impl CoreError {
    /// Classify this error for the user-facing error handling paths.
    #[must_use]
    pub const fn failure_kind(&self) -> FailureKind {
        match self {
            Self::AuthRejected { .. } => FailureKind::AuthRejected,
            Self::SessionExpired => FailureKind::SessionExpired,
            _ => FailureKind::TransportFailure,
        }
    }

    /// Shorthand for `failure_kind() == FailureKind::SessionExpired`.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_kind_classification() {
        let rejected = CoreError::AuthRejected {
            reason: "status 401".into(),
        };
        assert_eq!(rejected.failure_kind(), FailureKind::AuthRejected);
        assert_eq!(
            CoreError::SessionExpired.failure_kind(),
            FailureKind::SessionExpired
        );

        let status = CoreError::UnexpectedStatus {
            endpoint: "/api/media".into(),
            status: 500,
        };
        assert_eq!(status.failure_kind(), FailureKind::TransportFailure);
        assert!(!status.is_session_expired());
        assert!(CoreError::SessionExpired.is_session_expired());
    }
}
