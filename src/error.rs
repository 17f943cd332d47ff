//! Error types for the streaming session.
//!
//! Errors fall into three groups, matched to how the session reacts to them:
//!
//! | Error | Surfaced | Retried |
//! |-------|----------|---------|
//! | [`ConfigurationError`] | synchronously from `start_stream` | never |
//! | [`ConnectError`] | from the first `start_stream` attempt | indefinitely by the reconnect loop |
//! | [`FluidinfoError::MalformedRecord`] | logged by the reader | line dropped, stream continues |

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, FluidinfoError>;

/// Top-level error for the Fluidinfo streaming client.
#[derive(Debug, thiserror::Error)]
pub enum FluidinfoError {
    /// The session is misconfigured; no connection was attempted.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// The handshake with the service failed.
    #[error("connect error: {0}")]
    Connect(#[from] ConnectError),

    /// A stream line could not be decoded into a record.
    #[error("malformed record: {0}")]
    MalformedRecord(String),
}

/// Caller-side misconfiguration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// Username or password is empty.
    #[error("missing credentials")]
    MissingCredentials,

    /// Base address and path do not form a valid URL.
    #[error("invalid target: {0}")]
    InvalidTarget(String),
}

/// Failure of a single `open` handshake.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    /// The transport could not be established.
    #[error("dial failed: {0}")]
    DialFailed(String),

    /// The request could not be written.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// The response head could not be parsed.
    #[error("bad response: {0}")]
    BadResponse(String),

    /// The service answered with a non-2xx status.
    #[error("rejected with status {0}")]
    Rejected(u16),
}

impl FluidinfoError {
    /// Whether the reconnect loop may retry after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FluidinfoError::Connect(_))
    }

    /// The HTTP status, when the service rejected the handshake.
    pub fn status(&self) -> Option<u16> {
        match self {
            FluidinfoError::Connect(ConnectError::Rejected(status)) => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ConnectError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() || err.is_timeout() {
            ConnectError::DialFailed(err.to_string())
        } else if err.is_builder() || err.is_body() {
            ConnectError::WriteFailed(err.to_string())
        } else {
            ConnectError::BadResponse(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FluidinfoError {
    fn from(err: serde_json::Error) -> Self {
        FluidinfoError::MalformedRecord(err.to_string())
    }
}

impl From<std::str::Utf8Error> for FluidinfoError {
    fn from(err: std::str::Utf8Error) -> Self {
        FluidinfoError::MalformedRecord(format!("invalid utf-8: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(FluidinfoError::from(ConnectError::Rejected(503)).is_retryable());
        assert!(FluidinfoError::from(ConnectError::DialFailed("refused".into())).is_retryable());
        assert!(!FluidinfoError::from(ConfigurationError::MissingCredentials).is_retryable());
        assert!(!FluidinfoError::MalformedRecord("x".into()).is_retryable());
    }

    #[test]
    fn test_status_only_for_rejections() {
        assert_eq!(FluidinfoError::from(ConnectError::Rejected(401)).status(), Some(401));
        assert_eq!(
            FluidinfoError::from(ConnectError::BadResponse("eof".into())).status(),
            None
        );
    }

    #[test]
    fn test_json_error_becomes_malformed_record() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(
            FluidinfoError::from(err),
            FluidinfoError::MalformedRecord(_)
        ));
    }
}
