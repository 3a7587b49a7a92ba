//! Backend error types

use thiserror::Error;

/// Backend error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct BackendError {
    pub kind: BackendErrorKind,
    pub message: String,
}

impl BackendError {
    pub fn new(kind: BackendErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Network, message)
    }

    pub fn status(status: reqwest::StatusCode, body: &str) -> Self {
        Self::new(
            BackendErrorKind::Status,
            format!("HTTP {status}: {body}"),
        )
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(BackendErrorKind::Malformed, message)
    }
}

/// Error classification
///
/// The session recovers from all of these identically (fallback message plus
/// a transient notification); the kind exists for logging and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendErrorKind {
    /// Transport failure: network unreachable, connection reset, timeout
    Network,
    /// The backend answered with a non-2xx status
    Status,
    /// The body could not be decoded into the expected shape
    Malformed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_errors_carry_the_code() {
        let err = BackendError::status(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.kind, BackendErrorKind::Status);
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("upstream down"));
    }
}
