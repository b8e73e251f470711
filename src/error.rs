use thiserror::Error;

/// Main error type for the monitor
#[derive(Error, Debug)]
pub enum SentryError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Timeout: {0}")]
    Timeout(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Object already exists: {0}")]
    AlreadyExists(String),

    // Upstream metric errors
    #[error("Metric source unavailable: {source_name} - {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    // State machine errors
    #[error("Invalid state transition: from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Notification error: {0}")]
    Notification(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for SentryError
pub type Result<T> = std::result::Result<T, SentryError>;

impl SentryError {
    pub fn source_unavailable(source_name: &str, reason: impl std::fmt::Display) -> Self {
        SentryError::SourceUnavailable {
            source_name: source_name.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Transport-level notification failures.
///
/// These never leave the dispatcher; they are folded into a per-channel
/// `DispatchResult`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("transport not configured: {0}")]
    NotConfigured(String),

    #[error("HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("request failed: {0}")]
    Request(String),

    #[error("timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },
}

impl From<NotifyError> for SentryError {
    fn from(err: NotifyError) -> Self {
        SentryError::Notification(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_error_converts() {
        let err: SentryError = NotifyError::Timeout { elapsed_ms: 500 }.into();
        assert_eq!(err.to_string(), "Notification error: timed out after 500ms");
    }

    #[test]
    fn test_source_unavailable_message() {
        let err = SentryError::source_unavailable("rpc", "connection refused");
        assert_eq!(
            err.to_string(),
            "Metric source unavailable: rpc - connection refused"
        );
    }
}
