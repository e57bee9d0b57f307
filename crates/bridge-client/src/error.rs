//! Error types for the bridge client crate.

use thiserror::Error;

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors that can occur while talking to the connectivity bridge.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// HTTP transport error (DNS, connection, TLS, ...)
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The request was aborted after its bounded wait elapsed
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The bridge answered with a non-success HTTP status
    #[error("bridge returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The bridge executed the request and reported `success: false`
    #[error("remote execution failed: {message}")]
    Remote {
        message: String,
        code: Option<String>,
    },

    /// Invalid client configuration (bad or missing bridge URL)
    #[error("bridge configuration error: {0}")]
    Config(String),
}

impl BridgeError {
    /// Create a remote execution error from a bridge response body.
    pub fn remote(message: impl Into<String>, code: Option<String>) -> Self {
        Self::Remote {
            message: message.into(),
            code,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Map a transport error, distinguishing timeouts from other failures.
    pub fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_secs)
        } else {
            Self::Http(err)
        }
    }

    /// Bridge-provided error code, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Remote { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Returns true when the remote rejected a query because the target
    /// table does not exist yet (first-ever sync: the push that creates it
    /// has not happened). Matches the backend's ER_NO_SUCH_TABLE wording.
    pub fn indicates_missing_table(&self) -> bool {
        match self {
            Self::Remote { message, code } => {
                if code.as_deref() == Some("NO_SUCH_TABLE") {
                    return true;
                }
                let message = message.to_ascii_lowercase();
                message.contains("doesn't exist")
                    || message.contains("does not exist")
                    || message.contains("no such table")
                    || message.contains("1146")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_table_detected_from_backend_message() {
        let err = BridgeError::remote("Table 'crew.payrolls' doesn't exist", None);
        assert!(err.indicates_missing_table());

        let err = BridgeError::remote("Error 1146: no such table", None);
        assert!(err.indicates_missing_table());

        let err = BridgeError::remote("", Some("NO_SUCH_TABLE".to_string()));
        assert!(err.indicates_missing_table());
    }

    #[test]
    fn other_remote_failures_are_not_missing_table() {
        let err = BridgeError::remote("Syntax error near 'INSERT'", None);
        assert!(!err.indicates_missing_table());

        let err = BridgeError::Timeout(15);
        assert!(!err.indicates_missing_table());
    }

    #[test]
    fn remote_error_surfaces_bridge_message() {
        let err = BridgeError::remote("Access denied for user 'crew'@'%'", None);
        assert!(err.to_string().contains("Access denied for user"));
    }
}
