//! Error taxonomy for sync operations.

use thiserror::Error;

use crewline_bridge_client::BridgeError;

/// Errors a push or pull can fail with. A sync-in-progress is not an
/// error; busy attempts return a skipped report instead.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Bridge URL unset or invalid; no network I/O was attempted
    #[error("sync configuration error: {0}")]
    Config(String),

    /// Transport-level failure (DNS, connection refused, bad status)
    #[error("network error: {0}")]
    Network(String),

    /// The request was cancelled after its bounded wait elapsed
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The bridge executed the request and reported failure; the message
    /// is bridge-provided and surfaced verbatim
    #[error("remote execution failed: {0}")]
    Remote(String),

    /// Fetched rows could not be decoded against the catalog
    #[error("decode error: {0}")]
    Decode(String),

    /// The local apply transaction failed; the previous local snapshot
    /// is left intact
    #[error("local store error: {0}")]
    Store(String),
}

impl SyncError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

impl From<BridgeError> for SyncError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::Timeout(secs) => Self::Timeout(secs),
            BridgeError::Remote { message, .. } => Self::Remote(message),
            BridgeError::Config(message) => Self::Config(message),
            other => Self::Network(other.to_string()),
        }
    }
}

impl From<crewline_core::Error> for SyncError {
    fn from(err: crewline_core::Error) -> Self {
        match err {
            crewline_core::Error::Decode(message) => Self::Decode(message),
            crewline_core::Error::Config(message) => Self::Config(message),
            other => Self::Store(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bridge_errors_map_to_distinct_kinds() {
        let err: SyncError = BridgeError::Timeout(60).into();
        assert!(err.is_timeout());

        let err: SyncError = BridgeError::remote("Duplicate entry '1'", None).into();
        assert!(matches!(err, SyncError::Remote(message) if message.contains("Duplicate entry")));

        let err: SyncError = BridgeError::config("bridge URL is not configured").into();
        assert!(matches!(err, SyncError::Config(_)));
    }

    #[test]
    fn store_errors_keep_their_description() {
        let store_err = crewline_core::Error::Store(
            crewline_core::StoreError::transaction("UNIQUE constraint failed"),
        );
        let err: SyncError = store_err.into();
        assert!(matches!(err, SyncError::Store(message) if message.contains("UNIQUE")));
    }
}
