//! Error types shared across the Crewline crates.

use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by local store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A read query against a local table failed.
    #[error("query failed: {0}")]
    Query(String),

    /// A write transaction failed and was rolled back.
    #[error("transaction failed: {0}")]
    Transaction(String),

    /// A table name was not found in the schema catalog.
    #[error("unknown table '{0}'")]
    UnknownTable(String),
}

/// Errors that can occur in core domain operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Local store error
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A remote cell could not be converted back into a local value
    #[error("decode error: {0}")]
    Decode(String),

    /// Missing or invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

impl StoreError {
    /// Create a query error.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query(message.into())
    }

    /// Create a transaction error.
    pub fn transaction(message: impl Into<String>) -> Self {
        Self::Transaction(message.into())
    }
}
