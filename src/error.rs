//! Error types for bucketkv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using BucketKvError
pub type Result<T> = std::result::Result<T, BucketKvError>;

/// Unified error type for bucketkv operations
#[derive(Debug, Error)]
pub enum BucketKvError {
    // -------------------------------------------------------------------------
    // Caller Errors (detected before any transaction is opened)
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    #[error("Bucket not found: {0}")]
    BucketNotFound(String),

    #[error("Key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Transaction Errors
    // -------------------------------------------------------------------------
    #[error("Transaction already active on this thread for this store")]
    TransactionReentrancy,

    #[error("Database locked: another handle has exclusive access")]
    DatabaseLocked,

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Commit Log Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BucketKvError {
    /// Shorthand for an `InvalidArgument` error
    pub(crate) fn invalid(what: impl Into<String>) -> Self {
        BucketKvError::InvalidArgument(what.into())
    }

    /// Build a `BucketNotFound` error from a raw bucket name
    pub(crate) fn bucket_not_found(name: &[u8]) -> Self {
        BucketKvError::BucketNotFound(String::from_utf8_lossy(name).into_owned())
    }
}

impl From<bincode::Error> for BucketKvError {
    fn from(e: bincode::Error) -> Self {
        BucketKvError::Serialization(e.to_string())
    }
}
