//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The on-disk journal is corrupted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// A write batch violates an adapter constraint.
    #[error("invalid batch: {message}")]
    InvalidBatch {
        /// Description of the violated constraint.
        message: String,
    },
}

impl StorageError {
    /// Creates a corrupted storage error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }

    /// Creates an invalid batch error.
    pub fn invalid_batch(message: impl Into<String>) -> Self {
        Self::InvalidBatch {
            message: message.into(),
        }
    }
}
