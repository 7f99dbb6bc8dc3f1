//! Error types for Tidemark core.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Store adapter I/O error.
    #[error("storage error: {0}")]
    Storage(#[from] tidemark_storage::StorageError),

    /// Document or journal entry codec error.
    #[error("codec error: {0}")]
    Codec(#[from] tidemark_codec::CodecError),

    /// A document submitted for writing has no string `id` field.
    ///
    /// In a bulk write this fails the whole batch; nothing is applied.
    #[error("document at position {index} has no string id")]
    MissingId {
        /// Position of the offending document within the call.
        index: usize,
    },

    /// A namespace or collection name is not usable.
    #[error("invalid name: {message}")]
    InvalidName {
        /// Description of the problem.
        message: String,
    },

    /// A stored journal entry could not be decoded.
    #[error("corrupt journal entry: {message}")]
    InvalidEntry {
        /// Description of the corruption.
        message: String,
    },
}

impl CoreError {
    /// Creates an invalid name error.
    pub fn invalid_name(message: impl Into<String>) -> Self {
        Self::InvalidName {
            message: message.into(),
        }
    }

    /// Creates a corrupt journal entry error.
    pub fn invalid_entry(message: impl Into<String>) -> Self {
        Self::InvalidEntry {
            message: message.into(),
        }
    }
}
