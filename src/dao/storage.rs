//! Errors shared by record store backends.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by a record store backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The collection file could not be read.
    #[error("failed to read record store at {path}")]
    Read {
        /// Collection file path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The collection file could not be written.
    #[error("failed to write record store at {path}")]
    Write {
        /// Collection file path.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The collection could not be serialized.
    #[error("failed to encode record store")]
    Encode {
        /// Underlying serialization failure.
        #[source]
        source: serde_json::Error,
    },
}
