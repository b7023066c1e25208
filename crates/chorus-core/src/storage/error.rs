//! Storage error types.
//!
//! - `Serialization`: a stored record could not be encoded or decoded
//! - `Io`: the underlying store failed

use thiserror::Error;

/// Errors that can occur during sender key storage operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Record encoding or decoding failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backing store failed (I/O, database, lock poisoning)
    #[error("I/O error: {0}")]
    Io(String),
}
