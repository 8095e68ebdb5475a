//! Error types for tinyrag

use thiserror::Error;

/// Result type alias for tinyrag operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in tinyrag operations
#[derive(Error, Debug)]
pub enum Error {
    /// Chunking or pipeline parameters are unusable
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The embedding model could not be loaded or reached
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// A vector does not match the store's fixed dimension
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A persisted snapshot could not be parsed or failed validation
    #[error("corrupt store: {0}")]
    CorruptStore(String),

    /// Invalid query or call parameters
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Failed to write to or lock the vector store
    #[error("store error: {0}")]
    Store(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
