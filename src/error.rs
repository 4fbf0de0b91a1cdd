//! Error types for the face liveness library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Camera or inference engine could not be acquired
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// Face detection failed for a single frame
    #[error("Inference error: {0}")]
    Inference(String),

    /// Command issued while the session cannot accept it
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A shared engine lock was poisoned by a panicking holder
    #[error("Engine lock poisoned")]
    LockPoisoned,
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
