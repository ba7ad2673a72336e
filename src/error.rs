// src/error.rs

//! Crate-level error type shared across the library.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// An external package-manager command could not be spawned or run.
    #[error("command failed: {0}")]
    Gateway(String),

    /// The requested package or file does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation is not available for the selected ecosystem.
    #[error("not supported: {0}")]
    Unsupported(String),

    /// The caller supplied an invalid combination of options or inputs.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
