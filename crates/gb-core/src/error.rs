//! # AppError
//!
//! Centralized error handling for the guestbook.
//! Maps journal failures to actionable error types.

use thiserror::Error;

/// The primary error type for all gb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Filesystem failure (e.g., journal directory missing, disk full)
    #[error("journal I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// A daily file whose header cannot be used (read back or appended to)
    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },
}

/// A specialized Result type for guestbook logic.
pub type Result<T> = std::result::Result<T, AppError>;
