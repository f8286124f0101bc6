//! # Note Store Errors

use thiserror::Error;

/// Result type for note store operations
pub type NoteResult<T> = Result<T, NoteError>;

/// Note store errors
#[derive(Debug, Clone, Error)]
pub enum NoteError {
    #[error("Invalid name: '{0}'")]
    InvalidName(String),

    #[error("Note already exists: {0}")]
    AlreadyExists(String),

    #[error("Note not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    IoError(String),
}

impl NoteError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            NoteError::InvalidName(_) => 400,
            NoteError::AlreadyExists(_) => 409,
            NoteError::NotFound(_) => 404,
            NoteError::IoError(_) => 500,
        }
    }

    pub(crate) fn io(context: impl std::fmt::Display, err: std::io::Error) -> Self {
        NoteError::IoError(format!("{}: {}", context, err))
    }
}
