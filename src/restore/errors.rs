//! Restore-specific error types

use std::fmt;
use std::io;
use std::path::Path;

/// Restore error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreErrorCode {
    /// General restore failure
    RestoreFailed,
    /// I/O failure during restore
    RestoreIo,
    /// Archive unreadable, of unknown format, or not rooted at one directory
    RestoreInvalidArchive,
    /// The restored tree would overwrite an existing directory
    RestoreTargetExists,
}

impl RestoreErrorCode {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RestoreErrorCode::RestoreFailed => "NOTES_RESTORE_FAILED",
            RestoreErrorCode::RestoreIo => "NOTES_RESTORE_IO",
            RestoreErrorCode::RestoreInvalidArchive => "NOTES_RESTORE_INVALID_ARCHIVE",
            RestoreErrorCode::RestoreTargetExists => "NOTES_RESTORE_TARGET_EXISTS",
        }
    }
}

impl fmt::Display for RestoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Restore error with full context
#[derive(Debug)]
pub struct RestoreError {
    code: RestoreErrorCode,
    message: String,
    source: Option<io::Error>,
}

impl RestoreError {
    fn new(code: RestoreErrorCode, message: impl Into<String>, source: Option<io::Error>) -> Self {
        Self {
            code,
            message: message.into(),
            source,
        }
    }

    /// Creates a general restore failure error
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(RestoreErrorCode::RestoreFailed, message, None)
    }

    /// Creates an I/O error during restore
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(RestoreErrorCode::RestoreIo, message, Some(source))
    }

    /// Creates an I/O error at a specific path
    pub fn io_error_at_path(path: &Path, source: io::Error) -> Self {
        Self::io_error(format!("I/O error at {}", path.display()), source)
    }

    /// Creates an invalid archive error
    pub fn invalid_archive(message: impl Into<String>) -> Self {
        Self::new(RestoreErrorCode::RestoreInvalidArchive, message, None)
    }

    /// Creates an invalid archive error with source
    pub fn invalid_archive_with_source(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(RestoreErrorCode::RestoreInvalidArchive, message, Some(source))
    }

    /// Creates a target-exists error
    pub fn target_exists(path: &Path) -> Self {
        Self::new(
            RestoreErrorCode::RestoreTargetExists,
            format!("Refusing to overwrite {}", path.display()),
            None,
        )
    }

    /// Returns the error code
    pub fn code(&self) -> RestoreErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for RestoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for RestoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for restore operations
pub type RestoreResult<T> = Result<T, RestoreError>;
