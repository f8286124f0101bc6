//! Backup-specific error types
//!
//! Backup errors carry a stable code, a message, and the underlying I/O error
//! when there is one. They are never fatal: a failed backup leaves the live
//! note store untouched.

use std::fmt;
use std::io;
use std::path::Path;

/// Backup error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupErrorCode {
    /// General backup failure
    BackupFailed,
    /// I/O failure while archiving, listing or pruning
    BackupIo,
    /// Scope name is not a valid directory name
    BackupInvalidScope,
}

impl BackupErrorCode {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupErrorCode::BackupFailed => "NOTES_BACKUP_FAILED",
            BackupErrorCode::BackupIo => "NOTES_BACKUP_IO",
            BackupErrorCode::BackupInvalidScope => "NOTES_BACKUP_INVALID_SCOPE",
        }
    }
}

impl fmt::Display for BackupErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Backup error with full context
#[derive(Debug)]
pub struct BackupError {
    code: BackupErrorCode,
    message: String,
    source: Option<io::Error>,
}

impl BackupError {
    fn new(code: BackupErrorCode, message: impl Into<String>, source: Option<io::Error>) -> Self {
        Self {
            code,
            message: message.into(),
            source,
        }
    }

    /// Creates a general backup failure error
    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(BackupErrorCode::BackupFailed, message, None)
    }

    /// Creates an I/O error during backup
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(BackupErrorCode::BackupIo, message, Some(source))
    }

    /// Creates an I/O error at a specific path
    pub fn io_error_at_path(path: &Path, source: io::Error) -> Self {
        Self::io_error(format!("I/O error at {}", path.display()), source)
    }

    /// Creates an invalid scope error
    pub fn invalid_scope(scope: &str) -> Self {
        Self::new(
            BackupErrorCode::BackupInvalidScope,
            format!("Invalid scope name: '{}'", scope),
            None,
        )
    }

    /// Returns the error code
    pub fn code(&self) -> BackupErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the underlying I/O error kind, if any
    pub fn io_kind(&self) -> Option<io::ErrorKind> {
        self.source.as_ref().map(|e| e.kind())
    }
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if let Some(ref source) = self.source {
            write!(f, " (caused by: {})", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for BackupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for backup operations
pub type BackupResult<T> = Result<T, BackupError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(BackupErrorCode::BackupFailed.as_str(), "NOTES_BACKUP_FAILED");
        assert_eq!(BackupErrorCode::BackupIo.as_str(), "NOTES_BACKUP_IO");
        assert_eq!(
            BackupErrorCode::BackupInvalidScope.as_str(),
            "NOTES_BACKUP_INVALID_SCOPE"
        );
    }

    #[test]
    fn test_display_contains_code_and_message() {
        let err = BackupError::failed("no source directory");
        let display = err.to_string();
        assert!(display.contains("NOTES_BACKUP_FAILED"));
        assert!(display.contains("no source directory"));
    }

    #[test]
    fn test_io_error_keeps_source() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = BackupError::io_error_at_path(Path::new("/backup/x"), io_err);

        assert_eq!(err.code(), BackupErrorCode::BackupIo);
        assert_eq!(err.io_kind(), Some(io::ErrorKind::PermissionDenied));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("caused by: denied"));
    }

    #[test]
    fn test_invalid_scope() {
        let err = BackupError::invalid_scope("../etc");
        assert_eq!(err.code(), BackupErrorCode::BackupInvalidScope);
        assert!(err.message().contains("../etc"));
        assert!(err.io_kind().is_none());
    }
}
