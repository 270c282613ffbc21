//! Monitoring error types.

use std::path::PathBuf;

/// Errors that can occur during log monitoring.
#[derive(thiserror::Error, Debug)]
pub enum MonitorError {
    /// Watched file was deleted.
    #[error("Watched file deleted: {0}")]
    FileDeleted(PathBuf),

    /// Permission denied accessing file.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Notify watcher error.
    #[error("File watcher error: {0}")]
    Notify(#[from] notify::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_deleted_display() {
        let err = MonitorError::FileDeleted(PathBuf::from("/tmp/console.log"));
        assert_eq!(err.to_string(), "Watched file deleted: /tmp/console.log");
    }

    #[test]
    fn test_permission_denied_display() {
        let err = MonitorError::PermissionDenied(PathBuf::from("/root/secret.log"));
        assert_eq!(err.to_string(), "Permission denied: /root/secret.log");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MonitorError = io_err.into();
        assert!(matches!(err, MonitorError::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_from_notify_error() {
        let notify_err = notify::Error::generic("test error");
        let err: MonitorError = notify_err.into();
        assert!(matches!(err, MonitorError::Notify(_)));
        assert!(err.to_string().contains("File watcher error"));
    }
}
