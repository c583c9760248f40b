//! Error types for fcloud

use std::path::Path;
use thiserror::Error;

/// Result type alias
pub type FcloudResult<T> = Result<T, FcloudError>;

/// Main error type
///
/// Backends translate provider-native failures into this taxonomy before
/// they cross the `StorageBackend` boundary; the sync engine never sees a
/// provider-specific error type.
#[derive(Error, Debug)]
pub enum FcloudError {
    // Local I/O
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("File already exists: {0}")]
    FileConflict(String),

    #[error("I/O error: {0}")]
    UnknownIo(String),

    // Link integrity
    #[error("CFL not found: {0}")]
    LinkNotFound(String),

    #[error("Invalid CFL {0}: a valid link starts with '%cfl:'")]
    InvalidLink(String),

    // Remote backend
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Remote path not found: {0}")]
    RemoteNotFound(String),

    #[error("Rate limited: retry after {retry_after_secs:?}s")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Provider error ({provider}): {message}")]
    UnknownBackend { provider: String, message: String },

    // Usage
    #[error("--near is not supported for directories")]
    NearWithDirectory,
}

impl FcloudError {
    /// Short title for CLI reporting, paired with the Display message.
    pub fn title(&self) -> &'static str {
        match self {
            FcloudError::FileNotFound(_) => "File not found",
            FcloudError::PermissionDenied(_) => "Permission denied",
            FcloudError::FileConflict(_) => "File conflict",
            FcloudError::UnknownIo(_) => "I/O error",
            FcloudError::LinkNotFound(_) => "CFL not found",
            FcloudError::InvalidLink(_) => "Invalid CFL",
            FcloudError::Auth(_) => "Authentication error",
            FcloudError::Connection(_) => "Connection error",
            FcloudError::RemoteNotFound(_) => "Remote path not found",
            FcloudError::RateLimited { .. } => "Rate limited",
            FcloudError::InvalidArgument(_) => "Invalid argument",
            FcloudError::UnknownBackend { .. } => "Provider error",
            FcloudError::NearWithDirectory => "Unavailable to use --near with folders",
        }
    }

    /// Map a local I/O failure at `path` into the taxonomy.
    pub fn from_io(err: std::io::Error, path: &Path) -> Self {
        let shown = path.display();
        match err.kind() {
            std::io::ErrorKind::NotFound => FcloudError::FileNotFound(shown.to_string()),
            std::io::ErrorKind::PermissionDenied => {
                FcloudError::PermissionDenied(shown.to_string())
            }
            std::io::ErrorKind::AlreadyExists => FcloudError::FileConflict(shown.to_string()),
            _ => FcloudError::UnknownIo(format!("{shown}: {err}")),
        }
    }
}

impl From<std::io::Error> for FcloudError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => FcloudError::FileNotFound(err.to_string()),
            std::io::ErrorKind::PermissionDenied => FcloudError::PermissionDenied(err.to_string()),
            std::io::ErrorKind::AlreadyExists => FcloudError::FileConflict(err.to_string()),
            _ => FcloudError::UnknownIo(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FcloudError::RemoteNotFound("/main/folder".into());
        assert_eq!(format!("{}", err), "Remote path not found: /main/folder");

        let err = FcloudError::RateLimited { retry_after_secs: Some(60) };
        assert!(format!("{}", err).contains("60"));
    }

    #[test]
    fn test_title_is_short() {
        let err = FcloudError::InvalidLink("/tmp/x.cfl".into());
        assert_eq!(err.title(), "Invalid CFL");
        assert_eq!(FcloudError::NearWithDirectory.title(), "Unavailable to use --near with folders");
    }

    #[test]
    fn test_from_io_error_kinds() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert!(matches!(FcloudError::from(io_err), FcloudError::FileNotFound(_)));

        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(FcloudError::from(io_err), FcloudError::PermissionDenied(_)));

        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        assert!(matches!(FcloudError::from(io_err), FcloudError::UnknownIo(_)));
    }

    #[test]
    fn test_from_io_carries_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = FcloudError::from_io(io_err, Path::new("/tmp/report.txt"));
        assert_eq!(format!("{}", err), "File not found: /tmp/report.txt");
    }
}
