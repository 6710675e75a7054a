//! Error types for filekeep.

use thiserror::Error;

use crate::file::FsError;

/// Common error type for filekeep.
///
/// Request handling uses [`FsError`] and [`crate::web::ApiError`] directly;
/// this type covers startup: configuration, logging and storage setup.
#[derive(Error, Debug)]
pub enum FilekeepError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] FsError),

    /// Validation error for configuration values.
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for filekeep operations.
pub type Result<T> = std::result::Result<T, FilekeepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = FilekeepError::Validation("storage root is empty".to_string());
        assert_eq!(err.to_string(), "validation error: storage root is empty");
    }

    #[test]
    fn test_config_error_display() {
        let err = FilekeepError::Config("bad address".to_string());
        assert_eq!(err.to_string(), "configuration error: bad address");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FilekeepError = io_err.into();
        assert!(matches!(err, FilekeepError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_storage_error_conversion() {
        let err: FilekeepError = FsError::NotFound {
            path: "storage-root/missing".into(),
        }
        .into();
        assert!(matches!(err, FilekeepError::Storage(_)));
        assert!(err.to_string().starts_with("storage error:"));
    }
}
