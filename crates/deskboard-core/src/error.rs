//! Error types for Deskboard core operations.
//!
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-facing messages and exit codes.

use thiserror::Error;

/// Result type alias for Deskboard operations.
pub type Result<T> = std::result::Result<T, DeskError>;

/// Core error type for Deskboard operations.
#[derive(Debug, Error)]
pub enum DeskError {
    /// Encryption or decryption error
    #[error("Encryption error: {0}")]
    Crypto(String),

    /// Passphrase did not decrypt the store
    #[error("Incorrect passphrase")]
    IncorrectPassphrase,

    /// Record failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Store file does not exist
    #[error("Store not found")]
    StoreNotFound,

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error (fallback)
    #[error("{0}")]
    Other(String),
}

impl From<std::io::Error> for DeskError {
    fn from(err: std::io::Error) -> Self {
        DeskError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for DeskError {
    fn from(err: serde_json::Error) -> Self {
        DeskError::Validation(err.to_string())
    }
}

impl From<rusqlite::Error> for DeskError {
    fn from(err: rusqlite::Error) -> Self {
        DeskError::Storage(format!("Database error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DeskError::NotFound("Matter abc".to_string());
        assert_eq!(err.to_string(), "Not found: Matter abc");
    }

    #[test]
    fn test_io_error_maps_to_storage() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: DeskError = io.into();
        assert!(matches!(err, DeskError::Storage(_)));
    }
}
