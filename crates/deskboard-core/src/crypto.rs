//! Passphrase rules for encrypted stores.

use crate::error::{DeskError, Result};

/// Minimum passphrase length in characters.
const MIN_PASSPHRASE_LENGTH: usize = 8;

/// Validate that a passphrase meets the minimum requirements.
///
/// The passphrase must not be blank and must be at least
/// eight characters long.
///
/// ```
/// use deskboard_core::crypto::validate_passphrase;
///
/// assert!(validate_passphrase("my-secure-passphrase-123").is_ok());
/// assert!(validate_passphrase("short").is_err());
/// ```
pub fn validate_passphrase(passphrase: &str) -> Result<()> {
    if passphrase.trim().is_empty() {
        return Err(DeskError::InvalidInput(
            "Passphrase cannot be empty".to_string(),
        ));
    }

    let length = passphrase.chars().count();
    if length < MIN_PASSPHRASE_LENGTH {
        return Err(DeskError::InvalidInput(format!(
            "Passphrase must be at least {} characters (got {})",
            MIN_PASSPHRASE_LENGTH, length
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_passphrase() {
        assert!(validate_passphrase("my-secure-passphrase-123").is_ok());
        assert!(validate_passphrase("longer passphrase with spaces!@#").is_ok());
    }

    #[test]
    fn test_passphrase_too_short() {
        let result = validate_passphrase("short");
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("at least 8 characters"));
    }

    #[test]
    fn test_passphrase_blank() {
        assert!(validate_passphrase("").is_err());
        assert!(validate_passphrase("          ").is_err());
    }

    #[test]
    fn test_passphrase_exactly_min_length() {
        assert!(validate_passphrase("12345678").is_ok());
    }
}
