//! Age passphrase encryption for store payloads.
//!
//! Age uses scrypt internally for passphrase-based encryption, so no
//! separate key derivation step is needed.

use std::io::{Read, Write};
use std::iter;

use age::secrecy::SecretString;

use crate::error::{DeskError, Result};

/// Encrypt `data` with an age passphrase recipient.
///
/// ```
/// use deskboard_core::storage::encryption::encrypt;
///
/// let encrypted = encrypt(b"secret data", "my-secure-passphrase").unwrap();
/// assert_ne!(encrypted.as_slice(), b"secret data");
/// ```
pub fn encrypt(data: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    let encryptor =
        age::Encryptor::with_user_passphrase(SecretString::from(passphrase.to_string()));

    let mut encrypted = Vec::new();
    let mut writer = encryptor
        .wrap_output(&mut encrypted)
        .map_err(|e| DeskError::Crypto(format!("Failed to create encryptor: {}", e)))?;

    writer
        .write_all(data)
        .map_err(|e| DeskError::Crypto(format!("Encryption write failed: {}", e)))?;

    writer
        .finish()
        .map_err(|e| DeskError::Crypto(format!("Encryption finish failed: {}", e)))?;

    Ok(encrypted)
}

/// Decrypt an age payload produced by [`encrypt`].
///
/// # Errors
///
/// Returns `DeskError::IncorrectPassphrase` when the passphrase does not
/// unlock the payload, and `DeskError::Crypto` for corrupted data.
pub fn decrypt(encrypted_data: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    let decryptor = age::Decryptor::new(encrypted_data)
        .map_err(|e| DeskError::Crypto(format!("Failed to create decryptor: {}", e)))?;

    let identity = age::scrypt::Identity::new(SecretString::from(passphrase.to_string()));
    let mut reader = decryptor
        .decrypt(iter::once(&identity as &dyn age::Identity))
        .map_err(|e| match e {
            age::DecryptError::NoMatchingKeys
            | age::DecryptError::DecryptionFailed
            | age::DecryptError::KeyDecryptionFailed => DeskError::IncorrectPassphrase,
            _ => DeskError::Crypto(format!("Decryption failed: {}", e)),
        })?;

    let mut decrypted = Vec::new();
    reader
        .read_to_end(&mut decrypted)
        .map_err(|e| DeskError::Crypto(format!("Failed to read decrypted data: {}", e)))?;

    Ok(decrypted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let passphrase = "test-passphrase-secure-123";
        let plaintext = b"matters, leave and net worth";

        let encrypted = encrypt(plaintext, passphrase).unwrap();
        let decrypted = decrypt(&encrypted, passphrase).unwrap();

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_wrong_passphrase_is_reported() {
        let encrypted = encrypt(b"secret", "correct-passphrase-123").unwrap();

        let result = decrypt(&encrypted, "wrong-passphrase-456");
        assert!(matches!(result, Err(DeskError::IncorrectPassphrase)));
    }

    #[test]
    fn test_corrupted_data_fails() {
        let passphrase = "test-passphrase-secure-123";
        let mut encrypted = encrypt(b"secret data", passphrase).unwrap();
        let len = encrypted.len();
        encrypted[len / 2] ^= 0xFF;

        assert!(decrypt(&encrypted, passphrase).is_err());
    }
}
