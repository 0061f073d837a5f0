//! Passphrase handling and storage opening with retry logic.

use std::path::Path;

use deskboard_core::storage::AgeSqliteStorage;
use deskboard_core::{DeskError, StorageEngine};

use crate::constants::MAX_PASSPHRASE_ATTEMPTS;
use crate::errors::CliError;
use crate::helpers::{env_passphrase, prompt_passphrase};

use super::resolver::missing_store_error;

/// Open the store, taking the passphrase from the environment or a prompt.
///
/// An interactive prompt allows a few attempts; anything else gets one.
pub fn open_storage_with_retry(
    path: &Path,
    interactive: bool,
) -> anyhow::Result<(AgeSqliteStorage, String)> {
    if !path.exists() {
        return Err(missing_store_error(path).into());
    }

    if let Some(passphrase) = env_passphrase() {
        return match AgeSqliteStorage::open(path, &passphrase) {
            Ok(storage) => Ok((storage, passphrase)),
            Err(DeskError::IncorrectPassphrase) => Err(CliError::auth_failed_with_hint(
                "Incorrect passphrase.",
                "Hint: Check DESKBOARD_PASSPHRASE.",
            )
            .into()),
            Err(err) => Err(map_open_error(err, path)),
        };
    }

    let max_attempts = if interactive { MAX_PASSPHRASE_ATTEMPTS } else { 1 };
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let passphrase = prompt_passphrase(interactive)?;
        match AgeSqliteStorage::open(path, &passphrase) {
            Ok(storage) => return Ok((storage, passphrase)),
            Err(DeskError::IncorrectPassphrase) => {
                let remaining = max_attempts.saturating_sub(attempts);
                if remaining == 0 {
                    return Err(CliError::auth_failed_with_hint(
                        "Too many failed passphrase attempts.",
                        "Hint: If you forgot your passphrase, the store cannot be recovered.\n      Backups use the same passphrase.",
                    )
                    .into());
                }
                eprintln!(
                    "Incorrect passphrase. {} attempt{} remaining.",
                    remaining,
                    if remaining == 1 { "" } else { "s" }
                );
            }
            Err(err) => return Err(map_open_error(err, path)),
        }
    }
}

fn map_open_error(err: DeskError, path: &Path) -> anyhow::Error {
    match err {
        DeskError::StoreNotFound => missing_store_error(path).into(),
        other => other.into(),
    }
}
