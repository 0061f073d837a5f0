//! An open store together with the acting user.

use deskboard_core::storage::{AgeSqliteStorage, Session, User};
use deskboard_core::StorageEngine;

use crate::errors::CliError;

/// The decrypted store, its passphrase and the session used for every
/// record operation.
///
/// Changes only reach disk through [`OpenStore::close`]; dropping an
/// `OpenStore` discards them.
pub struct OpenStore {
    pub storage: AgeSqliteStorage,
    pub session: Session,
    passphrase: String,
}

impl OpenStore {
    pub fn new(
        storage: AgeSqliteStorage,
        passphrase: String,
        preferred_user: Option<&str>,
    ) -> anyhow::Result<Self> {
        let user = select_user(&storage, preferred_user)?;
        log::debug!("acting as {} ({})", user.name, user.id);
        Ok(Self {
            session: Session::from(&user),
            storage,
            passphrase,
        })
    }

    /// Encrypt and write the store.
    pub fn close(self) -> anyhow::Result<()> {
        self.storage.close(&self.passphrase)?;
        Ok(())
    }
}

/// Pick the named user, or the only user when no name is given.
fn select_user(storage: &AgeSqliteStorage, preferred: Option<&str>) -> anyhow::Result<User> {
    if let Some(name) = preferred {
        return storage.get_user(name.trim())?.ok_or_else(|| {
            CliError::not_found(
                format!("No user named {}", name.trim()),
                "Hint: Run `deskboard user list`, or `deskboard user add <NAME>`.",
            )
            .into()
        });
    }

    let mut users = storage.list_users()?;
    match users.len() {
        1 => Ok(users.remove(0)),
        0 => Err(CliError::not_found(
            "The store has no users",
            "Hint: Run `deskboard user add <NAME>`.",
        )
        .into()),
        _ => Err(CliError::invalid_input(
            "Several users exist; choose one with --user or set [session] user in the config",
        )
        .into()),
    }
}
