//! Storage engine trait definition.
//!
//! The `StorageEngine` trait is the boundary between the dashboard views and
//! persistence. Every record operation is scoped to a [`Session`]: a user
//! can only see, change or delete records they own.

use std::path::Path;
use uuid::Uuid;

use super::types::{RecordEnvelope, RecordFilter, Session, StoreMetadata, Stored, User};
use crate::error::Result;
use crate::record::{Record, RecordKind};

/// Storage engine interface for encrypted dashboard stores.
///
/// Implementations must ensure:
/// - Data is encrypted at rest
/// - Mutations are atomic
/// - Records are only visible to their owner
/// - Updates overwrite the whole record (last write wins)
pub trait StorageEngine: Send + Sync {
    /// Create a new store at the specified path.
    ///
    /// Returns the store ID.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::Storage` if the file already exists or cannot be
    /// written, and `DeskError::InvalidInput` for a weak passphrase.
    fn create(path: &Path, passphrase: &str) -> Result<Uuid>
    where
        Self: Sized;

    /// Open an existing store.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::StoreNotFound` if the file is missing and
    /// `DeskError::IncorrectPassphrase` if it cannot be decrypted.
    fn open(path: &Path, passphrase: &str) -> Result<Self>
    where
        Self: Sized;

    /// Close the store, encrypting and writing it to disk atomically.
    fn close(self, passphrase: &str) -> Result<()>;

    /// Get store metadata.
    fn metadata(&self) -> Result<StoreMetadata>;

    // --- Users ---

    /// Register a new user. Names are trimmed and must be unique.
    fn create_user(&mut self, name: &str) -> Result<User>;

    /// Look up a user by name.
    fn get_user(&self, name: &str) -> Result<Option<User>>;

    /// List all users ordered by name.
    fn list_users(&self) -> Result<Vec<User>>;

    // --- Records ---

    /// Validate and insert a record owned by the session user.
    fn insert<R: Record>(&mut self, session: &Session, record: &R) -> Result<Uuid>
    where
        Self: Sized;

    /// Fetch a record by ID.
    ///
    /// Returns `Ok(None)` when the record does not exist, is of another kind,
    /// or belongs to another user.
    fn get<R: Record>(&self, session: &Session, id: &Uuid) -> Result<Option<Stored<R>>>
    where
        Self: Sized;

    /// List records of one kind, newest first.
    fn list<R: Record>(&self, session: &Session, filter: &RecordFilter) -> Result<Vec<Stored<R>>>
    where
        Self: Sized;

    /// Overwrite a record.
    ///
    /// # Errors
    ///
    /// Returns `DeskError::NotFound` if the session user has no such record.
    fn update<R: Record>(&mut self, session: &Session, id: &Uuid, record: &R) -> Result<()>
    where
        Self: Sized;

    /// Delete a record.
    fn delete(&mut self, session: &Session, kind: RecordKind, id: &Uuid) -> Result<()>;

    /// Full-text search across the session user's records.
    ///
    /// Results are ordered by relevance, then recency.
    fn search(
        &self,
        session: &Session,
        query: &str,
        kind: Option<RecordKind>,
    ) -> Result<Vec<RecordEnvelope>>;

    /// Every record owned by the session user, oldest first.
    fn export(&self, session: &Session) -> Result<Vec<RecordEnvelope>>;

    // --- Maintenance ---

    /// Check store integrity.
    ///
    /// Verifies foreign keys, search index coverage and metadata keys.
    fn check_integrity(&self) -> Result<()>;
}
