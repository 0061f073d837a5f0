//! Storage abstraction for Deskboard.
//!
//! This module defines the `StorageEngine` trait and the types that cross
//! the storage boundary. The only backend is an age-encrypted SQLite file.

pub mod age_sqlite;
pub mod encryption;
pub mod traits;
pub mod types;

pub use age_sqlite::AgeSqliteStorage;
pub use traits::StorageEngine;
pub use types::{RecordEnvelope, RecordFilter, Session, StoreMetadata, Stored, User};
