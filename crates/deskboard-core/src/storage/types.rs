//! Core data types for the storage layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DeskError, Result};
use crate::record::{Record, RecordKind};

/// Metadata for a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMetadata {
    /// Format version (e.g., "0.1")
    pub format_version: String,

    /// Identifier assigned when the store was created
    pub store_id: Uuid,

    /// When this store was created
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp (informational)
    pub last_modified: DateTime<Utc>,
}

/// A user that owns records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// The acting identity for record operations.
///
/// Every read and write is filtered by `user_id`; records owned by another
/// user behave as if they do not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub user_name: String,
}

impl Session {
    pub fn new(user_id: Uuid, user_name: impl Into<String>) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
        }
    }
}

impl From<&User> for Session {
    fn from(user: &User) -> Self {
        Session::new(user.id, user.name.clone())
    }
}

/// A typed record together with its storage bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stored<R> {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub record: R,
}

/// An untyped record row, used for search results and exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordEnvelope {
    pub id: Uuid,
    pub kind: RecordKind,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl RecordEnvelope {
    /// Decode the JSON payload into a typed record.
    pub fn decode<R: Record>(&self) -> Result<Stored<R>> {
        if self.kind != R::KIND {
            return Err(DeskError::Storage(format!(
                "Record {} is a {}, not a {}",
                self.id,
                self.kind,
                R::KIND
            )));
        }
        let record: R = serde_json::from_value(self.data.clone())
            .map_err(|e| DeskError::Storage(format!("Invalid {} payload: {}", self.kind, e)))?;
        Ok(Stored {
            id: self.id,
            owner_id: self.owner_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            record,
        })
    }
}

/// Filter for listing records.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Created at or after (inclusive)
    pub since: Option<DateTime<Utc>>,

    /// Created at or before (inclusive)
    pub until: Option<DateTime<Utc>>,

    /// Maximum number of results
    pub limit: Option<usize>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn since(mut self, date: DateTime<Utc>) -> Self {
        self.since = Some(date);
        self
    }

    pub fn until(mut self, date: DateTime<Utc>) -> Self {
        self.until = Some(date);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}
