//! Raw row types for database queries.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{DeskError, Result};
use crate::record::RecordKind;
use crate::storage::types::{RecordEnvelope, User};

/// Columns selected for record queries, in order.
pub const RECORD_COLUMNS: &str = "r.id, r.kind, r.owner_id, r.data_json, r.created_at, r.updated_at";

/// Raw row data from the records table, before parsing into domain types.
#[derive(Debug)]
pub struct RecordRow {
    pub id: String,
    pub kind: String,
    pub owner_id: String,
    pub data_json: String,
    pub created_at: String,
    pub updated_at: String,
}

impl RecordRow {
    /// Read a row selected with [`RECORD_COLUMNS`].
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            kind: row.get(1)?,
            owner_id: row.get(2)?,
            data_json: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

impl TryFrom<RecordRow> for RecordEnvelope {
    type Error = DeskError;

    fn try_from(row: RecordRow) -> Result<Self> {
        let id = parse_uuid(&row.id, "record")?;
        let owner_id = parse_uuid(&row.owner_id, "owner")?;
        let kind: RecordKind = row
            .kind
            .parse()
            .map_err(|_| DeskError::Storage(format!("Invalid record kind: {}", row.kind)))?;
        let data: serde_json::Value = serde_json::from_str(&row.data_json)
            .map_err(|e| DeskError::Storage(format!("Invalid JSON: {}", e)))?;

        Ok(RecordEnvelope {
            id,
            kind,
            owner_id,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
            data,
        })
    }
}

/// Raw row data from the users table.
#[derive(Debug)]
pub struct UserRow {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

impl TryFrom<UserRow> for User {
    type Error = DeskError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: parse_uuid(&row.id, "user")?,
            name: row.name,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

pub fn parse_uuid(value: &str, what: &str) -> Result<Uuid> {
    Uuid::parse_str(value).map_err(|e| DeskError::Storage(format!("Invalid {} UUID: {}", what, e)))
}

pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DeskError::Storage(format!("Invalid timestamp: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_row_converts() {
        let id = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let row = RecordRow {
            id: id.to_string(),
            kind: "net_worth".to_string(),
            owner_id: owner.to_string(),
            data_json: r#"{"label":"Savings"}"#.to_string(),
            created_at: "2025-01-02T03:04:05.000000Z".to_string(),
            updated_at: "2025-01-02T03:04:05.000000Z".to_string(),
        };

        let envelope: RecordEnvelope = row.try_into().unwrap();
        assert_eq!(envelope.id, id);
        assert_eq!(envelope.owner_id, owner);
        assert_eq!(envelope.kind, RecordKind::NetWorth);
        assert_eq!(envelope.data["label"], "Savings");
    }

    #[test]
    fn test_record_row_rejects_bad_kind() {
        let row = RecordRow {
            id: Uuid::new_v4().to_string(),
            kind: "invoice".to_string(),
            owner_id: Uuid::new_v4().to_string(),
            data_json: "{}".to_string(),
            created_at: "2025-01-02T03:04:05Z".to_string(),
            updated_at: "2025-01-02T03:04:05Z".to_string(),
        };
        let result: Result<RecordEnvelope> = row.try_into();
        assert!(matches!(result, Err(DeskError::Storage(_))));
    }
}
