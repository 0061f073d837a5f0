//! Age-encrypted SQLite storage backend.
//!
//! The database is held in memory while the store is open and serialized
//! to disk with age passphrase encryption on close.

mod row;

use std::fs;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::serialize::OwnedData;
use rusqlite::{Connection, DatabaseName, OptionalExtension};
use uuid::Uuid;

use crate::crypto::validate_passphrase;
use crate::error::{DeskError, Result};
use crate::record::{Record, RecordKind};
use crate::storage::encryption::{decrypt, encrypt};
use crate::storage::traits::StorageEngine;
use crate::storage::types::{
    RecordEnvelope, RecordFilter, Session, StoreMetadata, Stored, User,
};
use crate::validation::MAX_DATA_BYTES;

use row::{parse_timestamp, parse_uuid, RecordRow, UserRow, RECORD_COLUMNS};

/// Current on-disk format version.
pub const FORMAT_VERSION: &str = "0.1";

const REQUIRED_META_KEYS: [&str; 4] = ["format_version", "store_id", "created_at", "last_modified"];

const SCHEMA: &str = r#"
    CREATE TABLE meta (
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    CREATE TABLE users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        created_at TEXT NOT NULL
    );

    CREATE TABLE records (
        id TEXT PRIMARY KEY,
        kind TEXT NOT NULL,
        owner_id TEXT NOT NULL,
        data_json TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,

        FOREIGN KEY(owner_id) REFERENCES users(id)
    );

    CREATE INDEX records_owner_kind ON records (owner_id, kind, created_at);

    CREATE VIRTUAL TABLE records_fts USING fts5(
        record_id UNINDEXED,
        content,
        tokenize = 'porter'
    );
"#;

/// Age-encrypted SQLite storage engine.
pub struct AgeSqliteStorage {
    path: PathBuf,
    conn: Mutex<Connection>,
    store_id: Uuid,
}

impl AgeSqliteStorage {
    /// Lock the database connection, returning an error if the mutex is poisoned.
    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| DeskError::Storage("SQLite connection poisoned".to_string()))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn owned_data_from_bytes(bytes: &[u8]) -> Result<OwnedData> {
        if bytes.is_empty() {
            return Err(DeskError::Storage("SQLite payload is empty".to_string()));
        }

        let size: i32 = bytes
            .len()
            .try_into()
            .map_err(|_| DeskError::Storage("SQLite payload too large".to_string()))?;

        // SAFETY: sqlite3_malloc returns either null or a buffer of `size` bytes.
        // Null is checked immediately below.
        let raw = unsafe { rusqlite::ffi::sqlite3_malloc(size) as *mut u8 };
        if raw.is_null() {
            return Err(DeskError::Storage("SQLite allocation failed".to_string()));
        }

        // SAFETY:
        // - `raw` is a fresh, non-null allocation of exactly `bytes.len()` bytes
        // - `bytes` is valid for reads of `bytes.len()` bytes and cannot overlap `raw`
        // - `OwnedData` takes ownership of the sqlite3_malloc'd buffer and frees it
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), raw, bytes.len());
            let ptr = NonNull::new(raw).ok_or_else(|| {
                DeskError::Storage("SQLite allocation returned null".to_string())
            })?;
            Ok(OwnedData::from_raw_nonnull(ptr, bytes.len()))
        }
    }

    fn write_encrypted(path: &Path, plaintext: &[u8], passphrase: &str) -> Result<()> {
        let encrypted = encrypt(plaintext, passphrase)?;
        crate::fs::write_atomic(path, &encrypted)
            .map_err(|e| DeskError::Storage(format!("Atomic write failed: {}", e)))
    }

    fn ensure_user(conn: &Connection, user_id: &Uuid) -> Result<()> {
        let exists: Option<String> = conn
            .query_row(
                "SELECT id FROM users WHERE id = ?",
                [user_id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        if exists.is_none() {
            return Err(DeskError::NotFound(format!("User {}", user_id)));
        }
        Ok(())
    }

    fn record_payload<R: Record>(record: &R) -> Result<(String, String)> {
        record.validate()?;
        let data_json = serde_json::to_string(record)
            .map_err(|e| DeskError::Storage(format!("Failed to serialize record: {}", e)))?;
        if data_json.len() > MAX_DATA_BYTES {
            return Err(DeskError::Validation(format!(
                "Record too large (max {} bytes)",
                MAX_DATA_BYTES
            )));
        }
        Ok((data_json, record.search_text()))
    }

    fn query_envelopes(
        conn: &Connection,
        query: &str,
        params: &[Box<dyn rusqlite::ToSql>],
    ) -> Result<Vec<RecordEnvelope>> {
        let mut stmt = conn.prepare(query)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(params.iter()),
            RecordRow::from_row,
        )?;

        let mut envelopes = Vec::new();
        for row in rows {
            envelopes.push(row?.try_into()?);
        }
        Ok(envelopes)
    }
}

/// Timestamp format used for every stored time.
///
/// Fixed precision and a `Z` suffix keep lexical and chronological order equal.
fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Turn free text into an FTS5 query of quoted terms, so that punctuation in
/// user input is matched literally instead of parsed as query syntax.
fn fts_query(query: &str) -> Result<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect();
    if terms.is_empty() {
        return Err(DeskError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    }
    Ok(terms.join(" "))
}

impl StorageEngine for AgeSqliteStorage {
    fn create(path: &Path, passphrase: &str) -> Result<Uuid> {
        if path.exists() {
            return Err(DeskError::Storage("Store file already exists".to_string()));
        }

        validate_passphrase(passphrase)?;

        let store_id = Uuid::new_v4();
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;

        let created_at = timestamp(Utc::now());
        let store_id_str = store_id.to_string();
        for (key, value) in [
            ("format_version", FORMAT_VERSION),
            ("store_id", store_id_str.as_str()),
            ("created_at", created_at.as_str()),
            ("last_modified", created_at.as_str()),
        ] {
            conn.execute("INSERT INTO meta (key, value) VALUES (?, ?)", [key, value])?;
        }

        let data = conn.serialize(DatabaseName::Main)?;
        Self::write_encrypted(path, data.as_ref(), passphrase)?;

        log::debug!("created store {} at {}", store_id, path.display());
        Ok(store_id)
    }

    fn open(path: &Path, passphrase: &str) -> Result<Self> {
        if !path.exists() {
            return Err(DeskError::StoreNotFound);
        }

        validate_passphrase(passphrase)?;

        let encrypted = fs::read(path)?;
        let plaintext = decrypt(&encrypted, passphrase)?;
        let mut conn = Connection::open_in_memory()?;
        let owned_data = Self::owned_data_from_bytes(&plaintext)?;
        conn.deserialize(DatabaseName::Main, owned_data, false)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        let store_id_str: String = conn.query_row(
            "SELECT value FROM meta WHERE key = 'store_id'",
            [],
            |row| row.get(0),
        )?;
        let store_id = parse_uuid(&store_id_str, "store")?;

        log::debug!("opened store {} from {}", store_id, path.display());
        Ok(Self {
            path: path.to_path_buf(),
            conn: Mutex::new(conn),
            store_id,
        })
    }

    fn close(self, passphrase: &str) -> Result<()> {
        validate_passphrase(passphrase)?;
        let conn = self
            .conn
            .into_inner()
            .map_err(|_| DeskError::Storage("SQLite connection poisoned".to_string()))?;
        let data = conn.serialize(DatabaseName::Main)?;
        Self::write_encrypted(&self.path, data.as_ref(), passphrase)?;
        log::debug!("closed store {} to {}", self.store_id, self.path.display());
        Ok(())
    }

    fn metadata(&self) -> Result<StoreMetadata> {
        let conn = self.lock_conn()?;
        let read = |key: &str| -> Result<String> {
            conn.query_row("SELECT value FROM meta WHERE key = ?", [key], |row| {
                row.get(0)
            })
            .map_err(|e| DeskError::Storage(format!("Missing metadata {}: {}", key, e)))
        };

        Ok(StoreMetadata {
            format_version: read("format_version")?,
            store_id: self.store_id,
            created_at: parse_timestamp(&read("created_at")?)?,
            last_modified: parse_timestamp(&read("last_modified")?)?,
        })
    }

    fn create_user(&mut self, name: &str) -> Result<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DeskError::InvalidInput(
                "User name cannot be empty".to_string(),
            ));
        }

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let existing: Option<String> = tx
            .query_row("SELECT id FROM users WHERE name = ?", [name], |row| {
                row.get(0)
            })
            .optional()?;
        if existing.is_some() {
            return Err(DeskError::InvalidInput(format!(
                "User \"{}\" already exists",
                name
            )));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now,
        };
        tx.execute(
            "INSERT INTO users (id, name, created_at) VALUES (?, ?, ?)",
            (user.id.to_string(), &user.name, timestamp(now)),
        )?;
        tx.execute(
            "UPDATE meta SET value = ? WHERE key = 'last_modified'",
            [timestamp(now)],
        )?;
        tx.commit()?;

        log::debug!("created user {} ({})", user.name, user.id);
        Ok(user)
    }

    fn get_user(&self, name: &str) -> Result<Option<User>> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                "SELECT id, name, created_at FROM users WHERE name = ?",
                [name.trim()],
                |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        created_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        row.map(User::try_from).transpose()
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.lock_conn()?;
        let mut stmt = conn.prepare("SELECT id, name, created_at FROM users ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?.try_into()?);
        }
        Ok(users)
    }

    fn insert<R: Record>(&mut self, session: &Session, record: &R) -> Result<Uuid> {
        let (data_json, search_text) = Self::record_payload(record)?;

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;
        Self::ensure_user(&tx, &session.user_id)?;

        let id = Uuid::new_v4();
        let now = timestamp(Utc::now());
        tx.execute(
            r#"
            INSERT INTO records (id, kind, owner_id, data_json, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            (
                id.to_string(),
                R::KIND.as_str(),
                session.user_id.to_string(),
                data_json,
                &now,
                &now,
            ),
        )?;
        tx.execute(
            "INSERT INTO records_fts (record_id, content) VALUES (?, ?)",
            (id.to_string(), search_text),
        )?;
        tx.execute(
            "UPDATE meta SET value = ? WHERE key = 'last_modified'",
            [&now],
        )?;
        tx.commit()?;

        log::debug!("inserted {} {} for {}", R::KIND, id, session.user_name);
        Ok(id)
    }

    fn get<R: Record>(&self, session: &Session, id: &Uuid) -> Result<Option<Stored<R>>> {
        let conn = self.lock_conn()?;
        let row = conn
            .query_row(
                &format!(
                    "SELECT {} FROM records r WHERE r.id = ? AND r.owner_id = ? AND r.kind = ?",
                    RECORD_COLUMNS
                ),
                (
                    id.to_string(),
                    session.user_id.to_string(),
                    R::KIND.as_str(),
                ),
                RecordRow::from_row,
            )
            .optional()?;

        match row {
            Some(row) => {
                let envelope: RecordEnvelope = row.try_into()?;
                Ok(Some(envelope.decode::<R>()?))
            }
            None => Ok(None),
        }
    }

    fn list<R: Record>(&self, session: &Session, filter: &RecordFilter) -> Result<Vec<Stored<R>>> {
        let conn = self.lock_conn()?;

        let mut conditions = vec!["r.owner_id = ?".to_string(), "r.kind = ?".to_string()];
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![
            Box::new(session.user_id.to_string()),
            Box::new(R::KIND.as_str()),
        ];

        if let Some(since) = filter.since {
            conditions.push("r.created_at >= ?".to_string());
            params.push(Box::new(timestamp(since)));
        }
        if let Some(until) = filter.until {
            conditions.push("r.created_at <= ?".to_string());
            params.push(Box::new(timestamp(until)));
        }

        let mut query = format!(
            "SELECT {} FROM records r WHERE {} ORDER BY r.created_at DESC, r.id DESC",
            RECORD_COLUMNS,
            conditions.join(" AND ")
        );
        if let Some(limit) = filter.limit {
            query.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        Self::query_envelopes(&conn, &query, &params)?
            .iter()
            .map(|envelope| envelope.decode::<R>())
            .collect()
    }

    fn update<R: Record>(&mut self, session: &Session, id: &Uuid, record: &R) -> Result<()> {
        let (data_json, search_text) = Self::record_payload(record)?;

        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let now = timestamp(Utc::now());
        let changed = tx.execute(
            r#"
            UPDATE records SET data_json = ?, updated_at = ?
            WHERE id = ? AND owner_id = ? AND kind = ?
            "#,
            (
                data_json,
                &now,
                id.to_string(),
                session.user_id.to_string(),
                R::KIND.as_str(),
            ),
        )?;
        if changed == 0 {
            return Err(DeskError::NotFound(format!("{} {}", R::KIND, id)));
        }

        tx.execute(
            "DELETE FROM records_fts WHERE record_id = ?",
            [id.to_string()],
        )?;
        tx.execute(
            "INSERT INTO records_fts (record_id, content) VALUES (?, ?)",
            (id.to_string(), search_text),
        )?;
        tx.execute(
            "UPDATE meta SET value = ? WHERE key = 'last_modified'",
            [&now],
        )?;
        tx.commit()?;

        log::debug!("updated {} {} for {}", R::KIND, id, session.user_name);
        Ok(())
    }

    fn delete(&mut self, session: &Session, kind: RecordKind, id: &Uuid) -> Result<()> {
        let mut conn = self.lock_conn()?;
        let tx = conn.transaction()?;

        let changed = tx.execute(
            "DELETE FROM records WHERE id = ? AND owner_id = ? AND kind = ?",
            (id.to_string(), session.user_id.to_string(), kind.as_str()),
        )?;
        if changed == 0 {
            return Err(DeskError::NotFound(format!("{} {}", kind, id)));
        }

        tx.execute(
            "DELETE FROM records_fts WHERE record_id = ?",
            [id.to_string()],
        )?;
        tx.execute(
            "UPDATE meta SET value = ? WHERE key = 'last_modified'",
            [timestamp(Utc::now())],
        )?;
        tx.commit()?;

        log::debug!("deleted {} {} for {}", kind, id, session.user_name);
        Ok(())
    }

    fn search(
        &self,
        session: &Session,
        query: &str,
        kind: Option<RecordKind>,
    ) -> Result<Vec<RecordEnvelope>> {
        let match_expr = fts_query(query)?;
        let conn = self.lock_conn()?;

        let mut sql = format!(
            r#"
            SELECT {}
            FROM records_fts f
            JOIN records r ON r.id = f.record_id
            WHERE records_fts MATCH ? AND r.owner_id = ?
            "#,
            RECORD_COLUMNS
        );
        let mut params: Vec<Box<dyn rusqlite::ToSql>> =
            vec![Box::new(match_expr), Box::new(session.user_id.to_string())];
        if let Some(kind) = kind {
            sql.push_str(" AND r.kind = ?");
            params.push(Box::new(kind.as_str()));
        }
        sql.push_str(" ORDER BY bm25(records_fts), r.created_at DESC");

        Self::query_envelopes(&conn, &sql, &params)
    }

    fn export(&self, session: &Session) -> Result<Vec<RecordEnvelope>> {
        let conn = self.lock_conn()?;
        let sql = format!(
            "SELECT {} FROM records r WHERE r.owner_id = ? ORDER BY r.created_at ASC, r.id ASC",
            RECORD_COLUMNS
        );
        let params: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(session.user_id.to_string())];
        Self::query_envelopes(&conn, &sql, &params)
    }

    fn check_integrity(&self) -> Result<()> {
        let conn = self.lock_conn()?;

        let mut stmt = conn.prepare("PRAGMA foreign_key_check")?;
        let mut rows = stmt.query([])?;
        if rows.next()?.is_some() {
            return Err(DeskError::Storage(
                "Foreign key integrity check failed".to_string(),
            ));
        }

        let missing_fts: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records r LEFT JOIN records_fts f ON r.id = f.record_id WHERE f.record_id IS NULL",
            [],
            |row| row.get(0),
        )?;
        if missing_fts > 0 {
            return Err(DeskError::Storage(
                "Search index missing records".to_string(),
            ));
        }

        let orphaned_fts: i64 = conn.query_row(
            "SELECT COUNT(*) FROM records_fts f LEFT JOIN records r ON f.record_id = r.id WHERE r.id IS NULL",
            [],
            |row| row.get(0),
        )?;
        if orphaned_fts > 0 {
            return Err(DeskError::Storage(
                "Search index has orphaned rows".to_string(),
            ));
        }

        let mut kinds = conn.prepare("SELECT DISTINCT kind FROM records")?;
        let kind_rows = kinds.query_map([], |row| row.get::<_, String>(0))?;
        for kind in kind_rows {
            let kind = kind?;
            if kind.parse::<RecordKind>().is_err() {
                return Err(DeskError::Storage(format!(
                    "Unknown record kind in store: {}",
                    kind
                )));
            }
        }

        for key in REQUIRED_META_KEYS {
            let present: Option<String> = conn
                .query_row("SELECT value FROM meta WHERE key = ?", [key], |row| {
                    row.get(0)
                })
                .optional()?;
            if present.is_none() {
                return Err(DeskError::Storage(format!("Missing metadata key: {}", key)));
            }
        }

        Ok(())
    }
}
