use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::NaiveDate;
use deskboard_core::matter::{Matter, MatterStage};
use deskboard_core::money::Money;
use deskboard_core::networth::{self, NetWorthEntry, NetWorthType};
use deskboard_core::note::Note;
use deskboard_core::storage::{AgeSqliteStorage, RecordFilter, Session, StorageEngine};
use deskboard_core::{DeskError, RecordKind};

const PASSPHRASE: &str = "test-passphrase-secure-123";

struct TempFile {
    path: PathBuf,
}

impl TempFile {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time should be available")
            .as_nanos();
        let filename = format!("{}_{}_{}.deskboard", prefix, std::process::id(), nanos);
        let path = std::env::temp_dir().join(filename);
        Self { path }
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

fn date(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid date")
}

fn note(title: &str, body: &str) -> Note {
    Note::new(title, body, &[]).expect("valid note")
}

/// Create a store with two users and return it opened.
fn store_with_users(temp: &TempFile) -> (AgeSqliteStorage, Session, Session) {
    AgeSqliteStorage::create(&temp.path, PASSPHRASE).expect("create should succeed");
    let mut storage = AgeSqliteStorage::open(&temp.path, PASSPHRASE).expect("open should succeed");
    let alice = storage.create_user("alice").expect("create alice");
    let bob = storage.create_user("bob").expect("create bob");
    (storage, Session::from(&alice), Session::from(&bob))
}

#[test]
fn test_create_open_close_round_trip() {
    let temp = TempFile::new("deskboard_storage_round_trip");

    let store_id = AgeSqliteStorage::create(&temp.path, PASSPHRASE).expect("create should succeed");
    assert!(!store_id.is_nil());
    assert!(temp.path.exists());

    let mut storage = AgeSqliteStorage::open(&temp.path, PASSPHRASE).expect("open should succeed");
    assert_eq!(storage.metadata().expect("metadata").store_id, store_id);
    let user = storage.create_user("alice").expect("create user");
    let session = Session::from(&user);
    let id = storage
        .insert(&session, &note("Kickoff", "agenda items"))
        .expect("insert should succeed");
    storage.close(PASSPHRASE).expect("close should succeed");

    let on_disk = fs::read(&temp.path).expect("read should succeed");
    assert!(!on_disk.is_empty());
    assert!(!String::from_utf8_lossy(&on_disk).contains("Kickoff"));

    let storage = AgeSqliteStorage::open(&temp.path, PASSPHRASE).expect("reopen should succeed");
    let stored = storage
        .get::<Note>(&session, &id)
        .expect("get should succeed")
        .expect("note should exist");
    assert_eq!(stored.record.title, "Kickoff");
    assert_eq!(stored.owner_id, user.id);
}

#[test]
fn test_create_refuses_existing_file_and_weak_passphrase() {
    let temp = TempFile::new("deskboard_storage_create_twice");
    AgeSqliteStorage::create(&temp.path, PASSPHRASE).expect("create should succeed");
    assert!(AgeSqliteStorage::create(&temp.path, PASSPHRASE).is_err());

    let other = TempFile::new("deskboard_storage_weak");
    let result = AgeSqliteStorage::create(&other.path, "short");
    assert!(matches!(result, Err(DeskError::InvalidInput(_))));
    assert!(!other.path.exists());
}

#[test]
fn test_open_wrong_passphrase_fails() {
    let temp = TempFile::new("deskboard_storage_wrong_passphrase");
    AgeSqliteStorage::create(&temp.path, PASSPHRASE).expect("create should succeed");

    let result = AgeSqliteStorage::open(&temp.path, "wrong-passphrase-456");
    assert!(matches!(result, Err(DeskError::IncorrectPassphrase)));
}

#[test]
fn test_open_missing_file_fails() {
    let temp = TempFile::new("deskboard_storage_missing");
    let result = AgeSqliteStorage::open(&temp.path, PASSPHRASE);
    assert!(matches!(result, Err(DeskError::StoreNotFound)));
}

#[test]
fn test_duplicate_user_rejected() {
    let temp = TempFile::new("deskboard_storage_duplicate_user");
    let (mut storage, _, _) = store_with_users(&temp);

    assert!(storage.create_user(" alice ").is_err());
    assert!(storage.create_user("   ").is_err());
    let names: Vec<String> = storage
        .list_users()
        .expect("list users")
        .into_iter()
        .map(|u| u.name)
        .collect();
    assert_eq!(names, vec!["alice".to_string(), "bob".to_string()]);
    assert!(storage.get_user("carol").expect("lookup").is_none());
}

#[test]
fn test_records_are_invisible_to_other_users() {
    let temp = TempFile::new("deskboard_storage_isolation");
    let (mut storage, alice, bob) = store_with_users(&temp);

    let id = storage
        .insert(&alice, &note("Private", "salary review"))
        .expect("insert");

    assert!(storage.get::<Note>(&bob, &id).expect("get").is_none());
    assert!(storage
        .list::<Note>(&bob, &RecordFilter::new())
        .expect("list")
        .is_empty());
    assert!(storage.search(&bob, "salary", None).expect("search").is_empty());
    assert!(storage.export(&bob).expect("export").is_empty());

    let update = storage.update(&bob, &id, &note("Hijacked", ""));
    assert!(matches!(update, Err(DeskError::NotFound(_))));
    let delete = storage.delete(&bob, RecordKind::Note, &id);
    assert!(matches!(delete, Err(DeskError::NotFound(_))));

    let stored = storage.get::<Note>(&alice, &id).expect("get").expect("exists");
    assert_eq!(stored.record.title, "Private");
}

#[test]
fn test_get_with_wrong_kind_returns_none() {
    let temp = TempFile::new("deskboard_storage_kind");
    let (mut storage, alice, _) = store_with_users(&temp);

    let id = storage.insert(&alice, &note("Kind", "check")).expect("insert");
    assert!(storage.get::<Matter>(&alice, &id).expect("get").is_none());
    assert!(matches!(
        storage.delete(&alice, RecordKind::Matter, &id),
        Err(DeskError::NotFound(_))
    ));
}

#[test]
fn test_update_overwrites_and_reindexes() {
    let temp = TempFile::new("deskboard_storage_update");
    let (mut storage, alice, _) = store_with_users(&temp);

    let mut matter = Matter::new("M-100", "Acme", MatterStage::Intake, date("2025-01-06"));
    let id = storage.insert(&alice, &matter).expect("insert");

    matter.advance_to(MatterStage::Submitted, date("2025-02-01"));
    matter.client = "Globex".to_string();
    storage.update(&alice, &id, &matter).expect("update");

    let stored = storage.get::<Matter>(&alice, &id).expect("get").expect("exists");
    assert_eq!(stored.record.stage, MatterStage::Submitted);
    assert!(stored.updated_at >= stored.created_at);

    assert!(storage.search(&alice, "Acme", None).expect("search").is_empty());
    let hits = storage
        .search(&alice, "Globex", Some(RecordKind::Matter))
        .expect("search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, id);
    storage.check_integrity().expect("integrity after update");
}

#[test]
fn test_invalid_record_is_not_written() {
    let temp = TempFile::new("deskboard_storage_invalid");
    let (mut storage, alice, _) = store_with_users(&temp);

    let blank = Matter::new("", "Acme", MatterStage::Intake, date("2025-01-06"));
    assert!(matches!(
        storage.insert(&alice, &blank),
        Err(DeskError::Validation(_))
    ));
    assert!(storage
        .list::<Matter>(&alice, &RecordFilter::new())
        .expect("list")
        .is_empty());
}

#[test]
fn test_list_newest_first_with_limit() {
    let temp = TempFile::new("deskboard_storage_list");
    let (mut storage, alice, _) = store_with_users(&temp);

    for title in ["first", "second", "third"] {
        storage.insert(&alice, &note(title, "")).expect("insert");
        std::thread::sleep(std::time::Duration::from_millis(2));
    }

    let all = storage.list::<Note>(&alice, &RecordFilter::new()).expect("list");
    let titles: Vec<&str> = all.iter().map(|s| s.record.title.as_str()).collect();
    assert_eq!(titles, vec!["third", "second", "first"]);

    let limited = storage
        .list::<Note>(&alice, &RecordFilter::new().limit(1))
        .expect("list");
    assert_eq!(limited.len(), 1);
    assert_eq!(limited[0].record.title, "third");
}

#[test]
fn test_search_handles_punctuation() {
    let temp = TempFile::new("deskboard_storage_search");
    let (mut storage, alice, _) = store_with_users(&temp);

    storage
        .insert(&alice, &note("Visa renewal", "collect documents: passport"))
        .expect("insert");
    storage.insert(&alice, &note("Lunch", "team")).expect("insert");

    let hits = storage.search(&alice, "passport", None).expect("search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].kind, RecordKind::Note);
    assert!(storage.search(&alice, "documents:", None).is_ok());
    assert!(storage.search(&alice, "   ", None).is_err());
}

#[test]
fn test_delete_removes_record_and_index() {
    let temp = TempFile::new("deskboard_storage_delete");
    let (mut storage, alice, _) = store_with_users(&temp);

    let id = storage.insert(&alice, &note("Temp", "scratch")).expect("insert");
    storage.delete(&alice, RecordKind::Note, &id).expect("delete");

    assert!(storage.get::<Note>(&alice, &id).expect("get").is_none());
    assert!(storage.search(&alice, "scratch", None).expect("search").is_empty());
    storage.check_integrity().expect("integrity after delete");
}

#[test]
fn test_export_contains_every_kind() {
    let temp = TempFile::new("deskboard_storage_export");
    let (mut storage, alice, bob) = store_with_users(&temp);

    storage.insert(&alice, &note("One", "")).expect("insert");
    std::thread::sleep(std::time::Duration::from_millis(2));
    storage
        .insert(
            &alice,
            &NetWorthEntry::new(
                NetWorthType::Asset,
                "Cash",
                Money::from_cents(100),
                date("2025-01-01"),
            ),
        )
        .expect("insert");
    storage.insert(&bob, &note("Bob's", "")).expect("insert");

    let exported = storage.export(&alice).expect("export");
    assert_eq!(exported.len(), 2);
    assert!(exported.iter().all(|e| e.owner_id == alice.user_id));
    assert_eq!(exported[0].kind, RecordKind::Note);
    assert_eq!(exported[1].kind, RecordKind::NetWorth);
}

#[test]
fn test_net_worth_latest_wins_through_store() {
    let temp = TempFile::new("deskboard_storage_networth");
    let (mut storage, alice, _) = store_with_users(&temp);

    let entries = [
        (NetWorthType::Asset, "House", 300_000_00, "2025-01-01"),
        (NetWorthType::Asset, "house", 310_000_00, "2025-02-01"),
        (NetWorthType::Loan, "Mortgage", 200_000_00, "2025-01-01"),
        (NetWorthType::Saving, "Pension", 50_000_00, "2025-01-15"),
        (NetWorthType::Saving, "Pension", 55_000_00, "2025-01-15"),
    ];
    for (kind, label, cents, logged) in entries {
        storage
            .insert(
                &alice,
                &NetWorthEntry::new(kind, label, Money::from_cents(cents), date(logged)),
            )
            .expect("insert");
        std::thread::sleep(std::time::Duration::from_millis(2));
    }

    let stored = storage
        .list::<NetWorthEntry>(&alice, &RecordFilter::new())
        .expect("list");
    let summary = networth::summarize(&stored, None);

    assert_eq!(summary.assets, Money::from_cents(310_000_00));
    assert_eq!(summary.savings, Money::from_cents(55_000_00));
    assert_eq!(summary.loans, Money::from_cents(200_000_00));
    assert_eq!(summary.net, Money::from_cents(165_000_00));
    assert_eq!(summary.entries.len(), 3);
}

#[test]
fn test_check_integrity_on_fresh_store() {
    let temp = TempFile::new("deskboard_storage_integrity");
    let (mut storage, alice, _) = store_with_users(&temp);
    storage.insert(&alice, &note("Check", "")).expect("insert");
    storage.check_integrity().expect("fresh store should be consistent");
}
