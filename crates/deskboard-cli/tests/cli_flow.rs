use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use deskboard_core::storage::encryption;
use rusqlite::Connection;
use tempfile::TempDir;

const PASSPHRASE: &str = "correct horse battery staple";
const TODAY: &str = "2025-01-07";

fn bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_deskboard"))
}

/// An isolated home: its own XDG dirs and store file.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        let dir = TempDir::new().expect("temp dir");
        std::fs::create_dir_all(dir.path().join("config")).expect("config dir");
        std::fs::create_dir_all(dir.path().join("data")).expect("data dir");
        Self { dir }
    }

    fn store_path(&self) -> PathBuf {
        self.dir.path().join("data").join("desk.deskboard")
    }

    fn command(&self, passphrase: &str, args: &[&str]) -> Command {
        let mut cmd = Command::new(bin());
        cmd.args(args)
            .arg("--today")
            .arg(TODAY)
            .arg("--no-input")
            .env("XDG_CONFIG_HOME", self.dir.path().join("config"))
            .env("XDG_DATA_HOME", self.dir.path().join("data"))
            .env("HOME", self.dir.path())
            .env("DESKBOARD_PASSPHRASE", passphrase)
            .env("NO_COLOR", "1")
            .env_remove("DESKBOARD_PATH")
            .env_remove("DESKBOARD_USER")
            .env_remove("DESKBOARD_CONFIG")
            .env_remove("DESKBOARD_LOG");
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command(PASSPHRASE, args).output().expect("run deskboard")
    }

    fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "deskboard {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).expect("utf8 stdout")
    }

    fn run_json(&self, args: &[&str]) -> serde_json::Value {
        let stdout = self.run_ok(args);
        serde_json::from_str(&stdout).expect("valid json")
    }

    fn init(&self, user: &str) {
        let store = self.store_path();
        let store = store.to_str().expect("utf8 path");
        self.run_ok(&["init", store, "--user", user, "--timezone", "UTC"]);
    }
}

fn decrypted_connection(store: &Path, dir: &Path) -> Connection {
    let encrypted = std::fs::read(store).expect("read store");
    let plaintext = encryption::decrypt(&encrypted, PASSPHRASE).expect("decrypt store");
    let copy = dir.join("plain.sqlite");
    std::fs::write(&copy, plaintext).expect("write plaintext copy");
    Connection::open(&copy).expect("open plaintext copy")
}

#[test]
fn test_init_creates_store_and_config() {
    let sandbox = Sandbox::new();
    sandbox.init("alice");

    assert!(sandbox.store_path().exists());
    let config = sandbox
        .dir
        .path()
        .join("config")
        .join("deskboard")
        .join("config.toml");
    assert!(config.exists());

    let users = sandbox.run_json(&["user", "list", "--json"]);
    let names: Vec<&str> = users
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|u| u["name"].as_str())
        .collect();
    assert_eq!(names, vec!["alice"]);
}

#[test]
fn test_init_refuses_existing_store() {
    let sandbox = Sandbox::new();
    sandbox.init("alice");

    let store = sandbox.store_path();
    let output = sandbox.run(&["init", store.to_str().expect("utf8 path"), "--user", "alice"]);
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_matter_sla_status_from_opened_date() {
    let sandbox = Sandbox::new();
    sandbox.init("alice");

    sandbox.run_ok(&["matter", "add", "M-001", "Acme Ltd", "--opened", "2025-01-01"]);
    sandbox.run_ok(&["matter", "add", "M-002", "Globex", "--opened", "2025-01-06"]);

    let matters = sandbox.run_json(&["matter", "list", "--json"]);
    let matters = matters.as_array().expect("array");
    assert_eq!(matters.len(), 2);

    let acme = matters
        .iter()
        .find(|m| m["reference"] == "M-001")
        .expect("M-001 listed");
    assert_eq!(acme["client"], "Acme Ltd");
    assert_eq!(acme["sla"]["status"], "at_risk");
    assert_eq!(acme["sla"]["elapsed_days"], 6);

    let globex = matters
        .iter()
        .find(|m| m["reference"] == "M-002")
        .expect("M-002 listed");
    assert_eq!(globex["sla"]["status"], "within_sla");

    let at_risk = sandbox.run_ok(&["matter", "list", "--status", "at_risk"]);
    let lines: Vec<&str> = at_risk.lines().collect();
    assert_eq!(lines.len(), 1);
    let fields: Vec<&str> = lines[0].split('\t').collect();
    assert_eq!(fields[1], "M-001");
    assert_eq!(fields[2], "Acme Ltd");
    assert_eq!(fields[5], "at_risk");
}

#[test]
fn test_networth_summary_keeps_latest_per_label() {
    let sandbox = Sandbox::new();
    sandbox.init("alice");

    sandbox.run_ok(&["networth", "add", "asset", "Broker", "1000.00", "--on", "2025-01-01"]);
    sandbox.run_ok(&["networth", "add", "asset", "broker", "1500.00", "--on", "2025-01-05"]);
    sandbox.run_ok(&["networth", "add", "loan", "Car", "200.00", "--on", "2025-01-02"]);

    let summary = sandbox.run_json(&["networth", "summary", "--json"]);
    assert_eq!(summary["assets"], 150000);
    assert_eq!(summary["loans"], 20000);
    assert_eq!(summary["net"], 130000);
    assert_eq!(summary["entries"].as_array().expect("entries").len(), 2);

    let earlier = sandbox.run_json(&["networth", "summary", "--as-of", "2025-01-03", "--json"]);
    assert_eq!(earlier["assets"], 100000);
}

#[test]
fn test_users_only_see_their_own_records() {
    let sandbox = Sandbox::new();
    sandbox.init("alice");
    sandbox.run_ok(&["user", "add", "bob"]);

    sandbox.run_ok(&["note", "add", "Standup", "--body", "ship the release"]);
    sandbox.run_ok(&["--user", "bob", "note", "add", "Private", "--body", "bob only"]);

    let alice = sandbox.run_json(&["note", "list", "--json"]);
    let bob = sandbox.run_json(&["--user", "bob", "note", "list", "--json"]);
    assert_eq!(alice.as_array().expect("array").len(), 1);
    assert_eq!(alice[0]["title"], "Standup");
    assert_eq!(bob.as_array().expect("array").len(), 1);
    assert_eq!(bob[0]["title"], "Private");

    let found = sandbox.run_json(&["--user", "bob", "search", "release", "--json"]);
    assert!(found.as_array().expect("array").is_empty());

    let output = sandbox.run(&["--user", "carol", "note", "list"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_store_is_encrypted_at_rest() {
    let sandbox = Sandbox::new();
    sandbox.init("alice");
    sandbox.run_ok(&["matter", "add", "M-900", "Initech Confidential"]);

    let raw = std::fs::read(sandbox.store_path()).expect("read store");
    let needle = b"Initech Confidential";
    assert!(!raw.windows(needle.len()).any(|w| w == needle));

    let conn = decrypted_connection(&sandbox.store_path(), sandbox.dir.path());
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM records WHERE kind = 'matter'",
            [],
            |row| row.get(0),
        )
        .expect("count matters");
    assert_eq!(count, 1);
}

#[test]
fn test_wrong_passphrase_exits_with_auth_code() {
    let sandbox = Sandbox::new();
    sandbox.init("alice");

    let output = sandbox
        .command("not the passphrase", &["matter", "list"])
        .output()
        .expect("run deskboard");
    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn test_missing_store_exits_with_not_found() {
    let sandbox = Sandbox::new();
    let missing = sandbox.dir.path().join("nowhere.deskboard");

    let output = sandbox.run(&["--store", missing.to_str().expect("utf8 path"), "matter", "list"]);
    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("deskboard init"));
}

#[test]
fn test_check_and_export_jsonl() {
    let sandbox = Sandbox::new();
    sandbox.init("alice");
    sandbox.run_ok(&["matter", "add", "M-100", "Hooli"]);
    sandbox.run_ok(&["meeting", "add", "Kickoff", "--at", "2025-01-08 09:00"]);

    let check = sandbox.run_ok(&["check"]);
    assert!(check.contains("ok"));

    let export = sandbox.run_ok(&["export", "--format", "jsonl"]);
    let lines: Vec<serde_json::Value> = export
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().any(|l| l["kind"] == "matter"));
    assert!(lines.iter().any(|l| l["kind"] == "meeting"));

    let matters_only = sandbox.run_json(&["export", "--kind", "matter"]);
    assert_eq!(matters_only.as_array().expect("array").len(), 1);
}

#[test]
fn test_dashboard_json_overview() {
    let sandbox = Sandbox::new();
    sandbox.init("alice");
    sandbox.run_ok(&["matter", "add", "M-200", "Umbrella", "--opened", "2024-12-20"]);
    sandbox.run_ok(&["networth", "add", "saving", "Rainy day", "250.50"]);
    sandbox.run_ok(&["meeting", "add", "Review", "--at", "2025-01-09 14:00"]);

    let overview = sandbox.run_json(&["dashboard", "--json"]);
    assert_eq!(overview["today"], TODAY);
    assert_eq!(overview["sla_counts"]["overdue"], 1);
    assert_eq!(overview["urgent_matters"][0]["reference"], "M-200");
    assert_eq!(overview["net_worth"]["savings"], 25050);
    assert_eq!(overview["upcoming_meetings"][0]["title"], "Review");
}

#[test]
fn test_meeting_conflicts_are_flagged() {
    let sandbox = Sandbox::new();
    sandbox.init("alice");
    sandbox.run_ok(&["meeting", "add", "Planning", "--at", "2025-01-08 09:00", "--duration", "1h"]);

    let output = sandbox.run(&["meeting", "add", "Budget", "--at", "2025-01-08 09:30"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("conflicts with \"Planning\""), "stderr: {}", stderr);

    sandbox.run_ok(&["meeting", "add", "Lunch", "--at", "2025-01-08 12:00"]);
    let meetings = sandbox.run_json(&["meeting", "list", "--json"]);
    let flagged: Vec<(&str, bool)> = meetings
        .as_array()
        .expect("array")
        .iter()
        .map(|m| {
            (
                m["title"].as_str().expect("title"),
                m["conflict"].as_bool().expect("conflict flag"),
            )
        })
        .collect();
    assert_eq!(
        flagged,
        vec![("Planning", true), ("Budget", true), ("Lunch", false)]
    );

    let output = sandbox.run(&["meeting", "upcoming", "--within", "1000000000d"]);
    assert_eq!(output.status.code(), Some(4));
}

#[test]
fn test_leave_summary_uses_configured_allowance() {
    let sandbox = Sandbox::new();
    sandbox.init("alice");
    let config = sandbox
        .dir
        .path()
        .join("config")
        .join("deskboard")
        .join("config.toml");
    let mut contents = std::fs::read_to_string(&config).expect("read config");
    contents.push_str("\n[leave.allowances]\nannual = 25\n");
    std::fs::write(&config, contents).expect("write config");

    sandbox.run_ok(&[
        "leave", "add", "annual", "2025-01-06", "2025-01-08", "--status", "approved",
    ]);
    sandbox.run_ok(&["leave", "add", "sick", "2025-01-10"]);

    let output = sandbox.run(&["leave", "add", "annual", "2025-01-08", "2025-01-09"]);
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("overlaps existing leave"), "stderr: {}", stderr);

    let summary = sandbox.run_json(&["leave", "summary", "--year", "2025", "--json"]);
    assert_eq!(summary["year"], 2025);
    let balances = summary["balances"].as_array().expect("balances");
    let balance = |kind: &str| {
        balances
            .iter()
            .find(|b| b["leave_type"] == kind)
            .unwrap_or_else(|| panic!("{} balance", kind))
    };

    let annual = balance("annual");
    assert_eq!(annual["taken"].as_f64(), Some(3.0));
    assert_eq!(annual["pending"].as_f64(), Some(2.0));
    assert_eq!(annual["allowance"].as_f64(), Some(25.0));
    assert_eq!(annual["remaining"].as_f64(), Some(22.0));

    let sick = balance("sick");
    assert_eq!(sick["pending"].as_f64(), Some(1.0));
    assert!(sick["allowance"].is_null());
}

#[test]
fn test_gtci_import_replaces_scores_and_ranks_countries() {
    let sandbox = Sandbox::new();
    sandbox.init("alice");

    let file = sandbox.dir.path().join("gtci.json");
    let write_scores = |denmark_2024: f64| {
        let scores = serde_json::json!([
            {"country": "Denmark", "year": 2023, "pillar": "overall", "score": 70.0},
            {"country": "Sweden", "year": 2023, "pillar": "overall", "score": 72.0},
            {"country": "Denmark", "year": 2024, "pillar": "overall", "score": denmark_2024},
            {"country": "Sweden", "year": 2024, "pillar": "overall", "score": 71.0},
            {"country": "Norway", "year": 2024, "pillar": "enable", "score": 60.0},
            {"country": "Norway", "year": 2024, "pillar": "grow", "score": 62.0},
        ]);
        std::fs::write(&file, scores.to_string()).expect("write scores");
    };
    let file_arg = file.to_str().expect("utf8 path").to_string();

    write_scores(65.0);
    sandbox.run_ok(&["gtci", "import", &file_arg]);
    write_scores(74.5);
    sandbox.run_ok(&["gtci", "import", &file_arg]);

    let export = sandbox.run_json(&["export", "--kind", "gtci_score"]);
    assert_eq!(export.as_array().expect("array").len(), 6);

    let report = sandbox.run_json(&["gtci", "report", "--json"]);
    assert_eq!(report["year"], 2024);
    let ranked: Vec<(&str, u64)> = report["rankings"]
        .as_array()
        .expect("rankings")
        .iter()
        .map(|r| {
            (
                r["country"].as_str().expect("country"),
                r["rank"].as_u64().expect("rank"),
            )
        })
        .collect();
    assert_eq!(ranked, vec![("Denmark", 1), ("Sweden", 2), ("Norway", 3)]);

    let top = sandbox.run_json(&["gtci", "report", "--top", "1", "--json"]);
    assert_eq!(top["rankings"].as_array().expect("rankings").len(), 1);

    let denmark = sandbox.run_json(&["gtci", "report", "--country", "denmark", "--json"]);
    assert_eq!(denmark["previous_rank"], 2);
    assert_eq!(denmark["rank_change"], 1);
    assert_eq!(denmark["score"].as_f64(), Some(74.5));

    let output = sandbox.run(&["gtci", "report", "--year", "2019"]);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_workflow_task_moves_to_next_step() {
    let sandbox = Sandbox::new();
    sandbox.init("alice");
    for step in ["Todo", "Doing", "Done"] {
        sandbox.run_ok(&["workflow", "step", "add", step]);
    }

    let steps = sandbox.run_json(&["workflow", "step", "list", "--json"]);
    let step_ids: Vec<String> = steps
        .as_array()
        .expect("array")
        .iter()
        .map(|s| s["id"].as_str().expect("id").to_string())
        .collect();
    assert_eq!(steps[0]["name"], "Todo");
    assert_eq!(step_ids.len(), 3);

    sandbox.run_ok(&["workflow", "task", "add", &step_ids[0], "Draft contract"]);
    let board = sandbox.run_json(&["workflow", "board", "--json"]);
    let task_id = board["columns"][0]["tasks"][0]["id"]
        .as_str()
        .expect("task id")
        .to_string();

    sandbox.run_ok(&["workflow", "task", "move", &task_id]);
    let board = sandbox.run_json(&["workflow", "board", "--json"]);
    assert!(board["columns"][0]["tasks"].as_array().expect("tasks").is_empty());
    assert_eq!(board["columns"][1]["tasks"][0]["title"], "Draft contract");
    assert_eq!(board["open_tasks"], 1);

    let output = sandbox.run(&["workflow", "step", "delete", &step_ids[1]]);
    assert_eq!(output.status.code(), Some(4));

    sandbox.run_ok(&["workflow", "step", "delete", &step_ids[1], "--force"]);
    let board = sandbox.run_json(&["workflow", "board", "--json"]);
    assert_eq!(board["columns"].as_array().expect("columns").len(), 2);
    assert_eq!(board["open_tasks"], 0);
}
