//! End-to-end tests for the `webvault` binary against the filesystem store

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// A home directory with a settings file whose producers are plain shell commands
    fn new(database_command: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        let site = dir.path().join("www");
        fs::create_dir_all(site.join("css")).unwrap();
        fs::write(site.join("index.html"), "<h1>hello</h1>").unwrap();
        fs::write(site.join("css").join("site.css"), "h1 { color: red }").unwrap();

        let settings = json!({
            "namespace": "myblog",
            "retention": { "keep_count": 3 },
            "database": { "command": database_command },
            "site": { "command": ["cp", "-r", site.display().to_string(), "{output}"] },
            "storage": { "backend": "filesystem", "root": dir.path().join("store") },
        });
        fs::write(
            dir.path().join("config.json"),
            serde_json::to_string_pretty(&settings).unwrap(),
        )
        .unwrap();

        Self { dir }
    }

    fn with_dump() -> Self {
        Self::new(&["sh", "-c", "printf 'CREATE TABLE posts;' > \"$0\"", "{output}"])
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("webvault").unwrap();
        cmd.env("WEBVAULT_HOME", self.dir.path())
            .env_remove("WEBVAULT_CONFIG")
            .env_remove("WEBVAULT_LOG");
        cmd
    }

    fn namespace(&self, name: &str) -> PathBuf {
        self.dir.path().join("store").join(name)
    }

    fn keys(&self, name: &str) -> Vec<String> {
        let mut keys: Vec<String> = match fs::read_dir(self.namespace(name)) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
                .filter(|name| !name.starts_with('.'))
                .collect(),
            Err(_) => Vec::new(),
        };
        keys.sort();
        keys
    }

    fn seed(&self, name: &str, keys: &[&str]) {
        fs::create_dir_all(self.namespace(name)).unwrap();
        for key in keys {
            fs::write(self.namespace(name).join(key), key).unwrap();
        }
    }
}

fn count_entries(dir: &Path) -> usize {
    fs::read_dir(dir).unwrap().count()
}

#[test]
fn backup_all_uploads_both_classes_with_shared_stamp() {
    let ws = Workspace::with_dump();

    ws.cmd()
        .args(["backup", "all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Backup complete."));

    let db = ws.keys("myblog_db");
    let site = ws.keys("myblog_site");
    assert_eq!(db.len(), 1);
    assert_eq!(site.len(), 1);
    assert!(db[0].starts_with("db."));
    assert_eq!(db[0].trim_start_matches("db."), site[0].trim_start_matches("site."));

    // Nothing left behind in staging
    let staging = ws.dir.path().join("staging");
    assert!(!staging.exists() || count_entries(&staging) == 0);
}

#[test]
fn list_shows_backups() {
    let ws = Workspace::with_dump();
    ws.seed("myblog_db", &["db.20230101000000", "db.20230102000000"]);

    ws.cmd()
        .args(["list", "db"])
        .assert()
        .success()
        .stdout(predicate::str::contains("myblog_db"))
        .stdout(predicate::str::contains("db.20230102000000"))
        .stdout(predicate::str::contains("Total: 2 backup(s)"));
}

#[test]
fn retrieve_latest_matches_stored_bytes() {
    let ws = Workspace::with_dump();
    ws.cmd().args(["backup", "db"]).assert().success();

    let key = ws.keys("myblog_db").pop().unwrap();
    let out = ws.dir.path().join("restore");
    fs::create_dir_all(&out).unwrap();

    ws.cmd()
        .args(["retrieve", "db", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains(key.as_str()));

    let retrieved = fs::read(out.join(format!("{}.tar.gz", key))).unwrap();
    let stored = fs::read(ws.namespace("myblog_db").join(&key)).unwrap();
    assert_eq!(retrieved, stored);
    // gzip magic
    assert_eq!(&retrieved[..2], &[0x1f, 0x8b]);
}

#[test]
fn retrieve_missing_identifier_fails_and_writes_nothing() {
    let ws = Workspace::with_dump();
    ws.seed("myblog_site", &["site.20230101000000"]);
    let out = ws.dir.path().join("restore");
    fs::create_dir_all(&out).unwrap();

    ws.cmd()
        .args(["retrieve", "site", "--identifier=site.20230105120000", "--output"])
        .arg(&out)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not found"))
        .stderr(predicate::str::contains("site.20230105120000"));

    assert_eq!(count_entries(&out), 0);
}

#[test]
fn cleanup_keeps_most_recent() {
    let ws = Workspace::with_dump();
    ws.seed(
        "myblog_db",
        &["db.20230101000000", "db.20230102000000", "db.20230103000000"],
    );

    ws.cmd()
        .args(["cleanup", "db", "--keep=2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted myblog_db/db.20230101000000"));

    assert_eq!(
        ws.keys("myblog_db"),
        vec!["db.20230102000000", "db.20230103000000"]
    );
}

#[test]
fn cleanup_dry_run_deletes_nothing() {
    let ws = Workspace::with_dump();
    ws.seed(
        "myblog_db",
        &["db.20230101000000", "db.20230102000000", "db.20230103000000"],
    );

    ws.cmd()
        .args(["cleanup", "all", "--keep", "1", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("To be deleted (2)"));

    assert_eq!(ws.keys("myblog_db").len(), 3);
}

#[test]
fn failing_producer_exits_non_zero_without_upload() {
    let ws = Workspace::new(&["sh", "-c", "echo 'access denied' >&2; exit 3", "{output}"]);

    ws.cmd()
        .args(["backup", "db"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("producer failed"))
        .stderr(predicate::str::contains("access denied"));

    assert!(ws.keys("myblog_db").is_empty());
}

#[test]
fn init_and_config() {
    let dir = TempDir::new().unwrap();
    let mut init = Command::cargo_bin("webvault").unwrap();
    init.env("WEBVAULT_HOME", dir.path())
        .env_remove("WEBVAULT_CONFIG")
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialization complete!"));

    assert!(dir.path().join("config.json").is_file());
    assert!(dir.path().join("store").is_dir());

    let mut config = Command::cargo_bin("webvault").unwrap();
    config
        .env("WEBVAULT_HOME", dir.path())
        .env_remove("WEBVAULT_CONFIG")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("webvault_db"))
        .stdout(predicate::str::contains("keep 10 per class"));
}

#[test]
fn explicit_config_flag_is_used() {
    let ws = Workspace::with_dump();
    let moved = ws.dir.path().join("elsewhere.json");
    fs::rename(ws.dir.path().join("config.json"), &moved).unwrap();

    ws.cmd()
        .arg("--config")
        .arg(&moved)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("myblog_site"));
}

#[test]
fn missing_explicit_config_fails_without_side_effects() {
    let ws = Workspace::with_dump();
    let missing = ws.dir.path().join("typo.json");

    ws.cmd()
        .arg("--config")
        .arg(&missing)
        .args(["list", "db"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Settings file not found"));

    ws.cmd()
        .env("WEBVAULT_CONFIG", &missing)
        .args(["cleanup", "all", "--keep", "0"])
        .assert()
        .failure()
        .code(1);

    assert!(!ws.dir.path().join("store").exists());
}

#[test]
fn init_creates_explicit_config() {
    let ws = Workspace::with_dump();
    let named = ws.dir.path().join("conf").join("named.json");

    ws.cmd()
        .arg("--config")
        .arg(&named)
        .arg("init")
        .assert()
        .success();

    assert!(named.is_file());
}

#[test]
fn config_shows_bucket_names_for_s3() {
    let dir = TempDir::new().unwrap();
    let settings = json!({
        "namespace": "MyBlog",
        "storage": { "backend": "s3", "endpoint": "http://127.0.0.1:9000" },
    });
    fs::write(dir.path().join("config.json"), settings.to_string()).unwrap();

    let mut config = Command::cargo_bin("webvault").unwrap();
    config
        .env("WEBVAULT_HOME", dir.path())
        .env_remove("WEBVAULT_CONFIG")
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("myblog-db, myblog-site"))
        .stdout(predicate::str::contains("storage.bucket"));
}
