//! E2E CLI tests covering the todo lifecycle:
//! - `ted init`, `ted new`, `ted update`, `ted done`
//! - `ted ls` grouping by directory and tag
//! - `ted block` and blocked status in `ted show`
//! - projects with shorthand ids, references, `ted status`
//!
//! Each test runs the `ted` binary as a subprocess against a vault in an
//! isolated temp directory.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Test Harness
// ---------------------------------------------------------------------------

fn vault_path(dir: &Path) -> PathBuf {
    dir.join("vault")
}

/// Build a Command targeting the ted binary with its vault under `dir`.
fn ted_cmd(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ted"));
    cmd.current_dir(dir);
    cmd.env("TED_VAULT", vault_path(dir));
    cmd.env("TED_CONFIG", dir.join("no-such-config.toml"));
    cmd.env("TED_LOG", "error");
    cmd.env_remove("FORMAT");
    cmd
}

fn init_vault(dir: &Path) {
    ted_cmd(dir).arg("init").assert().success();
}

fn run_json(dir: &Path, args: &[&str]) -> Value {
    let output = ted_cmd(dir)
        .args(args)
        .arg("--json")
        .output()
        .expect("ted should not crash");
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("--json should produce valid JSON")
}

/// Create a todo via CLI, return its ID.
fn new_todo(dir: &Path, name: &str, extra: &[&str]) -> String {
    let mut args = vec!["new", name, "--goal", "it works", "--task", "first step"];
    args.extend_from_slice(extra);
    let json = run_json(dir, &args);
    json["id"].as_str().expect("id field").to_string()
}

fn show_json(dir: &Path, id: &str) -> Value {
    run_json(dir, &["show", id])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn init_creates_vault_layout() {
    let dir = TempDir::new().expect("tempdir");
    ted_cmd(dir.path())
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized ted vault"));

    for sub in ["todos", "done", "projects", "ref", "files", "inbox"] {
        assert!(vault_path(dir.path()).join(sub).is_dir(), "{sub}/ missing");
    }

    // Re-running is harmless.
    init_vault(dir.path());
}

#[test]
fn new_update_show_done_round_trip() {
    let dir = TempDir::new().expect("tempdir");
    init_vault(dir.path());

    let json = run_json(
        dir.path(),
        &["new", "Ship release", "--goal", "CI green", "--task", "write changelog"],
    );
    assert_eq!(json["id"], "T00001");
    let path = PathBuf::from(json["path"].as_str().expect("path"));
    assert!(path.ends_with("todos/T00001_Ship_release.md"));
    let text = fs::read_to_string(&path).expect("todo file");
    assert!(text.starts_with("---\n"));
    assert!(text.contains("- [ ] write changelog"));

    ted_cmd(dir.path())
        .args(["show", "T00001"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("T00001: Ship release ❌\n"));

    ted_cmd(dir.path())
        .args(["update", "1", "--done", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("marked task 0 done"));

    ted_cmd(dir.path())
        .args(["show", "T00001", "--verbose"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "T00001: Ship release ✅\nTasks:\n 0. ✅ write changelog\n",
        ));

    let shown = show_json(dir.path(), "T00001");
    assert_eq!(shown["status"], "done");
    assert!(
        shown["info"][0]
            .as_str()
            .expect("info line")
            .ends_with("Completed: write changelog")
    );

    ted_cmd(dir.path()).args(["done", "T00001"]).assert().success();
    assert!(!path.exists());
    let done = vault_path(dir.path()).join("done/T00001_Ship_release.md");
    assert!(done.exists());
    assert!(fs::read_to_string(&done).expect("done file").contains("completed:"));

    let shown = show_json(dir.path(), "1");
    assert_eq!(shown["archived"], true);

    // Ids keep counting past done todos.
    assert_eq!(new_todo(dir.path(), "Next", &[]), "T00002");
}

#[test]
fn done_with_open_tasks_needs_yes() {
    let dir = TempDir::new().expect("tempdir");
    init_vault(dir.path());
    let id = new_todo(dir.path(), "Paint fence", &[]);

    ted_cmd(dir.path())
        .args(["done", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    ted_cmd(dir.path()).args(["done", &id, "--yes"]).assert().success();
    let shown = show_json(dir.path(), &id);
    assert_eq!(shown["tasks"][0]["done"], true);
    assert_eq!(shown["archived"], true);

    ted_cmd(dir.path())
        .args(["done", &id, "--yes"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already done"));
}

#[test]
fn update_adds_tasks_info_and_tags() {
    let dir = TempDir::new().expect("tempdir");
    init_vault(dir.path());
    let id = new_todo(dir.path(), "Taxes", &["--tag", "home"]);

    ted_cmd(dir.path())
        .args([
            "update", &id, "--task", "find receipts", "--info", "due in April", "--tag", "money",
        ])
        .assert()
        .success();

    let shown = show_json(dir.path(), &id);
    assert_eq!(shown["tasks_total"], 2);
    assert_eq!(shown["tasks"][1]["description"], "find receipts");
    assert_eq!(shown["info"][0], "due in April");
    assert_eq!(shown["tags"], serde_json::json!(["home", "money"]));
}

#[test]
fn ls_groups_by_directory_and_tag() {
    let dir = TempDir::new().expect("tempdir");
    init_vault(dir.path());
    new_todo(dir.path(), "Ship release", &["--tag", "work"]);
    let moved = new_todo(dir.path(), "Paint fence", &[]);

    let todos = vault_path(dir.path()).join("todos");
    fs::create_dir(todos.join("home")).expect("mkdir");
    let name = format!("{moved}_Paint_fence.md");
    fs::rename(todos.join(&name), todos.join("home").join(&name)).expect("move");

    ted_cmd(dir.path())
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains("Directory: .\n\tT00001: Ship release ❌\n"))
        .stdout(predicate::str::contains("Directory: home\n\tT00002: Paint fence ❌\n"));

    let json = run_json(dir.path(), &["ls", "--by-tag"]);
    assert_eq!(json["by"], "tag");
    let groups: Vec<&str> = json["groups"]
        .as_array()
        .expect("groups")
        .iter()
        .map(|g| g["name"].as_str().expect("name"))
        .collect();
    assert_eq!(groups, vec!["untagged", "work"]);
}

#[test]
fn ls_reports_each_unreadable_file_once() {
    let dir = TempDir::new().expect("tempdir");
    init_vault(dir.path());
    new_todo(dir.path(), "Ship release", &[]);
    fs::write(vault_path(dir.path()).join("todos/broken.md"), "no metadata").expect("write");

    let output = ted_cmd(dir.path())
        .arg("ls")
        .env("TED_LOG", "warn")
        .output()
        .expect("ted should not crash");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("skipped unreadable document").count(), 1, "{stderr}");
    assert!(String::from_utf8_lossy(&output.stdout).contains("T00001: Ship release"));
}

#[test]
fn block_marks_todo_blocked_until_blocker_done() {
    let dir = TempDir::new().expect("tempdir");
    init_vault(dir.path());
    let a = new_todo(dir.path(), "Deploy", &[]);
    let b = new_todo(dir.path(), "Review", &[]);

    ted_cmd(dir.path()).args(["update", &a, "--all"]).assert().success();
    ted_cmd(dir.path()).args(["block", &a, "--by", &b]).assert().success();

    let shown = show_json(dir.path(), &a);
    assert_eq!(shown["status"], "blocked");
    assert_eq!(shown["blocked_on"], serde_json::json!(["T00002_Review.md"]));
    ted_cmd(dir.path())
        .args(["show", &a])
        .assert()
        .success()
        .stdout(predicate::str::contains("T00001: Deploy ⛔"));

    ted_cmd(dir.path()).args(["done", &b, "--yes"]).assert().success();
    let shown = show_json(dir.path(), &a);
    assert_eq!(shown["status"], "done");
    assert_eq!(shown["blocked_on"], serde_json::json!([]));
}

#[test]
fn block_cycle_resolves_to_blocked() {
    let dir = TempDir::new().expect("tempdir");
    init_vault(dir.path());
    let a = new_todo(dir.path(), "Alpha", &[]);
    let b = new_todo(dir.path(), "Beta", &[]);

    ted_cmd(dir.path()).args(["update", &a, "--all"]).assert().success();
    ted_cmd(dir.path()).args(["update", &b, "--all"]).assert().success();
    let first = run_json(dir.path(), &["block", &a, "--by", &b]);
    assert_eq!(first["status"], "done");

    // The second edit closes the loop; its own report already sees that.
    let second = run_json(dir.path(), &["block", &b, "--by", &a]);
    assert_eq!(second["status"], "blocked");

    assert_eq!(show_json(dir.path(), &a)["status"], "blocked");
    assert_eq!(show_json(dir.path(), &b)["status"], "blocked");
}

#[test]
fn project_shorthand_prefixes_todo_ids() {
    let dir = TempDir::new().expect("tempdir");
    init_vault(dir.path());
    new_todo(dir.path(), "One", &[]);
    new_todo(dir.path(), "Two", &[]);

    let project = run_json(
        dir.path(),
        &["project", "new", "Engineering", "--shorthand", "ENG", "-d", "platform work"],
    );
    assert_eq!(project["id"], "P00001");

    let id = new_todo(dir.path(), "Fix login", &["--project", "P00001"]);
    assert_eq!(id, "ENG003");
    assert_eq!(show_json(dir.path(), "ENG003")["project_id"], "P00001");

    let list = run_json(dir.path(), &["project", "list"]);
    assert_eq!(list[0]["shorthand"], "ENG");
    assert_eq!(list[0]["todos"], 1);

    ted_cmd(dir.path())
        .args(["project", "new", "Other", "--shorthand", "ENG"])
        .assert()
        .failure();

    // A colon in a plain project name never becomes a shorthand.
    let plain = run_json(dir.path(), &["project", "new", "OPS: on-call rota"]);
    let list = run_json(dir.path(), &["project", "list"]);
    assert_eq!(list[1]["id"], plain["id"]);
    assert_eq!(list[1]["shorthand"], Value::Null);
    assert_eq!(list[1]["name"], "OPS: on-call rota");
    assert_eq!(new_todo(dir.path(), "Page", &["--project", "P00002"]), "T00004");
}

#[test]
fn references_attach_to_todos() {
    let dir = TempDir::new().expect("tempdir");
    init_vault(dir.path());
    let id = new_todo(dir.path(), "Read docs", &[]);

    let link = run_json(dir.path(), &["ref", "new", &id, "--link", "docs.rs", "--tldr", "api docs"]);
    assert_eq!(link["id"], "R00001");

    let attachment = dir.path().join("notes.txt");
    fs::write(&attachment, "hello").expect("write");
    run_json(
        dir.path(),
        &["ref", "new", &id, "--file", attachment.to_str().expect("utf8 path")],
    );
    assert!(vault_path(dir.path()).join("files/notes.txt").exists());

    let shown = show_json(dir.path(), &id);
    let refs = shown["references"].as_array().expect("references");
    assert_eq!(refs.len(), 2);
    assert_eq!(refs[0]["reference"]["type"], "link");
    assert_eq!(refs[0]["reference"]["content"], "https://docs.rs");
    assert_eq!(refs[0]["tldr"], "api docs");
    assert_eq!(refs[1]["reference"]["type"], "file");
}

#[test]
fn status_counts_vault_contents() {
    let dir = TempDir::new().expect("tempdir");
    init_vault(dir.path());
    let a = new_todo(dir.path(), "Open", &[]);
    let b = new_todo(dir.path(), "Blocked", &[]);
    let c = new_todo(dir.path(), "Finished", &[]);
    ted_cmd(dir.path()).args(["block", &b, "--by", &a]).assert().success();
    ted_cmd(dir.path()).args(["done", &c, "--yes"]).assert().success();
    fs::write(vault_path(dir.path()).join("todos/broken.md"), "no metadata").expect("write");

    let status = run_json(dir.path(), &["status"]);
    assert_eq!(status["open"], 1);
    assert_eq!(status["blocked"], 1);
    assert_eq!(status["done"], 1);
    assert_eq!(status["unreadable"].as_array().expect("unreadable").len(), 1);

    ted_cmd(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("open=1 blocked=1 ready=0 done=1"));
}
