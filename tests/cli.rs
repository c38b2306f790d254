use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn tasklist(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tasklist").unwrap();
    cmd.arg("--data-dir").arg(dir.path().join("data"));
    cmd.env_remove("TASKLIST_DATA_DIR");
    cmd
}

#[test]
fn test_full_workflow() {
    let temp_dir = TempDir::new().unwrap();

    tasklist(&temp_dir)
        .args(["add", "Task A"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created task #1"))
        .stdout(predicate::str::contains("Position: 0"));

    tasklist(&temp_dir)
        .args(["add", "Task B", "--label", " urgent "])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created task #2"))
        .stdout(predicate::str::contains("Position: -1"));

    // Newest task is listed first
    tasklist(&temp_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)Task B.*Task A").unwrap())
        .stdout(predicate::str::contains("[Urgent]"));

    // B requires A
    tasklist(&temp_dir)
        .args(["edit", "2", "--requires", "1"])
        .assert()
        .success();

    tasklist(&temp_dir)
        .args(["show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Required by:  #2"));

    // Complete A, then sweep it; B loses the link
    tasklist(&temp_dir)
        .args(["toggle", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Completed task #1"));

    tasklist(&temp_dir)
        .arg("sweep")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 completed tasks"));

    tasklist(&temp_dir)
        .args(["show", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Requires").not());

    tasklist(&temp_dir).args(["show", "1"]).assert().failure();
}

#[test]
fn test_self_requirement_is_dropped() {
    let temp_dir = TempDir::new().unwrap();
    tasklist(&temp_dir).args(["add", "Lonely"]).assert().success();

    tasklist(&temp_dir)
        .args(["edit", "1", "--requires", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("ignored requirement"));

    tasklist(&temp_dir)
        .args(["show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Requires").not());
}

#[test]
fn test_move_and_reorder() {
    let temp_dir = TempDir::new().unwrap();
    for name in ["First", "Second", "Third"] {
        tasklist(&temp_dir).args(["add", name]).assert().success();
    }

    tasklist(&temp_dir)
        .args(["reorder", "1", "2", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reordered 3 tasks"));

    tasklist(&temp_dir)
        .args(["move", "3", "up"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Moved task #3 up"));

    tasklist(&temp_dir)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"(?s)First.*Third.*Second").unwrap());

    tasklist(&temp_dir)
        .args(["move", "1", "up"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not moved"));

    tasklist(&temp_dir)
        .args(["move", "1", "sideways"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid direction"));
}

#[test]
fn test_toggle_twice_reinserts_at_top() {
    let temp_dir = TempDir::new().unwrap();
    tasklist(&temp_dir).args(["add", "Old"]).assert().success();
    tasklist(&temp_dir).args(["add", "New"]).assert().success();

    tasklist(&temp_dir).args(["toggle", "1"]).assert().success();
    tasklist(&temp_dir)
        .args(["toggle", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reactivated task #1"));

    tasklist(&temp_dir)
        .args(["show", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Position:     -2"));
}

#[test]
fn test_delete_missing_task_fails() {
    let temp_dir = TempDir::new().unwrap();
    tasklist(&temp_dir)
        .args(["delete", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Task #42 not found"));
}

#[test]
fn test_backup_writes_snapshot() {
    let temp_dir = TempDir::new().unwrap();
    tasklist(&temp_dir).args(["add", "Keep"]).assert().success();

    tasklist(&temp_dir)
        .arg("backup")
        .assert()
        .success()
        .stdout(predicate::str::contains("tasks_backup_"));

    let backups = std::fs::read_dir(temp_dir.path().join("data").join("backups"))
        .unwrap()
        .count();
    assert_eq!(backups, 1);
}
