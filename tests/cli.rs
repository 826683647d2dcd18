//! End-to-end tests for the `fintrack` binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn fintrack(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("fintrack").unwrap();
    cmd.env("FINTRACK_DATA_DIR", data_dir.path())
        .env("FINTRACK_PASSWORD", "password123")
        .env_remove("FINTRACK_LOG");
    cmd
}

fn register_and_login(data_dir: &TempDir, username: &str) {
    fintrack(data_dir)
        .args(["auth", "register", username, "--email"])
        .arg(format!("{}@example.com", username))
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Registered '{}'", username)));

    fintrack(data_dir)
        .args(["auth", "login", username])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as"));
}

#[test]
fn test_init_creates_data_dir() {
    let data_dir = TempDir::new().unwrap();

    fintrack(&data_dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialization complete"));

    fintrack(&data_dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Alert threshold"));
}

#[test]
fn test_commands_require_login() {
    let data_dir = TempDir::new().unwrap();
    fintrack(&data_dir).arg("init").assert().success();

    fintrack(&data_dir)
        .args(["txn", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn test_wrong_password_is_rejected() {
    let data_dir = TempDir::new().unwrap();
    fintrack(&data_dir)
        .args(["auth", "register", "carol", "--email", "carol@example.com"])
        .assert()
        .success();

    fintrack(&data_dir)
        .args(["auth", "login", "carol"])
        .env("FINTRACK_PASSWORD", "wrong-password")
        .assert()
        .failure();

    fintrack(&data_dir)
        .args(["auth", "whoami"])
        .assert()
        .failure();
}

#[test]
fn test_transaction_and_budget_workflow() {
    let data_dir = TempDir::new().unwrap();
    fintrack(&data_dir).arg("init").assert().success();
    register_and_login(&data_dir, "alice");

    fintrack(&data_dir)
        .args(["txn", "add", "42.50", "-c", "Groceries", "-m", "Weekly shop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded expense of $42.50 in Groceries"));

    fintrack(&data_dir)
        .args(["txn", "add", "3000", "-i", "-c", "Salary"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded income"));

    fintrack(&data_dir)
        .args(["txn", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Weekly shop"));

    fintrack(&data_dir)
        .args(["budget", "set", "Groceries", "500"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created Groceries budget"));

    fintrack(&data_dir)
        .args(["budget", "overview"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Groceries"))
        .stdout(predicate::str::contains("$42.50 of $500.00 spent"));

    fintrack(&data_dir)
        .args(["audit", "-n", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Budget"));
}

#[test]
fn test_goal_and_debt_commands() {
    let data_dir = TempDir::new().unwrap();
    register_and_login(&data_dir, "dave");

    fintrack(&data_dir)
        .args(["goal", "add", "Laptop", "1500", "--initial", "300"])
        .assert()
        .success();

    fintrack(&data_dir)
        .args(["goal", "contribute", "Laptop", "200"])
        .assert()
        .success();

    fintrack(&data_dir)
        .args(["goal", "list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Laptop"));

    fintrack(&data_dir)
        .args([
            "debt", "add", "Visa", "2000", "--kind", "credit_card", "--apr", "19.99",
            "--minimum", "60",
        ])
        .assert()
        .success();

    fintrack(&data_dir)
        .args(["debt", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Visa"));
}

#[test]
fn test_export_json_round_trips() {
    let data_dir = TempDir::new().unwrap();
    register_and_login(&data_dir, "erin");

    fintrack(&data_dir)
        .args(["txn", "add", "12", "-c", "Groceries"])
        .assert()
        .success();

    let out = data_dir.path().join("erin.json");
    fintrack(&data_dir)
        .args(["export", "json"])
        .arg(&out)
        .assert()
        .success();

    let content = std::fs::read_to_string(&out).unwrap();
    assert!(content.contains("\"erin\""));
    assert!(!content.contains("password_hash"));

    fintrack(&data_dir)
        .args(["export", "verify"])
        .arg(&out)
        .assert()
        .success();
}
