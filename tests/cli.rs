use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

const AS_OF: &str = "2024-03-31T00:00:00Z";

fn tradelens() -> Command {
    let mut cmd = Command::cargo_bin("tradelens").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn analyze_demo_journal_as_json() {
    tradelens()
        .args(["analyze", "--trades", "demos/trades.json", "--as-of", AS_OF, "--format", "pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"closed_trades\": 7"))
        .stdout(predicate::str::contains("\"open_positions\": 1"))
        .stdout(predicate::str::contains("\"status\": \"available\""))
        .stdout(predicate::str::contains("\"best_strategy\": \"breakout\""));
}

#[test]
fn analyze_demo_journal_as_table() {
    tradelens()
        .args(["analyze", "--trades", "demos/trades.json", "--as-of", AS_OF, "--format", "table"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Win rate %"))
        .stdout(predicate::str::contains("Position size %"));
}

#[test]
fn tiny_journal_reports_insufficient_data() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"[{{"id":"0b8e7c1e-8f47-4c0e-9a51-3f1a7a2d9e01","symbol":"SPY","entry_price":"500","quantity":"1",
            "entry_time":"2024-03-01T15:00:00Z","exit_time":"2024-03-01T16:00:00Z","exit_price":"505","profit_loss":"5"}}]"#
    )
    .unwrap();

    tradelens()
        .args(["analyze", "--as-of", AS_OF, "--format", "table", "--trades"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 closed trades available, 3 required"));
}

#[test]
fn missing_trades_file_fails() {
    tradelens()
        .args(["analyze", "--trades", "does-not-exist.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn show_config_prints_effective_settings() {
    tradelens()
        .args(["show-config"])
        .env("TRADELENS__ANALYTICS__RECENCY_WINDOW", "30")
        .assert()
        .success()
        .stdout(predicate::str::contains("recency_window = 30"))
        .stdout(predicate::str::contains("[logging]"));
}
