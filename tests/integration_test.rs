//! Integration tests for the temporal ledger CLI.
//!
//! These tests run the actual binary and verify output against expected CSV files.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

/// Get path to test data file
fn test_data_path(filename: &str) -> String {
    format!("tests/data/{}", filename)
}

/// Run the binary with the given script and return stdout
fn run_ledger(script: &str) -> String {
    let mut cmd = Command::cargo_bin("temporal-ledger").unwrap();
    let assert = cmd.arg(script).assert().success();
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

/// Trim lines and drop blanks. Row order is significant for replays.
fn normalize_csv(csv: &str) -> Vec<String> {
    csv.lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

fn assert_matches_expected(script: &str, expected: &str) {
    let output = run_ledger(&test_data_path(script));
    let expected = fs::read_to_string(test_data_path(expected)).unwrap();

    assert_eq!(normalize_csv(&output), normalize_csv(&expected));
}

#[test]
fn test_scenario_a_transfers_ranking_and_cashback() {
    assert_matches_expected("scenario_a.csv", "expected_a.csv");
}

#[test]
fn test_scenario_b_merge() {
    assert_matches_expected("scenario_b_merge.csv", "expected_b.csv");
}

#[test]
fn test_scenario_c_whitespace_handling() {
    assert_matches_expected("scenario_c_whitespace.csv", "expected_c.csv");
}

#[test]
fn test_accounts_snapshot_written_to_second_argument() {
    let dir = tempdir().unwrap();
    let accounts_path = dir.path().join("accounts.csv");

    let mut cmd = Command::cargo_bin("temporal-ledger").unwrap();
    cmd.arg(test_data_path("scenario_a.csv"))
        .arg(&accounts_path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("row,op,outcome,detail"));

    let accounts = fs::read_to_string(&accounts_path).unwrap();
    assert_eq!(
        normalize_csv(&accounts),
        vec![
            "account,balance,outgoing_total",
            "A,365,650",
            "B,900,100",
            "C,250,0",
        ]
    );
}

#[test]
fn test_script_from_tempfile() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("script.csv");
    fs::write(
        &script,
        "op,timestamp,account,target,amount,extra\n\
         create_account,1,A,,,\n\
         deposit,2,A,,10,\n\
         transfer,3,A,Z,5,\n",
    )
    .unwrap();

    let mut cmd = Command::cargo_bin("temporal-ledger").unwrap();
    cmd.arg(&script)
        .assert()
        .success()
        .stdout(predicate::str::contains("4,transfer,rejected,Account Z not found"));
}

#[test]
fn test_missing_file_error() {
    let mut cmd = Command::cargo_bin("temporal-ledger").unwrap();
    cmd.arg("nonexistent.csv")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error").or(predicate::str::contains("Error")));
}

#[test]
fn test_missing_argument_error() {
    let mut cmd = Command::cargo_bin("temporal-ledger").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Missing script file"));
}
