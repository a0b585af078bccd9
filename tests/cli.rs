//! Integration tests for the `exedore` demo binary

use assert_cmd::Command;
use exedore::abi::Value;
use exedore::runtime::CallRecord;
use predicates::prelude::*;

fn exedore() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_exedore"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn record(function: &str, a: i64, b: i64, result: i64) -> CallRecord {
    CallRecord {
        function: function.to_string(),
        args: vec![Value::S64(a), Value::S64(b)],
        result: Value::S64(result),
    }
}

#[test]
fn test_before_logs_every_call() {
    exedore()
        .arg("before")
        .assert()
        .success()
        .stdout(predicate::str::contains("The log has 4 entries"))
        .stdout(predicate::str::contains("Function 'multiply' called with 3,9"))
        .stdout(predicate::str::contains("Function 'add' called with 2,2"));
}

#[test]
fn test_before_json_lists_entries_in_call_order() {
    let assert = exedore().args(["before", "--json"]).assert().success();
    let entries: Vec<String> =
        serde_json::from_slice(&assert.get_output().stdout).expect("json log");

    assert_eq!(
        entries,
        vec![
            "Function 'multiply' called with 3,9".to_string(),
            "Function 'add' called with 1,1".to_string(),
            "Function 'multiply' called with 4,4".to_string(),
            "Function 'add' called with 2,2".to_string(),
        ]
    );
}

#[test]
fn test_after_logs_every_call() {
    exedore()
        .arg("after")
        .assert()
        .success()
        .stdout(predicate::str::contains("The log has 4 entries"))
        .stdout(predicate::str::contains("Function 'add' returned"));
}

#[test]
fn test_before_and_after_interleave() {
    let assert = exedore()
        .args(["before-and-after", "--json"])
        .assert()
        .success();
    let entries: Vec<String> =
        serde_json::from_slice(&assert.get_output().stdout).expect("json log");

    assert_eq!(entries.len(), 8);
    assert_eq!(entries[0], "Function 'multiply' called with 3,9");
    assert_eq!(entries[1], "Function 'multiply' returned");
}

#[test]
fn test_wrap_logs_results() {
    exedore()
        .arg("wrap")
        .assert()
        .success()
        .stdout(predicate::str::contains("The log has 4 entries"))
        .stdout(predicate::str::contains("Function multiply called with 3,9 -> 27"));
}

#[test]
fn test_record_json_holds_every_result() {
    let assert = exedore().args(["record", "--json"]).assert().success();
    let records: Vec<CallRecord> =
        serde_json::from_slice(&assert.get_output().stdout).expect("json records");

    assert_eq!(
        records,
        vec![
            record("multiply", 3, 9, 27),
            record("add", 1, 1, 2),
            record("multiply", 4, 4, 16),
            record("add", 2, 2, 4),
        ]
    );
}

#[test]
fn test_record_respects_max_records() {
    exedore()
        .args(["record", "--max-records", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("The recorder holds 2 calls"))
        .stdout(predicate::str::contains("add(2,2) = 4"))
        .stdout(predicate::str::contains("add(1,1)").not());
}

#[test]
fn test_unknown_command_fails() {
    exedore().arg("explode").assert().failure();
}
