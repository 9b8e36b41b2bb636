mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_malformed_rows_are_skipped() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("robustness.csv");
    common::write_operations(
        &input,
        &[
            ["1", "c", "100", "ok"],
            // Unknown kind
            ["1", "x", "100", "bad kind"],
            // Fractional amount
            ["1", "c", "1.5", "fraction"],
            // Non-integer account
            ["abc", "c", "1", "bad id"],
            ["1", "c", "200", "ok again"],
        ],
    )
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("ledger"));
    cmd.env_remove("DATABASE_URL").arg(&input);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Error reading operation"))
        .stdout(predicate::str::contains(r#""total":300"#));
}

#[test]
fn test_invalid_operations_are_rejected() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("invalid.csv");
    common::write_operations(
        &input,
        &[
            // Zero amount
            ["1", "c", "0", "zero"],
            // Description too long
            ["1", "c", "5", "way too long for it"],
            // Unknown account
            ["6", "c", "5", "ghost"],
            ["1", "d", "5", "valid"],
        ],
    )
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("ledger"));
    cmd.env_remove("DATABASE_URL").arg(&input);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Invalid input"))
        .stderr(predicate::str::contains("Account 6 not found"))
        .stderr(predicate::str::contains("Error fetching statement"))
        .stdout(predicate::str::contains(r#""total":-5"#));
}
