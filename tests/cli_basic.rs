#![forbid(unsafe_code)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn cli(rota: &str) -> Command {
    let mut cmd = Command::cargo_bin("rotaplan-cli").unwrap();
    cmd.arg("--rota").arg(rota);
    cmd
}

#[test]
fn generate_validate_and_export_via_cli() {
    let dir = tempdir().unwrap();
    let rota = dir.path().join("rota.json");
    let rota = rota.to_str().unwrap();

    cli(rota)
        .args(["add-team", "--name", "core"])
        .assert()
        .success();
    for handle in ["alice", "bob", "carol", "dave", "erin"] {
        cli(rota)
            .args(["add-member", "--handle", handle, "--display-name", handle])
            .assert()
            .success();
        cli(rota)
            .args(["join", "--team", "core", "--handle", handle])
            .assert()
            .success();
    }

    cli(rota)
        .args([
            "generate",
            "--team",
            "core",
            "--week-start",
            "2024-01-01",
            "--publish",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK: schedule is valid"));

    let csv = dir.path().join("schedule.csv");
    cli(rota)
        .args(["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("week 2024-01-01"));
    // re-listing a specific schedule needs its id; the rota file has it
    let data = std::fs::read_to_string(rota).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&data).unwrap();
    let schedule_id = parsed["schedules"][0]["id"].as_str().unwrap().to_string();
    cli(rota)
        .args([
            "list",
            "--schedule-id",
            &schedule_id,
            "--out-csv",
            csv.to_str().unwrap(),
        ])
        .assert()
        .success();
    let exported = std::fs::read_to_string(&csv).unwrap();
    assert!(exported.starts_with("slot_id,start,end,is_break,assigned_handle"));
    assert_eq!(exported.lines().count(), 169);
}

#[test]
fn undersized_team_is_refused() {
    let dir = tempdir().unwrap();
    let rota = dir.path().join("rota.json");
    let rota = rota.to_str().unwrap();

    cli(rota)
        .args(["add-team", "--name", "tiny"])
        .assert()
        .success();
    for handle in ["alice", "bob", "carol"] {
        cli(rota)
            .args(["add-member", "--handle", handle, "--display-name", handle])
            .assert()
            .success();
        cli(rota)
            .args(["join", "--team", "tiny", "--handle", handle])
            .assert()
            .success();
    }

    cli(rota)
        .args(["generate", "--team", "tiny", "--week-start", "2024-01-01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "insufficient members: need 5, have 3",
        ));
}
