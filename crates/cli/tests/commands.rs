// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI integration tests against a stand-in restic binary

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(deprecated)]

mod common;

use common::{wal_snapshots_json, TestEnv};
use predicates::prelude::*;

fn snapshots_arm(json: &str) -> String {
    format!("snapshots) cat <<'JSON'\n{json}\nJSON\n;;")
}

#[test]
fn help_lists_commands() {
    let env = TestEnv::new("");
    env.bare()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("wal-archive"))
        .stdout(predicate::str::contains("wal-restore"))
        .stdout(predicate::str::contains("cleanup"));
}

#[test]
fn missing_repository_is_reported() {
    let env = TestEnv::new("");
    env.bare()
        .arg("timeline")
        .assert()
        .failure()
        .stderr(predicate::str::contains("RESTIC_REPOSITORY is required"));
    assert_eq!(env.log(), "");
}

#[test]
fn config_file_supplies_the_repository() {
    let env = TestEnv::new(&snapshots_arm("[]"));
    let config = env.path().join("pgstash.toml");
    std::fs::write(
        &config,
        "[repository]\nrepository = \"/srv/restic\"\npassword = \"secret\"\n",
    )
    .unwrap();

    env.bare()
        .arg("--config")
        .arg(&config)
        .arg("timeline")
        .assert()
        .success()
        .stdout("1\n");
}

#[test]
fn timeline_follows_the_newest_wal_segment() {
    let json = wal_snapshots_json(&[
        ("a1", "2026-03-01T10:00:00Z", "000000020000000000000009"),
        ("b2", "2026-03-01T11:00:00Z", "000000030000000000000001"),
    ]);
    let env = TestEnv::new(&snapshots_arm(&json));

    env.pgstash()
        .arg("timeline")
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn wal_archive_tags_the_segment() {
    let env = TestEnv::new(
        r#"backup) echo '{"message_type":"summary","snapshot_id":"c0ffee"}';;"#,
    );
    let wal = env.path().join("000000010000000A0000002F");
    std::fs::write(&wal, "WAL").unwrap();

    env.pgstash()
        .arg("wal-archive")
        .arg(&wal)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Archived 000000010000000A0000002F as c0ffee",
        ));

    let log = env.log();
    assert!(log.contains("backup --json"), "{log}");
    assert!(log.contains("--tag type:wal"), "{log}");
    assert!(log.contains("--tag wal_file:000000010000000A0000002F"), "{log}");
}

#[test]
fn wal_archive_rejects_non_wal_files() {
    let env = TestEnv::new("");
    let history = env.path().join("00000002.history");
    std::fs::write(&history, "1\t0/3000000\tno recovery target specified\n").unwrap();

    env.pgstash()
        .arg("wal-archive")
        .arg(&history)
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid WAL"));
    assert_eq!(env.log(), "");
}

#[test]
fn wal_restore_writes_the_target_path() {
    let json = wal_snapshots_json(&[("a1", "2026-03-01T10:00:00Z", "000000010000000000000004")]);
    let env = TestEnv::new(&format!("{}\ndump) printf 'WALDATA';;", snapshots_arm(&json)));
    let target = env.path().join("pgdata/pg_wal/RECOVERYXLOG");

    env.pgstash()
        .arg("wal-restore")
        .arg("000000010000000000000004")
        .arg(&target)
        .assert()
        .success();

    assert_eq!(std::fs::read_to_string(&target).unwrap(), "WALDATA");
    assert!(env
        .log()
        .contains("dump a1 /pg_wal/000000010000000000000004"));
}

#[test]
fn wal_restore_of_unknown_segment_fails() {
    let env = TestEnv::new(&snapshots_arm("[]"));

    env.pgstash()
        .arg("wal-restore")
        .arg("000000010000000000000004")
        .arg(env.path().join("RECOVERYXLOG"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn wal_list_prints_json_in_replay_order() {
    let json = wal_snapshots_json(&[
        ("n", "2026-03-01T12:00:00Z", "000000010000000000000002"),
        ("o", "2026-03-01T10:00:00Z", "000000010000000000000001"),
    ]);
    let env = TestEnv::new(&snapshots_arm(&json));

    let output = env
        .pgstash()
        .args(["wal-list", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows[0]["wal_file"], "000000010000000000000001");
    assert_eq!(rows[1]["snapshot_id"], "n");
}

#[test]
fn cleanup_forgets_expired_segments() {
    let json = wal_snapshots_json(&[
        ("old", "2020-01-01T00:00:00Z", "000000010000000000000001"),
        ("new", "2999-01-01T00:00:00Z", "000000010000000000000002"),
    ]);
    let env = TestEnv::new(&format!("{}\nforget) ;;", snapshots_arm(&json)));

    env.pgstash()
        .args(["cleanup", "--older-than", "30days"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted 1 WAL snapshots"));

    assert!(env.log().contains("forget --prune old"));
}

#[test]
fn cleanup_rejects_both_cutoffs() {
    let env = TestEnv::new("");
    env.pgstash()
        .args([
            "cleanup",
            "--before",
            "2026-03-01T00:00:00Z",
            "--older-than",
            "7days",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}
