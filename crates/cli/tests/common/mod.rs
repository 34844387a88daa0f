// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test utilities for CLI integration tests.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Scratch home plus a stand-in `restic` that logs its arguments and runs
/// `body` (a `case "$1"` arm list).
pub struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    pub fn new(body: &str) -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");
        let log = dir.path().join("restic.log");
        let script = format!(
            "#!/bin/sh\n\
             echo \"$*\" >> '{log}'\n\
             case \"$1\" in\n{body}\nesac\n",
            log = log.display(),
        );
        let restic = dir.path().join("restic");
        std::fs::write(&restic, script).expect("Failed to write fake restic");
        std::fs::set_permissions(&restic, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake restic executable");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn restic(&self) -> PathBuf {
        self.dir.path().join("restic")
    }

    /// Every restic invocation, one line of arguments each
    pub fn log(&self) -> String {
        std::fs::read_to_string(self.dir.path().join("restic.log")).unwrap_or_default()
    }

    /// `pgstash` with a repository configured and no user config file
    pub fn pgstash(&self) -> Command {
        let mut cmd = self.bare();
        cmd.env("RESTIC_REPOSITORY", "s3:https://s3.example/bucket")
            .env("RESTIC_PASSWORD", "secret");
        cmd
    }

    /// `pgstash` with nothing configured
    pub fn bare(&self) -> Command {
        let mut cmd = Command::cargo_bin("pgstash").expect("pgstash binary");
        cmd.env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join("config"))
            .env("RESTIC_BINARY", self.restic())
            .env_remove("RESTIC_REPOSITORY")
            .env_remove("RESTIC_PASSWORD")
            .env_remove("PGSTASH_TIMEOUT")
            .env_remove("RUST_LOG");
        cmd
    }
}

/// `restic snapshots --json` output listing the given (id, time, wal file)
pub fn wal_snapshots_json(entries: &[(&str, &str, &str)]) -> String {
    let items: Vec<String> = entries
        .iter()
        .map(|(id, time, wal_file)| {
            format!(
                r#"{{"id":"{id}","time":"{time}","hostname":"db-0","paths":["/pg_wal/{wal_file}"],"tags":["type:wal","wal_file:{wal_file}"]}}"#
            )
        })
        .collect();
    format!("[{}]", items.join(","))
}
