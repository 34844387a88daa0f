// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Restic snapshot store adapter

use super::{SnapshotStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgstash_core::{Snapshot, SnapshotTags, Tag};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;

/// Connection settings for a restic repository
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResticConfig {
    /// restic executable
    pub binary: PathBuf,
    pub repository: String,
    pub password: String,
    pub s3_endpoint: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,
}

impl ResticConfig {
    pub fn new(repository: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            binary: PathBuf::from("restic"),
            repository: repository.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    fn binary(&self) -> &Path {
        if self.binary.as_os_str().is_empty() {
            Path::new("restic")
        } else {
            &self.binary
        }
    }
}

// Keep credentials out of logs
impl fmt::Debug for ResticConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResticConfig")
            .field("binary", &self.binary)
            .field("repository", &self.repository)
            .field("password", &"<redacted>")
            .field("s3_endpoint", &self.s3_endpoint)
            .field("s3_access_key", &self.s3_access_key.as_ref().map(|_| "<redacted>"))
            .field("s3_secret_key", &self.s3_secret_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Snapshot as printed by `restic snapshots --json`
#[derive(Debug, Deserialize)]
struct ResticSnapshot {
    id: String,
    time: DateTime<Utc>,
    #[serde(default)]
    hostname: String,
    #[serde(default)]
    paths: Option<Vec<PathBuf>>,
    #[serde(default)]
    tags: Option<Vec<String>>,
}

impl From<ResticSnapshot> for Snapshot {
    fn from(raw: ResticSnapshot) -> Self {
        Snapshot::new(
            raw.id,
            raw.time,
            SnapshotTags::from_wire(raw.tags.unwrap_or_default()),
        )
        .with_hostname(raw.hostname)
        .with_paths(raw.paths.unwrap_or_default())
    }
}

/// One line of `restic backup --json` output
#[derive(Debug, Deserialize)]
struct BackupMessage {
    message_type: String,
    #[serde(default)]
    snapshot_id: Option<String>,
}

/// Snapshot store backed by the restic CLI
#[derive(Clone, Debug)]
pub struct ResticStore {
    config: ResticConfig,
}

impl ResticStore {
    pub fn new(config: ResticConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResticConfig {
        &self.config
    }

    /// Base command with repository credentials in the environment.
    /// The child is killed if the call is dropped mid-flight.
    fn command(&self) -> Command {
        let mut cmd = Command::new(self.config.binary());
        cmd.env("RESTIC_REPOSITORY", &self.config.repository)
            .env("RESTIC_PASSWORD", &self.config.password)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if let Some(key) = &self.config.s3_access_key {
            cmd.env("AWS_ACCESS_KEY_ID", key);
        }
        if let Some(secret) = &self.config.s3_secret_key {
            cmd.env("AWS_SECRET_ACCESS_KEY", secret);
        }
        if let Some(endpoint) = self.config.s3_endpoint.as_deref().filter(|e| !e.is_empty()) {
            cmd.env("AWS_ENDPOINT", endpoint);
        }

        cmd
    }

    async fn output(&self, mut cmd: Command) -> Result<Output, StoreError> {
        cmd.output().await.map_err(|e| StoreError::Spawn {
            program: self.config.binary().display().to_string(),
            source: e,
        })
    }

    /// Run to completion, failing on a non-zero exit
    async fn run(&self, operation: &'static str, cmd: Command) -> Result<Output, StoreError> {
        let output = self.output(cmd).await?;
        if !output.status.success() {
            return Err(StoreError::CommandFailed {
                operation,
                message: failure_message(&output),
            });
        }
        Ok(output)
    }
}

/// Temporary file next to a restore target, removed on drop unless
/// persisted. Covers early returns and futures dropped mid-dump.
struct ScratchFile {
    path: PathBuf,
    persisted: bool,
}

impl ScratchFile {
    /// `.<name>.pgstash-tmp` in the target's directory
    fn beside(target: &Path) -> Self {
        let name = target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path: target.with_file_name(format!(".{name}.pgstash-tmp")),
            persisted: false,
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(mut self, target: &Path) -> Result<(), StoreError> {
        tokio::fs::rename(&self.path, target)
            .await
            .map_err(|e| StoreError::io(target, e))?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if !self.persisted {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

fn failure_message(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        return stderr.to_string();
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    match stdout.trim() {
        "" => format!("exited with {}", output.status),
        s => s.to_string(),
    }
}

/// Pull the new snapshot id out of the `--json` progress stream
fn parse_backup_summary(stdout: &[u8]) -> Option<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .filter_map(|line| serde_json::from_str::<BackupMessage>(line).ok())
        .filter(|msg| msg.message_type == "summary")
        .find_map(|msg| msg.snapshot_id)
}

fn parse_snapshots(stdout: &[u8]) -> Result<Vec<Snapshot>, StoreError> {
    let raw: Option<Vec<ResticSnapshot>> =
        serde_json::from_slice(stdout).map_err(|e| StoreError::Parse {
            operation: "snapshots",
            message: e.to_string(),
        })?;
    Ok(raw.unwrap_or_default().into_iter().map(Snapshot::from).collect())
}

#[async_trait]
impl SnapshotStore for ResticStore {
    async fn init_repository(&self) -> Result<(), StoreError> {
        let mut cmd = self.command();
        cmd.arg("init");

        let output = self.output(cmd).await?;
        if output.status.success() {
            return Ok(());
        }

        let message = failure_message(&output);
        if message.contains("already initialized") || message.contains("already exists") {
            return Ok(());
        }
        Err(StoreError::CommandFailed {
            operation: "init",
            message,
        })
    }

    async fn backup(&self, path: &Path, tags: &[Tag]) -> Result<Option<String>, StoreError> {
        let mut cmd = self.command();
        cmd.arg("backup").arg("--json").arg(path);
        for tag in tags {
            cmd.arg("--tag").arg(tag.to_string());
        }

        let output = self.run("backup", cmd).await?;
        Ok(parse_backup_summary(&output.stdout))
    }

    async fn restore(&self, snapshot_id: &str, target: &Path) -> Result<(), StoreError> {
        let mut cmd = self.command();
        cmd.arg("restore")
            .arg(snapshot_id)
            .arg("--target")
            .arg(target);

        self.run("restore", cmd).await?;
        Ok(())
    }

    async fn restore_file(
        &self,
        snapshot_id: &str,
        source_file: &Path,
        target_file: &Path,
    ) -> Result<(), StoreError> {
        // Dump to a hidden sibling, renamed into place once complete
        let scratch = ScratchFile::beside(target_file);
        let file = tokio::fs::File::create(scratch.path())
            .await
            .map_err(|e| StoreError::io(scratch.path(), e))?
            .into_std()
            .await;

        let mut cmd = self.command();
        cmd.arg("dump")
            .arg(snapshot_id)
            .arg(source_file)
            .stdout(Stdio::from(file))
            .stderr(Stdio::piped());

        let child = cmd.spawn().map_err(|e| StoreError::Spawn {
            program: self.config.binary().display().to_string(),
            source: e,
        })?;
        let output = child.wait_with_output().await.map_err(|e| StoreError::Spawn {
            program: self.config.binary().display().to_string(),
            source: e,
        })?;
        if !output.status.success() {
            return Err(StoreError::CommandFailed {
                operation: "dump",
                message: failure_message(&output),
            });
        }

        scratch.persist(target_file).await
    }

    async fn find_snapshots(&self, tags: &[Tag]) -> Result<Vec<Snapshot>, StoreError> {
        let mut cmd = self.command();
        cmd.arg("snapshots").arg("--json");
        // Repeated --tag flags are OR-ed by restic; one comma-joined list is AND-ed
        if !tags.is_empty() {
            let joined = tags.iter().map(Tag::to_string).collect::<Vec<_>>().join(",");
            cmd.arg("--tag").arg(joined);
        }

        let output = self.run("snapshots", cmd).await?;
        let snapshots = parse_snapshots(&output.stdout)?;
        Ok(snapshots
            .into_iter()
            .filter(|s| s.tags.contains_all(tags))
            .collect())
    }

    async fn delete_snapshots(&self, ids: &[String]) -> Result<(), StoreError> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut cmd = self.command();
        cmd.arg("forget").arg("--prune").args(ids);

        self.run("forget", cmd).await?;
        Ok(())
    }

    async fn ensure_directory(&self, path: &Path) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| StoreError::io(path, e))
    }
}

#[cfg(test)]
#[path = "restic_tests.rs"]
mod tests;
