// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory snapshot store for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{SnapshotStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pgstash_core::{Clock, FakeClock, Snapshot, SnapshotTags, Tag};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Recorded store call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Init,
    Backup {
        path: PathBuf,
        tags: Vec<String>,
    },
    Restore {
        snapshot_id: String,
        target: PathBuf,
    },
    RestoreFile {
        snapshot_id: String,
        source_file: PathBuf,
        target_file: PathBuf,
    },
    Find {
        tags: Vec<String>,
    },
    Delete {
        ids: Vec<String>,
    },
    EnsureDirectory {
        path: PathBuf,
    },
}

/// Store operation, for failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Init,
    Backup,
    Restore,
    RestoreFile,
    Find,
    Delete,
    EnsureDirectory,
}

#[derive(Default)]
struct FakeState {
    snapshots: Vec<Snapshot>,
    calls: Vec<StoreCall>,
    failures: HashMap<StoreOp, String>,
    delay: Option<Duration>,
    next_id: u64,
    initialized: bool,
}

/// Fake snapshot store for testing.
///
/// Listing returns snapshots in insertion order, so tests control the
/// order the "store" reports.
#[derive(Clone, Default)]
pub struct FakeSnapshotStore {
    state: Arc<Mutex<FakeState>>,
    clock: FakeClock,
}

impl FakeSnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamps of new backups come from `clock`
    pub fn with_clock(clock: FakeClock) -> Self {
        Self {
            state: Arc::default(),
            clock,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a snapshot at the end of the listing
    pub fn add_snapshot(&self, snapshot: Snapshot) {
        self.lock().snapshots.push(snapshot);
    }

    /// Seed a snapshot from wire tags
    pub fn add(&self, id: &str, time: DateTime<Utc>, tags: &[&str]) {
        self.add_snapshot(Snapshot::new(id, time, SnapshotTags::from_wire(tags)));
    }

    pub fn snapshots(&self) -> Vec<Snapshot> {
        self.lock().snapshots.clone()
    }

    pub fn get(&self, id: &str) -> Option<Snapshot> {
        self.lock().snapshots.iter().find(|s| s.id == id).cloned()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StoreCall> {
        self.lock().calls.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    /// Make every call of `op` fail with `message`
    pub fn fail_on(&self, op: StoreOp, message: impl Into<String>) {
        self.lock().failures.insert(op, message.into());
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Delay every call, after it is recorded and before it takes effect
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    /// Record the call, wait out any delay, then check for an injected failure
    async fn enter(&self, op: StoreOp, call: StoreCall) -> Result<(), StoreError> {
        let delay = {
            let mut state = self.lock();
            state.calls.push(call);
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        match self.lock().failures.get(&op) {
            Some(message) => Err(StoreError::CommandFailed {
                operation: op_name(op),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn op_name(op: StoreOp) -> &'static str {
    match op {
        StoreOp::Init => "init",
        StoreOp::Backup => "backup",
        StoreOp::Restore => "restore",
        StoreOp::RestoreFile => "restore file",
        StoreOp::Find => "snapshots",
        StoreOp::Delete => "forget",
        StoreOp::EnsureDirectory => "mkdir",
    }
}

fn wire(tags: &[Tag]) -> Vec<String> {
    tags.iter().map(Tag::to_string).collect()
}

#[async_trait]
impl SnapshotStore for FakeSnapshotStore {
    async fn init_repository(&self) -> Result<(), StoreError> {
        self.enter(StoreOp::Init, StoreCall::Init).await?;
        self.lock().initialized = true;
        Ok(())
    }

    async fn backup(&self, path: &Path, tags: &[Tag]) -> Result<Option<String>, StoreError> {
        self.enter(
            StoreOp::Backup,
            StoreCall::Backup {
                path: path.to_path_buf(),
                tags: wire(tags),
            },
        )
        .await?;

        let time = self.clock.now();
        let mut state = self.lock();
        state.next_id += 1;
        let id = format!("snap-{}", state.next_id);
        state.snapshots.push(
            Snapshot::new(id.clone(), time, tags.iter().cloned().collect())
                .with_paths(vec![path.to_path_buf()]),
        );
        Ok(Some(id))
    }

    async fn restore(&self, snapshot_id: &str, target: &Path) -> Result<(), StoreError> {
        self.enter(
            StoreOp::Restore,
            StoreCall::Restore {
                snapshot_id: snapshot_id.to_string(),
                target: target.to_path_buf(),
            },
        )
        .await?;

        if self.get(snapshot_id).is_none() {
            return Err(StoreError::NotFound(snapshot_id.to_string()));
        }
        Ok(())
    }

    async fn restore_file(
        &self,
        snapshot_id: &str,
        source_file: &Path,
        target_file: &Path,
    ) -> Result<(), StoreError> {
        self.enter(
            StoreOp::RestoreFile,
            StoreCall::RestoreFile {
                snapshot_id: snapshot_id.to_string(),
                source_file: source_file.to_path_buf(),
                target_file: target_file.to_path_buf(),
            },
        )
        .await?;

        if self.get(snapshot_id).is_none() {
            return Err(StoreError::NotFound(snapshot_id.to_string()));
        }
        Ok(())
    }

    async fn find_snapshots(&self, tags: &[Tag]) -> Result<Vec<Snapshot>, StoreError> {
        self.enter(StoreOp::Find, StoreCall::Find { tags: wire(tags) })
            .await?;

        Ok(self
            .lock()
            .snapshots
            .iter()
            .filter(|s| s.tags.contains_all(tags))
            .cloned()
            .collect())
    }

    async fn delete_snapshots(&self, ids: &[String]) -> Result<(), StoreError> {
        self.enter(StoreOp::Delete, StoreCall::Delete { ids: ids.to_vec() })
            .await?;

        self.lock().snapshots.retain(|s| !ids.contains(&s.id));
        Ok(())
    }

    async fn ensure_directory(&self, path: &Path) -> Result<(), StoreError> {
        self.enter(
            StoreOp::EnsureDirectory,
            StoreCall::EnsureDirectory {
                path: path.to_path_buf(),
            },
        )
        .await
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
