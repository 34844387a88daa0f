// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot store adapters

mod restic;

pub use restic::{ResticConfig, ResticStore};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeSnapshotStore, StoreCall, StoreOp};

use async_trait::async_trait;
use pgstash_core::{Snapshot, Tag};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from snapshot store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{operation} failed: {message}")]
    CommandFailed {
        operation: &'static str,
        message: String,
    },
    #[error("unreadable {operation} output: {message}")]
    Parse {
        operation: &'static str,
        message: String,
    },
    #[error("snapshot not found: {0}")]
    NotFound(String),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("precondition failed: {0}")]
    Precondition(String),
}

impl StoreError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Content-addressed snapshot store, queried by tags.
///
/// Implementations must be safe to share between concurrent callers.
/// Dropping a pending call must abort it.
#[async_trait]
pub trait SnapshotStore: Clone + Send + Sync + 'static {
    /// Create the repository. Already initialized is success.
    async fn init_repository(&self) -> Result<(), StoreError>;

    /// Store `path` as a new snapshot carrying `tags`.
    ///
    /// Returns the new snapshot id when the store reports one.
    async fn backup(&self, path: &Path, tags: &[Tag]) -> Result<Option<String>, StoreError>;

    /// Restore a whole snapshot into `target`
    async fn restore(&self, snapshot_id: &str, target: &Path) -> Result<(), StoreError>;

    /// Restore one file of a snapshot to exactly `target_file`
    async fn restore_file(
        &self,
        snapshot_id: &str,
        source_file: &Path,
        target_file: &Path,
    ) -> Result<(), StoreError>;

    /// Snapshots carrying every tag in `tags`, in store order
    async fn find_snapshots(&self, tags: &[Tag]) -> Result<Vec<Snapshot>, StoreError>;

    /// Delete the given snapshots
    async fn delete_snapshots(&self, ids: &[String]) -> Result<(), StoreError>;

    /// Create `path` and its parents if missing
    async fn ensure_directory(&self, path: &Path) -> Result<(), StoreError>;
}
