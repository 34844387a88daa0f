// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced store wrapper for consistent observability

use crate::store::{SnapshotStore, StoreError};
use async_trait::async_trait;
use pgstash_core::{Snapshot, Tag};
use std::path::Path;
use std::time::Instant;
use tracing::Instrument;

/// Wrapper that adds tracing to any SnapshotStore
#[derive(Clone)]
pub struct TracedSnapshotStore<S> {
    inner: S,
}

impl<S> TracedSnapshotStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn require_id(snapshot_id: &str) -> Result<(), StoreError> {
    if snapshot_id.trim().is_empty() {
        tracing::error!("empty snapshot id");
        return Err(StoreError::Precondition("snapshot id is empty".to_string()));
    }
    Ok(())
}

#[async_trait]
impl<S: SnapshotStore> SnapshotStore for TracedSnapshotStore<S> {
    async fn init_repository(&self) -> Result<(), StoreError> {
        let span = tracing::info_span!("store.init");
        async {
            let start = Instant::now();
            let result = self.inner.init_repository().await;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed_ms(start), "repository ready"),
                Err(e) => tracing::error!(error = %e, "init failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn backup(&self, path: &Path, tags: &[Tag]) -> Result<Option<String>, StoreError> {
        let span = tracing::info_span!("store.backup", path = %path.display());
        async {
            tracing::info!(tags = ?tags.iter().map(Tag::to_string).collect::<Vec<_>>(), "starting");

            // Precondition: source must exist
            if !path.exists() {
                tracing::error!("source path does not exist");
                return Err(StoreError::Precondition(format!(
                    "source path does not exist: {}",
                    path.display()
                )));
            }

            let start = Instant::now();
            let result = self.inner.backup(path, tags).await;
            match &result {
                Ok(id) => tracing::info!(
                    snapshot_id = id.as_deref().unwrap_or("-"),
                    elapsed_ms = elapsed_ms(start),
                    "snapshot stored"
                ),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "backup failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn restore(&self, snapshot_id: &str, target: &Path) -> Result<(), StoreError> {
        let span = tracing::info_span!("store.restore", snapshot_id, target = %target.display());
        async {
            require_id(snapshot_id)?;

            let start = Instant::now();
            let result = self.inner.restore(snapshot_id, target).await;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed_ms(start), "snapshot restored"),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "restore failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn restore_file(
        &self,
        snapshot_id: &str,
        source_file: &Path,
        target_file: &Path,
    ) -> Result<(), StoreError> {
        let span = tracing::info_span!(
            "store.restore_file",
            snapshot_id,
            source = %source_file.display(),
            target = %target_file.display()
        );
        async {
            require_id(snapshot_id)?;

            let start = Instant::now();
            let result = self.inner.restore_file(snapshot_id, source_file, target_file).await;
            match &result {
                Ok(()) => tracing::info!(elapsed_ms = elapsed_ms(start), "file restored"),
                Err(e) => tracing::error!(elapsed_ms = elapsed_ms(start), error = %e, "file restore failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn find_snapshots(&self, tags: &[Tag]) -> Result<Vec<Snapshot>, StoreError> {
        let span = tracing::debug_span!("store.find");
        async {
            let result = self.inner.find_snapshots(tags).await;
            match &result {
                Ok(found) => tracing::debug!(
                    tags = ?tags.iter().map(Tag::to_string).collect::<Vec<_>>(),
                    count = found.len(),
                    "listed snapshots"
                ),
                Err(e) => tracing::warn!(error = %e, "listing failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn delete_snapshots(&self, ids: &[String]) -> Result<(), StoreError> {
        let span = tracing::info_span!("store.delete", count = ids.len());
        async {
            let result = self.inner.delete_snapshots(ids).await;
            match &result {
                Ok(()) => tracing::info!("snapshots deleted"),
                Err(e) => tracing::error!(error = %e, "delete failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn ensure_directory(&self, path: &Path) -> Result<(), StoreError> {
        let result = self.inner.ensure_directory(path).await;
        tracing::trace!(path = %path.display(), ok = result.is_ok(), "ensured directory");
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
