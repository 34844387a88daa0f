// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Full-backup and single-segment restore

use crate::error::{store_call, EngineError};
use crate::timeline::ListingOrder;
use pgstash_adapters::SnapshotStore;
use pgstash_core::tags::{wal_file_query, wal_query};
use pgstash_core::{sort_for_replay, OpContext, Segment, SegmentKey, Snapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::Instrument;

/// Point PostgreSQL should stop replaying at.
///
/// Carried through to the log only; recovery settings are written by the
/// caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryTarget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_time: Option<String>,
    #[serde(default, rename = "targetXID", skip_serializing_if = "Option::is_none")]
    pub target_xid: Option<String>,
    #[serde(default, rename = "targetLSN", skip_serializing_if = "Option::is_none")]
    pub target_lsn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_name: Option<String>,
    #[serde(default)]
    pub target_inclusive: bool,
}

impl RecoveryTarget {
    pub fn is_empty(&self) -> bool {
        self.target_time.is_none()
            && self.target_xid.is_none()
            && self.target_lsn.is_none()
            && self.target_name.is_none()
    }
}

/// Restores full backups and individual WAL segments
#[derive(Clone)]
pub struct RestoreCoordinator<S> {
    store: S,
    order: ListingOrder,
}

impl<S: SnapshotStore> RestoreCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            order: ListingOrder::default(),
        }
    }

    pub fn with_order(mut self, order: ListingOrder) -> Self {
        self.order = order;
        self
    }

    /// Restore a whole snapshot into `target_dir`
    pub async fn restore_backup(
        &self,
        ctx: &OpContext,
        backup_id: &str,
        target_dir: &Path,
        recovery_target: Option<&RecoveryTarget>,
    ) -> Result<(), EngineError> {
        if backup_id.trim().is_empty() {
            return Err(EngineError::invalid("restore", "backup id is empty"));
        }
        if target_dir.as_os_str().is_empty() {
            return Err(EngineError::invalid("restore", "target directory is empty"));
        }

        let span = tracing::info_span!("restore", backup_id, target = %target_dir.display());
        async {
            if let Some(recovery_target) = recovery_target.filter(|t| !t.is_empty()) {
                tracing::info!(?recovery_target, "recovery target requested");
            }

            restore_failed(
                backup_id,
                store_call(ctx, "restore", self.store.restore(backup_id, target_dir)).await,
            )?;
            tracing::info!("backup restored");
            Ok::<_, EngineError>(())
        }
        .instrument(span)
        .await
    }

    /// Find the snapshot holding `wal_file_name`.
    ///
    /// When the segment was archived more than once, the newest copy wins
    /// (see [`ListingOrder`]).
    pub async fn find_segment(
        &self,
        ctx: &OpContext,
        wal_file_name: &str,
    ) -> Result<Segment, EngineError> {
        let (_, segment) = self.locate(ctx, wal_file_name).await?;
        Ok(segment)
    }

    /// Restore one WAL segment to exactly `target_path`
    pub async fn restore_segment(
        &self,
        ctx: &OpContext,
        wal_file_name: &str,
        target_path: &Path,
    ) -> Result<Segment, EngineError> {
        SegmentKey::parse(wal_file_name)?;
        if target_path.as_os_str().is_empty() {
            return Err(EngineError::invalid("restore WAL", "target path is empty"));
        }

        let span = tracing::info_span!("restore_segment", wal_file = wal_file_name, target = %target_path.display());
        async {
            let (snapshot, segment) = self.locate(ctx, wal_file_name).await?;

            if let Some(parent) = target_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                store_call(ctx, "create restore directory", self.store.ensure_directory(parent))
                    .await?;
            }

            let source_file = snapshot
                .paths
                .first()
                .cloned()
                .unwrap_or_else(|| PathBuf::from(segment.file_name()));
            restore_failed(
                &snapshot.id,
                store_call(
                    ctx,
                    "restore WAL",
                    self.store.restore_file(&snapshot.id, &source_file, target_path),
                )
                .await,
            )?;

            tracing::info!(snapshot_id = %snapshot.id, "WAL segment restored");
            Ok::<_, EngineError>(segment)
        }
        .instrument(span)
        .await
    }

    /// Every archived segment once, in replay order.
    ///
    /// Duplicate archives of a segment collapse to the newest copy.
    /// Snapshots without a parsable WAL name are skipped.
    pub async fn archived_segments(&self, ctx: &OpContext) -> Result<Vec<Segment>, EngineError> {
        let mut snapshots =
            store_call(ctx, "list WAL snapshots", self.store.find_snapshots(&wal_query())).await?;
        self.order.apply(&mut snapshots);

        let mut latest: BTreeMap<SegmentKey, Segment> = BTreeMap::new();
        for snapshot in &snapshots {
            match snapshot.wal_segment() {
                Some(segment) => {
                    latest.entry(segment.key).or_insert(segment);
                }
                None => tracing::warn!(snapshot_id = %snapshot.id, "WAL snapshot without WAL file name"),
            }
        }

        let mut segments: Vec<Segment> = latest.into_values().collect();
        sort_for_replay(&mut segments);
        Ok(segments)
    }

    async fn locate(
        &self,
        ctx: &OpContext,
        wal_file_name: &str,
    ) -> Result<(Snapshot, Segment), EngineError> {
        let key = SegmentKey::parse(wal_file_name)?;
        let name = key.file_name();

        let mut snapshots =
            store_call(ctx, "find WAL segment", self.store.find_snapshots(&wal_file_query(&name)))
                .await?;
        self.order.apply(&mut snapshots);

        if snapshots.len() > 1 {
            tracing::debug!(wal_file = %name, matches = snapshots.len(), "segment archived more than once");
        }
        let snapshot = snapshots
            .into_iter()
            .next()
            .ok_or(EngineError::SegmentNotFound { name })?;

        let mut segment = Segment::new(key).with_snapshot(snapshot.id.clone(), snapshot.time);
        segment.source_path = snapshot.paths.first().cloned();
        Ok((snapshot, segment))
    }
}

/// Store failures while restoring are restore failures
fn restore_failed<T>(snapshot_id: &str, result: Result<T, EngineError>) -> Result<T, EngineError> {
    result.map_err(|err| match err {
        EngineError::StoreUnavailable { source, .. } => EngineError::RestoreFailed {
            snapshot_id: snapshot_id.to_string(),
            source,
        },
        other => other,
    })
}

#[cfg(test)]
#[path = "restore_tests.rs"]
mod tests;
