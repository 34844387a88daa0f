// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL segment archiving

use crate::error::{store_call, EngineError};
use crate::lease::{LeaseTable, OperationKind};
use pgstash_adapters::SnapshotStore;
use pgstash_core::tags::wal_segment_tags;
use pgstash_core::{OpContext, Segment};
use std::path::Path;
use tracing::Instrument;

/// Stores completed WAL segments, one snapshot per segment
#[derive(Clone)]
pub struct WalArchiver<S> {
    store: S,
    leases: Option<LeaseTable>,
}

impl<S: SnapshotStore> WalArchiver<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            leases: None,
        }
    }

    /// Hold an archive lease per timeline while storing. Different segments
    /// of one timeline are then archived one at a time; an overlapping call
    /// fails with [`EngineError::Busy`].
    pub fn with_leases(mut self, leases: LeaseTable) -> Self {
        self.leases = Some(leases);
        self
    }

    /// Archive the segment at `wal_path`.
    ///
    /// The file's base name must be a WAL file name; nothing reaches the
    /// store otherwise. Archiving the same segment twice stores it twice.
    pub async fn archive(&self, ctx: &OpContext, wal_path: &Path) -> Result<Segment, EngineError> {
        if wal_path.as_os_str().is_empty() {
            return Err(EngineError::invalid("archive WAL", "WAL file path is empty"));
        }
        let segment = Segment::from_path(wal_path)?;
        let key = segment.key;

        let span = tracing::info_span!("archive", wal_file = %key, timeline = %key.timeline);
        async {
            let _lease = match &self.leases {
                Some(leases) => Some(
                    leases
                        .try_acquire(OperationKind::Archive, key.timeline)
                        .ok_or(EngineError::Busy {
                            operation: OperationKind::Archive,
                            timeline: key.timeline,
                        })?,
                ),
                None => None,
            };

            let tags = wal_segment_tags(&key);
            let snapshot_id =
                store_call(ctx, "archive WAL", self.store.backup(wal_path, &tags)).await?;

            tracing::info!(
                snapshot_id = snapshot_id.as_deref().unwrap_or("-"),
                "WAL segment archived"
            );
            Ok::<_, EngineError>(Segment {
                backup_id: snapshot_id,
                ..segment
            })
        }
        .instrument(span)
        .await
    }
}

#[cfg(test)]
#[path = "archive_tests.rs"]
mod tests;
