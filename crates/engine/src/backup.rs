// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Full base backups

use crate::error::{store_call, EngineError};
use crate::lease::{LeaseTable, OperationKind};
use crate::timeline::{ListingOrder, TimelineResolver};
use pgstash_adapters::SnapshotStore;
use pgstash_core::tags::full_backup_tags;
use pgstash_core::{OpContext, Timeline};
use std::path::Path;
use tracing::Instrument;

/// Result of a full backup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupReceipt {
    /// Snapshot id, when the store reports one
    pub snapshot_id: Option<String>,
    pub timeline: Timeline,
}

/// Takes full backups of a data directory, tagged with the current timeline
#[derive(Clone)]
pub struct BackupCoordinator<S> {
    store: S,
    resolver: TimelineResolver<S>,
    leases: Option<LeaseTable>,
}

impl<S: SnapshotStore> BackupCoordinator<S> {
    pub fn new(store: S) -> Self {
        Self {
            resolver: TimelineResolver::new(store.clone()),
            store,
            leases: None,
        }
    }

    pub fn with_order(mut self, order: ListingOrder) -> Self {
        self.resolver = self.resolver.with_order(order);
        self
    }

    /// Refuse a second concurrent backup on the same timeline
    pub fn with_leases(mut self, leases: LeaseTable) -> Self {
        self.leases = Some(leases);
        self
    }

    pub async fn create_backup(
        &self,
        ctx: &OpContext,
        data_dir: &Path,
    ) -> Result<BackupReceipt, EngineError> {
        if data_dir.as_os_str().is_empty() {
            return Err(EngineError::invalid("backup", "data directory is empty"));
        }

        let span = tracing::info_span!("backup", data_dir = %data_dir.display());
        async {
            let timeline = self
                .resolver
                .current_timeline(ctx)
                .await
                .map_err(unresolved)?;

            let _lease = match &self.leases {
                Some(leases) => Some(
                    leases
                        .try_acquire(OperationKind::Backup, timeline)
                        .ok_or(EngineError::Busy {
                            operation: OperationKind::Backup,
                            timeline,
                        })?,
                ),
                None => None,
            };

            let tags = full_backup_tags(timeline);
            let snapshot_id =
                store_call(ctx, "backup", self.store.backup(data_dir, &tags)).await?;

            tracing::info!(
                %timeline,
                snapshot_id = snapshot_id.as_deref().unwrap_or("-"),
                "full backup complete"
            );
            Ok::<_, EngineError>(BackupReceipt {
                snapshot_id,
                timeline,
            })
        }
        .instrument(span)
        .await
    }
}

/// A backup cannot be tagged without a timeline, so listing failures
/// surface as an unresolved timeline. Cancellation passes through.
fn unresolved(err: EngineError) -> EngineError {
    match err {
        EngineError::StoreUnavailable { source, .. } => EngineError::TimelineUnresolved {
            detail: format!("listing WAL snapshots failed: {source}"),
        },
        other => other,
    }
}

#[cfg(test)]
#[path = "backup_tests.rs"]
mod tests;
