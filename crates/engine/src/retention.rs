// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pruning of archived WAL segments

use crate::error::{store_call, EngineError};
use chrono::{DateTime, Utc};
use pgstash_adapters::SnapshotStore;
use pgstash_core::tags::wal_query;
use pgstash_core::{Clock, OpContext, SystemClock};
use std::time::Duration;
use tracing::Instrument;

/// Deletes WAL snapshots older than a cutoff.
///
/// Full backups are never touched.
#[derive(Clone)]
pub struct RetentionSweeper<S, C = SystemClock> {
    store: S,
    clock: C,
}

impl<S: SnapshotStore> RetentionSweeper<S, SystemClock> {
    pub fn new(store: S) -> Self {
        Self::with_clock(store, SystemClock)
    }
}

impl<S: SnapshotStore, C: Clock> RetentionSweeper<S, C> {
    pub fn with_clock(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Delete every WAL snapshot taken strictly before `cutoff`.
    ///
    /// Returns the number deleted. Nothing to delete is not an error.
    pub async fn cleanup_before(
        &self,
        ctx: &OpContext,
        cutoff: DateTime<Utc>,
    ) -> Result<usize, EngineError> {
        let span = tracing::info_span!("cleanup", %cutoff);
        async {
            let snapshots =
                store_call(ctx, "list WAL snapshots", self.store.find_snapshots(&wal_query()))
                    .await?;

            let expired: Vec<String> = snapshots
                .into_iter()
                .filter(|s| s.time < cutoff)
                .map(|s| s.id)
                .collect();
            if expired.is_empty() {
                tracing::info!("no WAL segments to prune");
                return Ok(0);
            }

            store_call(ctx, "delete WAL snapshots", self.store.delete_snapshots(&expired)).await?;
            tracing::info!(count = expired.len(), "pruned WAL segments");
            Ok::<_, EngineError>(expired.len())
        }
        .instrument(span)
        .await
    }

    /// Delete WAL snapshots older than `age`, measured from the clock's now
    pub async fn cleanup_older_than(
        &self,
        ctx: &OpContext,
        age: Duration,
    ) -> Result<usize, EngineError> {
        let age = chrono::Duration::from_std(age)
            .map_err(|e| EngineError::invalid("cleanup", format!("age out of range: {e}")))?;
        let cutoff = self
            .clock
            .now()
            .checked_sub_signed(age)
            .ok_or_else(|| EngineError::invalid("cleanup", "age is out of range"))?;
        self.cleanup_before(ctx, cutoff).await
    }
}

#[cfg(test)]
#[path = "retention_tests.rs"]
mod tests;
