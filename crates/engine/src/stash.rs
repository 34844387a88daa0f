// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wiring of one store into every coordinator

use crate::archive::WalArchiver;
use crate::backup::BackupCoordinator;
use crate::config::{OperationsConfig, StashConfig};
use crate::error::{store_call, EngineError};
use crate::lease::LeaseTable;
use crate::restore::RestoreCoordinator;
use crate::retention::RetentionSweeper;
use crate::timeline::TimelineResolver;
use pgstash_adapters::{ResticStore, SnapshotStore, TracedSnapshotStore};
use pgstash_core::{Clock, OpContext, SystemClock};

/// Stash backed by the restic CLI, with tracing
pub type ResticStash = Stash<TracedSnapshotStore<ResticStore>, SystemClock>;

/// Every coordinator, sharing one store
#[derive(Clone)]
pub struct Stash<S, C = SystemClock> {
    store: S,
    pub timelines: TimelineResolver<S>,
    pub backups: BackupCoordinator<S>,
    pub archiver: WalArchiver<S>,
    pub restores: RestoreCoordinator<S>,
    pub retention: RetentionSweeper<S, C>,
    operations: OperationsConfig,
}

impl<S: SnapshotStore, C: Clock> Stash<S, C> {
    pub fn new(store: S, clock: C, operations: OperationsConfig) -> Self {
        let order = operations.listing_order;
        let mut backups = BackupCoordinator::new(store.clone()).with_order(order);
        let mut archiver = WalArchiver::new(store.clone());
        if operations.exclusive_backups {
            let leases = LeaseTable::new();
            backups = backups.with_leases(leases.clone());
            archiver = archiver.with_leases(leases);
        }

        Self {
            timelines: TimelineResolver::new(store.clone()).with_order(order),
            backups,
            archiver,
            restores: RestoreCoordinator::new(store.clone()).with_order(order),
            retention: RetentionSweeper::with_clock(store.clone(), clock),
            store,
            operations,
        }
    }

    pub fn operations(&self) -> &OperationsConfig {
        &self.operations
    }

    /// Context for one operation: cancelled with `parent`, bounded by the
    /// configured timeout
    pub fn context(&self, parent: &OpContext) -> OpContext {
        let ctx = parent.child();
        match self.operations.timeout {
            Some(timeout) => ctx.with_timeout(timeout),
            None => ctx,
        }
    }

    /// Create the repository if it does not exist yet
    pub async fn init_repository(&self, ctx: &OpContext) -> Result<(), EngineError> {
        store_call(ctx, "init repository", self.store.init_repository()).await
    }
}

impl ResticStash {
    pub fn from_config(config: &StashConfig) -> Self {
        let store = TracedSnapshotStore::new(ResticStore::new(config.repository.clone()));
        Stash::new(store, SystemClock, config.operations.clone())
    }
}

#[cfg(test)]
#[path = "stash_tests.rs"]
mod tests;
