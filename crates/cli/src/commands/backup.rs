// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pgstash backup` / `pgstash restore` - full base backups

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use pgstash_adapters::SnapshotStore;
use pgstash_core::{Clock, OpContext};
use pgstash_engine::{RecoveryTarget, Stash};

#[derive(Args)]
pub struct BackupArgs {
    /// PostgreSQL data directory
    pub data_dir: PathBuf,
}

#[derive(Args)]
pub struct RestoreArgs {
    /// Snapshot id of the backup
    pub backup_id: String,
    /// Directory to restore into
    pub dest: PathBuf,

    /// Recovery target time, e.g. "2026-03-01 10:00:00"
    #[arg(long)]
    pub target_time: Option<String>,
    /// Recovery target transaction id
    #[arg(long)]
    pub target_xid: Option<String>,
    /// Recovery target LSN
    #[arg(long)]
    pub target_lsn: Option<String>,
    /// Named restore point
    #[arg(long)]
    pub target_name: Option<String>,
    /// Stop just after the target instead of just before it
    #[arg(long)]
    pub inclusive: bool,
}

impl RestoreArgs {
    fn recovery_target(&self) -> Option<RecoveryTarget> {
        let target = RecoveryTarget {
            target_time: self.target_time.clone(),
            target_xid: self.target_xid.clone(),
            target_lsn: self.target_lsn.clone(),
            target_name: self.target_name.clone(),
            target_inclusive: self.inclusive,
        };
        (!target.is_empty()).then_some(target)
    }
}

pub async fn backup<S: SnapshotStore, C: Clock>(
    stash: &Stash<S, C>,
    ctx: &OpContext,
    args: BackupArgs,
) -> Result<String> {
    let receipt = stash.backups.create_backup(ctx, &args.data_dir).await?;
    Ok(match receipt.snapshot_id {
        Some(id) => format!("Backup {} created on timeline {}", id, receipt.timeline),
        None => format!("Backup created on timeline {}", receipt.timeline),
    })
}

pub async fn restore<S: SnapshotStore, C: Clock>(
    stash: &Stash<S, C>,
    ctx: &OpContext,
    args: RestoreArgs,
) -> Result<String> {
    let target = args.recovery_target();
    stash
        .restores
        .restore_backup(ctx, &args.backup_id, &args.dest, target.as_ref())
        .await?;
    Ok(format!(
        "Restored backup {} to {}",
        args.backup_id,
        args.dest.display()
    ))
}

#[cfg(test)]
#[path = "backup_tests.rs"]
mod tests;
