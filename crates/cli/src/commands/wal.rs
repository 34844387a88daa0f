// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pgstash wal-*` - WAL segment archival
//!
//! `wal-archive` and `wal-restore` are shaped for PostgreSQL's
//! `archive_command = 'pgstash wal-archive %p'` and
//! `restore_command = 'pgstash wal-restore %f %p'`.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use pgstash_adapters::SnapshotStore;
use pgstash_core::{Clock, OpContext};
use pgstash_engine::Stash;

use crate::output::{OutputFormat, SegmentRow};

#[derive(Args)]
pub struct WalArchiveArgs {
    /// Path of the completed WAL segment (%p)
    pub path: PathBuf,
}

#[derive(Args)]
pub struct WalRestoreArgs {
    /// WAL file name to fetch (%f)
    pub name: String,
    /// Where PostgreSQL expects the file (%p)
    pub target: PathBuf,
}

#[derive(Args)]
pub struct WalListArgs {
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

pub async fn archive<S: SnapshotStore, C: Clock>(
    stash: &Stash<S, C>,
    ctx: &OpContext,
    args: WalArchiveArgs,
) -> Result<String> {
    let segment = stash.archiver.archive(ctx, &args.path).await?;
    Ok(format!(
        "Archived {} as {}",
        segment.file_name(),
        segment.backup_id.as_deref().unwrap_or("-")
    ))
}

pub async fn restore<S: SnapshotStore, C: Clock>(
    stash: &Stash<S, C>,
    ctx: &OpContext,
    args: WalRestoreArgs,
) -> Result<String> {
    let segment = stash
        .restores
        .restore_segment(ctx, &args.name, &args.target)
        .await?;
    Ok(format!(
        "Restored {} to {}",
        segment.file_name(),
        args.target.display()
    ))
}

pub async fn list<S: SnapshotStore, C: Clock>(
    stash: &Stash<S, C>,
    ctx: &OpContext,
) -> Result<Vec<SegmentRow>> {
    let segments = stash.restores.archived_segments(ctx).await?;
    Ok(segments.iter().map(SegmentRow::from).collect())
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
