// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pgstash cleanup` - prune old WAL segments

use std::time::Duration;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use pgstash_adapters::SnapshotStore;
use pgstash_core::{Clock, OpContext};
use pgstash_engine::Stash;

#[derive(Args)]
pub struct CleanupArgs {
    /// Delete segments archived before this RFC 3339 timestamp
    #[arg(long, conflicts_with = "older_than")]
    pub before: Option<DateTime<Utc>>,
    /// Delete segments older than this age, e.g. "7days"
    #[arg(long, value_parser = humantime::parse_duration)]
    pub older_than: Option<Duration>,
}

/// Without a cutoff, falls back to the configured `retention.wal_max_age`
pub async fn cleanup<S: SnapshotStore, C: Clock>(
    stash: &Stash<S, C>,
    ctx: &OpContext,
    args: CleanupArgs,
    wal_max_age: Option<Duration>,
) -> Result<String> {
    let deleted = match (args.before, args.older_than.or(wal_max_age)) {
        (Some(before), _) => stash.retention.cleanup_before(ctx, before).await?,
        (None, Some(age)) => stash.retention.cleanup_older_than(ctx, age).await?,
        (None, None) => bail!("--before or --older-than is required when no retention age is configured"),
    };
    Ok(format!("Deleted {deleted} WAL snapshots"))
}

#[cfg(test)]
#[path = "cleanup_tests.rs"]
mod tests;
