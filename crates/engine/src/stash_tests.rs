// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::lease::OperationKind;
use crate::timeline::ListingOrder;
use chrono::{TimeZone, Utc};
use pgstash_adapters::{FakeSnapshotStore, ResticConfig};
use pgstash_core::{FakeClock, Timeline};
use std::path::Path;
use std::time::Duration;

fn stash(operations: OperationsConfig) -> (FakeSnapshotStore, Stash<FakeSnapshotStore, FakeClock>) {
    let store = FakeSnapshotStore::new();
    let clock = FakeClock::at(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
    (store.clone(), Stash::new(store, clock, operations))
}

#[tokio::test]
async fn coordinators_share_the_store() {
    let (store, stash) = stash(OperationsConfig::default());
    let ctx = OpContext::background();

    stash.init_repository(&ctx).await.unwrap();
    stash
        .archiver
        .archive(&ctx, Path::new("/pg_wal/000000040000000000000001"))
        .await
        .unwrap();
    let receipt = stash
        .backups
        .create_backup(&ctx, Path::new("/data"))
        .await
        .unwrap();

    assert!(store.is_initialized());
    assert_eq!(receipt.timeline, Timeline(4));
    assert_eq!(stash.timelines.current_timeline(&ctx).await.unwrap(), Timeline(4));
    assert_eq!(store.snapshots().len(), 2);
}

#[test]
fn listing_order_reaches_every_coordinator() {
    let (_, stash) = stash(OperationsConfig {
        listing_order: ListingOrder::StoreOrder,
        ..OperationsConfig::default()
    });
    assert_eq!(stash.timelines.order(), ListingOrder::StoreOrder);
}

#[tokio::test]
async fn exclusive_backups_share_one_lease_table() {
    let (store, stash) = stash(OperationsConfig {
        exclusive_backups: true,
        ..OperationsConfig::default()
    });
    store.set_delay(Duration::from_millis(100));
    let ctx = OpContext::background();

    let (first, second) = tokio::join!(
        stash.backups.create_backup(&ctx, Path::new("/data")),
        stash.backups.create_backup(&ctx, Path::new("/data")),
    );

    let busy = [&first, &second]
        .iter()
        .filter(|r| {
            matches!(
                r,
                Err(EngineError::Busy {
                    operation: OperationKind::Backup,
                    ..
                })
            )
        })
        .count();
    assert_eq!(busy, 1, "first: {first:?}, second: {second:?}");
    assert!(first.is_ok() || second.is_ok());
}

#[tokio::test]
async fn context_applies_configured_timeout() {
    let (_, stash) = stash(OperationsConfig {
        timeout: Some(Duration::from_secs(5)),
        ..OperationsConfig::default()
    });
    let root = OpContext::background();

    let ctx = stash.context(&root);
    assert_eq!(ctx.timeout(), Some(Duration::from_secs(5)));

    root.cancel();
    assert!(ctx.is_cancelled());
}

#[test]
fn restic_stash_builds_from_config() {
    let mut config = StashConfig::default();
    config.repository = ResticConfig::new("/srv/restic", "pw");
    config.operations.exclusive_backups = true;

    let stash = ResticStash::from_config(&config);
    assert!(stash.operations().exclusive_backups);
}
