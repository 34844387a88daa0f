// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{Duration, TimeZone, Utc};
use pgstash_adapters::{FakeSnapshotStore, StoreCall, StoreOp};
use pgstash_core::Interrupted;
use std::path::PathBuf;

fn backup_calls(store: &FakeSnapshotStore) -> Vec<StoreCall> {
    store
        .calls()
        .into_iter()
        .filter(|c| matches!(c, StoreCall::Backup { .. }))
        .collect()
}

#[tokio::test]
async fn full_backup_is_tagged_with_latest_timeline() {
    let store = FakeSnapshotStore::new();
    let t = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    store.add("w1", t - Duration::hours(1), &["type:wal", "wal_file:000000020000000000000004"]);
    store.add("w2", t, &["type:wal", "wal_file:000000030000000000000005"]);

    let receipt = BackupCoordinator::new(store.clone())
        .create_backup(&OpContext::background(), Path::new("/var/lib/postgresql/data"))
        .await
        .unwrap();

    assert_eq!(receipt.timeline, Timeline(3));
    assert_eq!(receipt.snapshot_id.as_deref(), Some("snap-1"));
    assert_eq!(
        backup_calls(&store),
        vec![StoreCall::Backup {
            path: PathBuf::from("/var/lib/postgresql/data"),
            tags: vec!["type:full".to_string(), "timeline:3".to_string()],
        }]
    );
}

#[tokio::test]
async fn first_backup_uses_timeline_one() {
    let store = FakeSnapshotStore::new();

    let receipt = BackupCoordinator::new(store.clone())
        .create_backup(&OpContext::background(), Path::new("/data"))
        .await
        .unwrap();

    assert_eq!(receipt.timeline, Timeline::FIRST);
    let snapshot = store.get("snap-1").unwrap();
    assert_eq!(snapshot.tags.to_wire(), vec!["type:full", "timeline:1"]);
}

#[tokio::test]
async fn empty_data_dir_is_rejected_without_store_calls() {
    let store = FakeSnapshotStore::new();

    let err = BackupCoordinator::new(store.clone())
        .create_backup(&OpContext::background(), Path::new(""))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InvalidArgument { .. }));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn listing_failure_means_unresolved_timeline() {
    let store = FakeSnapshotStore::new();
    store.fail_on(StoreOp::Find, "403 Forbidden");

    let err = BackupCoordinator::new(store.clone())
        .create_backup(&OpContext::background(), Path::new("/data"))
        .await
        .unwrap_err();

    assert!(
        matches!(&err, EngineError::TimelineUnresolved { detail } if detail.contains("403 Forbidden")),
        "got {err:?}"
    );
    assert!(backup_calls(&store).is_empty());
}

#[tokio::test]
async fn store_failure_during_backup_is_reported() {
    let store = FakeSnapshotStore::new();
    store.fail_on(StoreOp::Backup, "no space left on device");

    let err = BackupCoordinator::new(store.clone())
        .create_backup(&OpContext::background(), Path::new("/data"))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::StoreUnavailable { operation: "backup", .. }));
    assert!(store.snapshots().is_empty());
}

#[tokio::test]
async fn held_lease_makes_backup_busy() {
    let store = FakeSnapshotStore::new();
    let leases = LeaseTable::new();
    let _held = leases.try_acquire(OperationKind::Backup, Timeline::FIRST).unwrap();

    let err = BackupCoordinator::new(store.clone())
        .with_leases(leases.clone())
        .create_backup(&OpContext::background(), Path::new("/data"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Busy {
            operation: OperationKind::Backup,
            timeline: Timeline(1)
        }
    ));
    assert!(backup_calls(&store).is_empty());
}

#[tokio::test]
async fn lease_is_released_after_backup() {
    let store = FakeSnapshotStore::new();
    let leases = LeaseTable::new();
    let coordinator = BackupCoordinator::new(store).with_leases(leases.clone());

    coordinator
        .create_backup(&OpContext::background(), Path::new("/data"))
        .await
        .unwrap();
    assert!(!leases.is_held(OperationKind::Backup, Timeline::FIRST));

    coordinator
        .create_backup(&OpContext::background(), Path::new("/data"))
        .await
        .unwrap();
}

#[tokio::test]
async fn cancelled_backup_stores_nothing() {
    let store = FakeSnapshotStore::new();
    store.set_delay(std::time::Duration::from_millis(500));
    let ctx = OpContext::background();
    let coordinator = BackupCoordinator::new(store.clone());

    let canceller = ctx.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let err = coordinator
        .create_backup(&ctx, Path::new("/data"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        EngineError::Cancelled {
            reason: Interrupted::Cancelled,
            ..
        }
    ));
    assert!(store.snapshots().is_empty());
}
