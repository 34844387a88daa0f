// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pgstash_adapters::{FakeSnapshotStore, StoreCall, StoreOp};
use pgstash_core::{SegmentKey, Timeline};
use std::path::PathBuf;
use yare::parameterized;

#[tokio::test]
async fn archive_tags_every_segment_field() {
    let store = FakeSnapshotStore::new();

    let segment = WalArchiver::new(store.clone())
        .archive(
            &OpContext::background(),
            Path::new("/pg_wal/00000002000000000000000A"),
        )
        .await
        .unwrap();

    assert_eq!(segment.key, SegmentKey::new(2, 0, 10));
    assert_eq!(segment.backup_id.as_deref(), Some("snap-1"));
    assert_eq!(
        store.calls(),
        vec![StoreCall::Backup {
            path: PathBuf::from("/pg_wal/00000002000000000000000A"),
            tags: vec![
                "type:wal".to_string(),
                "timeline:2".to_string(),
                "logical_id:0".to_string(),
                "segment_id:10".to_string(),
                "wal_file:00000002000000000000000A".to_string(),
            ],
        }]
    );
}

#[parameterized(
    lowercase = { "/pg_wal/00000001000000000000000a" },
    too_short = { "/pg_wal/0000000100000000000000" },
    history_file = { "/pg_wal/00000002.history" },
    partial = { "/pg_wal/000000010000000000000001.partial" },
    root = { "/" },
)]
fn invalid_names_never_reach_the_store(path: &str) {
    let store = FakeSnapshotStore::new();

    let err = tokio::runtime::Runtime::new()
        .unwrap()
        .block_on(WalArchiver::new(store.clone()).archive(&OpContext::background(), Path::new(path)))
        .unwrap_err();

    assert!(matches!(err, EngineError::InvalidSegmentName(_)), "got {err:?}");
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn empty_path_is_invalid_argument() {
    let store = FakeSnapshotStore::new();

    let err = WalArchiver::new(store.clone())
        .archive(&OpContext::background(), Path::new(""))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InvalidArgument { .. }));
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn archiving_twice_stores_two_snapshots() {
    let store = FakeSnapshotStore::new();
    let archiver = WalArchiver::new(store.clone());
    let path = Path::new("/pg_wal/000000010000000000000001");

    archiver.archive(&OpContext::background(), path).await.unwrap();
    archiver.archive(&OpContext::background(), path).await.unwrap();

    assert_eq!(store.snapshots().len(), 2);
}

#[tokio::test]
async fn store_failure_is_reported() {
    let store = FakeSnapshotStore::new();
    store.fail_on(StoreOp::Backup, "connection reset");

    let err = WalArchiver::new(store)
        .archive(
            &OpContext::background(),
            Path::new("/pg_wal/000000010000000000000001"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::StoreUnavailable { operation: "archive WAL", .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn concurrent_archive_on_same_timeline_is_busy() {
    let store = FakeSnapshotStore::new();
    let leases = LeaseTable::new();
    let _held = leases.try_acquire(OperationKind::Archive, Timeline(1)).unwrap();
    let archiver = WalArchiver::new(store.clone()).with_leases(leases);

    let err = archiver
        .archive(
            &OpContext::background(),
            Path::new("/pg_wal/000000010000000000000007"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Busy { operation: OperationKind::Archive, .. }));

    archiver
        .archive(
            &OpContext::background(),
            Path::new("/pg_wal/000000020000000000000007"),
        )
        .await
        .unwrap();
    assert_eq!(store.snapshots().len(), 1);
}

#[tokio::test]
async fn timed_out_archive_is_cancelled() {
    let store = FakeSnapshotStore::new();
    store.set_delay(std::time::Duration::from_millis(500));
    let ctx = OpContext::background().with_timeout(std::time::Duration::from_millis(20));

    let err = WalArchiver::new(store.clone())
        .archive(&ctx, Path::new("/pg_wal/000000010000000000000001"))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Cancelled { .. }));
    assert!(store.snapshots().is_empty());
}
