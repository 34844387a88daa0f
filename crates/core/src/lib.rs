// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pgstash-core: domain types for WAL archival and point-in-time recovery
//!
//! This crate provides:
//! - WAL segment name parsing and replay ordering
//! - Typed snapshot tags and snapshot metadata
//! - Clock and per-call cancellation abstractions

pub mod clock;
pub mod context;
pub mod segment;
pub mod snapshot;
pub mod tags;

pub use clock::{Clock, FakeClock, SystemClock};
pub use context::{Interrupted, OpContext};
pub use segment::{sort_for_replay, Segment, SegmentError, SegmentKey, Timeline};
pub use snapshot::{sort_newest_first, Snapshot};
pub use tags::{SnapshotKind, SnapshotTags, Tag};
