// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot metadata as reported by the store

use crate::segment::{Segment, SegmentKey};
use crate::tags::{SnapshotKind, SnapshotTags};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One immutable entry in the snapshot store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub time: DateTime<Utc>,
    /// Informational only
    #[serde(default)]
    pub hostname: String,
    /// Source paths recorded at backup time
    #[serde(default)]
    pub paths: Vec<PathBuf>,
    #[serde(default)]
    pub tags: SnapshotTags,
}

impl Snapshot {
    pub fn new(id: impl Into<String>, time: DateTime<Utc>, tags: SnapshotTags) -> Self {
        Self {
            id: id.into(),
            time,
            hostname: String::new(),
            paths: Vec::new(),
            tags,
        }
    }

    pub fn with_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.paths = paths;
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn kind(&self) -> Option<SnapshotKind> {
        self.tags.kind()
    }

    /// The WAL segment held by this snapshot, with `backup_id` and
    /// `archived_at` taken from the snapshot itself
    pub fn wal_segment(&self) -> Option<Segment> {
        self.tags
            .wal_segment()
            .map(|key: SegmentKey| Segment::new(key).with_snapshot(self.id.clone(), self.time))
    }
}

/// Stable sort, most recent first. Snapshots with equal times keep the
/// order the store listed them in.
pub fn sort_newest_first(snapshots: &mut [Snapshot]) {
    snapshots.sort_by(|a, b| b.time.cmp(&a.time));
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
