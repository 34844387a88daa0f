// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL segment identity and replay order
//!
//! A PostgreSQL WAL file name is three 8-digit upper-case hex groups:
//! timeline, logical file number, segment number. Parsing yields a
//! [`SegmentKey`] whose derived ordering is the replay order.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

// Timeline, logical file, segment: 8 upper-case hex digits each
#[allow(clippy::expect_used)]
static WAL_FILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-9A-F]{8})([0-9A-F]{8})([0-9A-F]{8})$")
        .expect("constant regex pattern is valid")
});

/// Errors from parsing WAL segment names
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SegmentError {
    #[error("invalid WAL file name format: {name:?}")]
    InvalidFormat { name: String },
    #[error("invalid {field} in WAL file name {name:?}")]
    InvalidField { name: String, field: &'static str },
}

impl SegmentError {
    /// The input that failed to parse
    pub fn input(&self) -> &str {
        match self {
            SegmentError::InvalidFormat { name } | SegmentError::InvalidField { name, .. } => name,
        }
    }
}

/// PostgreSQL timeline (fork generation counter)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timeline(pub u32);

impl Timeline {
    /// Timeline of a freshly initialized cluster
    pub const FIRST: Timeline = Timeline(1);

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Display for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Timeline {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Numeric identity of a WAL segment.
///
/// Field order matters: the derived `Ord` compares timeline, then logical
/// file, then segment, which is the order segments must be replayed in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SegmentKey {
    pub timeline: Timeline,
    pub logical_id: u64,
    pub segment_id: u64,
}

impl SegmentKey {
    pub fn new(timeline: u32, logical_id: u64, segment_id: u64) -> Self {
        Self {
            timeline: Timeline(timeline),
            logical_id,
            segment_id,
        }
    }

    /// Parse a WAL file name such as `000000010000000000000001`
    pub fn parse(name: &str) -> Result<Self, SegmentError> {
        let caps = WAL_FILE_PATTERN
            .captures(name)
            .ok_or_else(|| SegmentError::InvalidFormat {
                name: name.to_string(),
            })?;

        let field = |idx: usize, label: &'static str| -> Result<u64, SegmentError> {
            let group = caps.get(idx).map(|m| m.as_str()).unwrap_or_default();
            u64::from_str_radix(group, 16).map_err(|_| SegmentError::InvalidField {
                name: name.to_string(),
                field: label,
            })
        };

        let timeline = u32::try_from(field(1, "timeline")?).map_err(|_| {
            SegmentError::InvalidField {
                name: name.to_string(),
                field: "timeline",
            }
        })?;

        Ok(Self {
            timeline: Timeline(timeline),
            logical_id: field(2, "logical id")?,
            segment_id: field(3, "segment id")?,
        })
    }

    /// Canonical file name. Each group is at least 8 hex digits, so keys
    /// whose logical or segment id exceed `u32::MAX` do not round-trip.
    pub fn file_name(&self) -> String {
        format!(
            "{:08X}{:08X}{:08X}",
            self.timeline.0, self.logical_id, self.segment_id
        )
    }

    /// Replay-order comparison
    pub fn is_before(&self, other: &SegmentKey) -> bool {
        self < other
    }
}

impl fmt::Display for SegmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

impl std::str::FromStr for SegmentKey {
    type Err = SegmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A WAL segment with the metadata known about it so far.
///
/// Built by parsing a name; `backup_id` and `archived_at` are filled in
/// only once a snapshot holding the segment has been found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub key: SegmentKey,
    /// Original filesystem path (not persisted)
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
    /// Snapshot holding this segment
    pub backup_id: Option<String>,
    pub archived_at: Option<DateTime<Utc>>,
}

impl Segment {
    pub fn new(key: SegmentKey) -> Self {
        Self {
            key,
            source_path: None,
            backup_id: None,
            archived_at: None,
        }
    }

    pub fn parse(name: &str) -> Result<Self, SegmentError> {
        SegmentKey::parse(name).map(Self::new)
    }

    /// Parse the base file name of `path`, remembering the path
    pub fn from_path(path: &Path) -> Result<Self, SegmentError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if name.is_empty() {
            return Err(SegmentError::InvalidFormat {
                name: path.display().to_string(),
            });
        }
        let mut segment = Self::parse(&name)?;
        segment.source_path = Some(path.to_path_buf());
        Ok(segment)
    }

    pub fn with_snapshot(mut self, backup_id: impl Into<String>, archived_at: DateTime<Utc>) -> Self {
        self.backup_id = Some(backup_id.into());
        self.archived_at = Some(archived_at);
        self
    }

    pub fn timeline(&self) -> Timeline {
        self.key.timeline
    }

    pub fn file_name(&self) -> String {
        self.key.file_name()
    }

    pub fn is_before(&self, other: &Segment) -> bool {
        self.key.is_before(&other.key)
    }
}

/// Sort segments into replay order
pub fn sort_for_replay(segments: &mut [Segment]) {
    segments.sort_by_key(|s| s.key);
}

#[cfg(test)]
#[path = "segment_tests.rs"]
mod tests;
