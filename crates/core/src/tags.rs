// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot tags
//!
//! Tags are the only metadata the snapshot store keeps. On the wire they are
//! plain strings (`type:wal`, `timeline:3`, ...); inside the crate they are
//! parsed into [`Tag`] as soon as they cross the store boundary.

use crate::segment::{SegmentKey, Timeline};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;

/// What a snapshot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SnapshotKind {
    /// Full copy of the data directory
    Full,
    /// A single WAL segment
    Wal,
}

impl SnapshotKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SnapshotKind::Full => "full",
            SnapshotKind::Wal => "wal",
        }
    }
}

impl fmt::Display for SnapshotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single parsed tag
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tag {
    Kind(SnapshotKind),
    Timeline(Timeline),
    LogicalId(u64),
    SegmentId(u64),
    WalFile(String),
    /// Anything this crate does not interpret
    Other(String),
}

impl Tag {
    /// Parse a wire tag. Never fails: unknown or malformed tags are kept as
    /// [`Tag::Other`] so they still take part in matching.
    pub fn parse(raw: &str) -> Tag {
        let Some((key, value)) = raw.split_once(':') else {
            return Tag::Other(raw.to_string());
        };

        let parsed = match key {
            "type" => match value {
                "full" => Some(Tag::Kind(SnapshotKind::Full)),
                "wal" => Some(Tag::Kind(SnapshotKind::Wal)),
                _ => None,
            },
            "timeline" => value.parse().ok().map(|t| Tag::Timeline(Timeline(t))),
            "logical_id" => value.parse().ok().map(Tag::LogicalId),
            "segment_id" => value.parse().ok().map(Tag::SegmentId),
            "wal_file" if !value.is_empty() => Some(Tag::WalFile(value.to_string())),
            _ => None,
        };

        parsed.unwrap_or_else(|| Tag::Other(raw.to_string()))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Kind(kind) => write!(f, "type:{}", kind),
            Tag::Timeline(t) => write!(f, "timeline:{}", t),
            Tag::LogicalId(id) => write!(f, "logical_id:{}", id),
            Tag::SegmentId(id) => write!(f, "segment_id:{}", id),
            Tag::WalFile(name) => write!(f, "wal_file:{}", name),
            Tag::Other(raw) => f.write_str(raw),
        }
    }
}

impl From<&str> for Tag {
    fn from(raw: &str) -> Self {
        Tag::parse(raw)
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Tag {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Tag::parse(&raw))
    }
}

/// Tags for a full backup taken on `timeline`
pub fn full_backup_tags(timeline: Timeline) -> Vec<Tag> {
    vec![Tag::Kind(SnapshotKind::Full), Tag::Timeline(timeline)]
}

/// Tags for an archived WAL segment
pub fn wal_segment_tags(key: &SegmentKey) -> Vec<Tag> {
    vec![
        Tag::Kind(SnapshotKind::Wal),
        Tag::Timeline(key.timeline),
        Tag::LogicalId(key.logical_id),
        Tag::SegmentId(key.segment_id),
        Tag::WalFile(key.file_name()),
    ]
}

/// Query matching every archived WAL segment
pub fn wal_query() -> Vec<Tag> {
    vec![Tag::Kind(SnapshotKind::Wal)]
}

/// Query matching every full backup
pub fn full_backup_query() -> Vec<Tag> {
    vec![Tag::Kind(SnapshotKind::Full)]
}

/// Query matching the snapshots of one WAL file
pub fn wal_file_query(name: &str) -> Vec<Tag> {
    vec![Tag::Kind(SnapshotKind::Wal), Tag::WalFile(name.to_string())]
}

/// Render tags in wire form
pub fn to_wire(tags: &[Tag]) -> Vec<String> {
    tags.iter().map(Tag::to_string).collect()
}

/// The tag set of one snapshot, treated as a set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotTags {
    tags: BTreeSet<Tag>,
}

impl SnapshotTags {
    pub fn new(tags: impl IntoIterator<Item = Tag>) -> Self {
        Self {
            tags: tags.into_iter().collect(),
        }
    }

    /// Parse wire strings
    pub fn from_wire<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(raw.into_iter().map(|t| Tag::parse(t.as_ref())))
    }

    pub fn to_wire(&self) -> Vec<String> {
        self.tags.iter().map(Tag::to_string).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn contains(&self, tag: &Tag) -> bool {
        self.tags.contains(tag)
    }

    /// AND-match: every query tag is present
    pub fn contains_all(&self, query: &[Tag]) -> bool {
        query.iter().all(|t| self.tags.contains(t))
    }

    pub fn kind(&self) -> Option<SnapshotKind> {
        self.tags.iter().find_map(|t| match t {
            Tag::Kind(kind) => Some(*kind),
            _ => None,
        })
    }

    pub fn timeline(&self) -> Option<Timeline> {
        self.tags.iter().find_map(|t| match t {
            Tag::Timeline(timeline) => Some(*timeline),
            _ => None,
        })
    }

    pub fn wal_file(&self) -> Option<&str> {
        self.tags.iter().find_map(|t| match t {
            Tag::WalFile(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// The WAL segment this snapshot holds: the `wal_file` value when it is
    /// a valid name, otherwise any bare tag that is a WAL file name.
    pub fn wal_segment(&self) -> Option<SegmentKey> {
        if let Some(key) = self.wal_file().and_then(|n| SegmentKey::parse(n).ok()) {
            return Some(key);
        }
        self.tags.iter().find_map(|t| match t {
            Tag::Other(raw) => SegmentKey::parse(raw).ok(),
            _ => None,
        })
    }
}

impl FromIterator<Tag> for SnapshotTags {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[cfg(test)]
#[path = "tags_tests.rs"]
mod tests;
