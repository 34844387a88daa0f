// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting for CLI commands

use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use pgstash_core::Segment;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// One archived segment as listed by `wal-list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentRow {
    pub wal_file: String,
    pub timeline: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
}

impl From<&Segment> for SegmentRow {
    fn from(segment: &Segment) -> Self {
        Self {
            wal_file: segment.file_name(),
            timeline: segment.timeline().get(),
            snapshot_id: segment.backup_id.clone(),
            archived_at: segment.archived_at,
        }
    }
}

impl fmt::Display for SegmentRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  tl {:<3} {:<10} ",
            self.wal_file,
            self.timeline,
            self.snapshot_id.as_deref().unwrap_or("-")
        )?;
        match self.archived_at {
            Some(at) => write!(f, "{}", at.format("%Y-%m-%d %H:%M:%S")),
            None => write!(f, "-"),
        }
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + fmt::Display>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Text => {
            for item in items {
                println!("{}", item);
            }
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(items) {
                println!("{}", json);
            }
        }
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
