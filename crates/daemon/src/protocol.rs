// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON payloads of the plugin endpoints
//!
//! Field names follow the operator's wire format (`backupID`, `dataFolder`,
//! ...). Required fields default to empty and are checked by the handlers,
//! so a missing field is a 400 with a message rather than a decode error.

use chrono::{DateTime, Utc};
use pgstash_engine::RecoveryTarget;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackupRequest {
    /// Operator-side identifier, logged only
    #[serde(rename = "backupID")]
    pub backup_id: String,
    pub data_folder: String,
    /// Unused: the repository is the destination
    pub destination_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RestoreRequest {
    #[serde(rename = "backupID")]
    pub backup_id: String,
    pub dest_folder: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recovery_target: Option<RecoveryTarget>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WalArchiveRequest {
    pub wal_file_name: String,
    pub wal_file_path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WalRestoreRequest {
    pub wal_file_name: String,
    pub dest_folder: String,
}

/// Exactly one of `before` or `older_than`; neither falls back to the
/// configured retention age
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CleanupRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<DateTime<Utc>>,
    /// humantime duration, e.g. `"7days"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub older_than: Option<String>,
}

/// Body of every response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    pub message: String,
    #[serde(default, rename = "backupID", skip_serializing_if = "Option::is_none")]
    pub backup_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<usize>,
}

impl Response {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_backup_id(mut self, backup_id: Option<String>) -> Self {
        self.backup_id = backup_id;
        self
    }

    pub fn with_timeline(mut self, timeline: u32) -> Self {
        self.timeline = Some(timeline);
        self
    }

    pub fn with_deleted(mut self, deleted: usize) -> Self {
        self.deleted = Some(deleted);
        self
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
