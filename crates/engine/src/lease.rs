// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process leases for exclusive backup and archive work
//!
//! A lease is held per (operation, timeline) and released when the
//! [`Lease`] guard drops. There is no waiting: a second caller gets
//! `None` and reports busy.

use pgstash_core::Timeline;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Work that can be made exclusive per timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Backup,
    Archive,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Backup => write!(f, "backup"),
            OperationKind::Archive => write!(f, "WAL archive"),
        }
    }
}

type LeaseKey = (OperationKind, Timeline);

/// Shared table of held leases
#[derive(Debug, Clone, Default)]
pub struct LeaseTable {
    held: Arc<Mutex<HashSet<LeaseKey>>>,
}

impl LeaseTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashSet<LeaseKey>> {
        self.held.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Take the lease, or `None` if someone already holds it
    pub fn try_acquire(&self, operation: OperationKind, timeline: Timeline) -> Option<Lease> {
        if !self.lock().insert((operation, timeline)) {
            return None;
        }
        Some(Lease {
            table: self.clone(),
            key: (operation, timeline),
        })
    }

    pub fn is_held(&self, operation: OperationKind, timeline: Timeline) -> bool {
        self.lock().contains(&(operation, timeline))
    }
}

/// Guard for a held lease
#[derive(Debug)]
pub struct Lease {
    table: LeaseTable,
    key: LeaseKey,
}

impl Lease {
    pub fn timeline(&self) -> Timeline {
        self.key.1
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        self.table.lock().remove(&self.key);
    }
}

#[cfg(test)]
#[path = "lease_tests.rs"]
mod tests;
