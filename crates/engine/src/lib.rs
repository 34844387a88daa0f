// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pgstash coordination engine
//!
//! Sequences backup, archive, restore and retention work against a
//! [`SnapshotStore`](pgstash_adapters::SnapshotStore). Each call is
//! single-attempt: failures are classified and returned, never retried.

mod archive;
mod backup;
pub mod config;
mod error;
mod lease;
mod restore;
mod retention;
mod stash;
mod timeline;

pub use archive::WalArchiver;
pub use backup::{BackupCoordinator, BackupReceipt};
pub use config::{ConfigError, StashConfig};
pub use error::EngineError;
pub use lease::{Lease, LeaseTable, OperationKind};
pub use restore::{RecoveryTarget, RestoreCoordinator};
pub use retention::RetentionSweeper;
pub use stash::{ResticStash, Stash};
pub use timeline::{ListingOrder, TimelineResolver};
