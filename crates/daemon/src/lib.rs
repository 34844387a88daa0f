// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pgstash plugin server
//!
//! HTTP endpoints the database operator calls to take backups, archive
//! and restore WAL segments, and prune old segments.

pub mod protocol;
pub mod server;

pub use server::{router, serve, ApiError, AppState};
