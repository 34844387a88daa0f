// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations
//!
//! Each command returns the text to print so it can be exercised against
//! an in-memory store.

pub mod backup;
pub mod cleanup;
pub mod wal;
