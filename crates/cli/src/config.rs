// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config file lookup

use std::path::PathBuf;

/// An explicit `--config` wins; otherwise `<config_dir>/pgstash/config.toml`
/// when it exists. `None` means environment-only configuration.
pub fn resolve_path(explicit: Option<PathBuf>, config_dir: Option<PathBuf>) -> Option<PathBuf> {
    if explicit.is_some() {
        return explicit;
    }
    config_dir
        .map(|dir| dir.join("pgstash").join("config.toml"))
        .filter(|path| path.is_file())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
