// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration: a TOML file plus environment overrides
//!
//! ```toml
//! [repository]
//! repository = "s3:https://s3.example.com/pg-backups"
//! password = "..."
//!
//! [operations]
//! timeout = "10m"
//! listing_order = "newest_first"
//! exclusive_backups = true
//!
//! [retention]
//! wal_max_age = "7days"
//!
//! [server]
//! listen = "0.0.0.0:8080"
//! ```

use crate::timeline::ListingOrder;
use pgstash_adapters::ResticConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors from loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("invalid {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationsConfig {
    /// Deadline for each store call
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
    pub listing_order: ListingOrder,
    /// At most one backup and one WAL archive per timeline at a time.
    ///
    /// This also serializes archiving: a second segment archived on the
    /// same timeline while another is in flight fails with `Busy`, so
    /// PostgreSQL's parallel archiving is effectively disabled.
    pub exclusive_backups: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// WAL segments older than this are pruned by `cleanup` without arguments
    #[serde(with = "humantime_serde")]
    pub wal_max_age: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
    /// Log to this file instead of stderr
    pub log_file: Option<PathBuf>,
    pub json_logs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".to_string(),
            log_file: None,
            json_logs: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StashConfig {
    pub repository: ResticConfig,
    pub operations: OperationsConfig,
    pub retention: RetentionConfig,
    pub server: ServerConfig,
}

impl StashConfig {
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read `path` when given (defaults otherwise), then apply the
    /// process environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::parse(&content, path)?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Override settings from environment variables looked up with `var`.
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| var(key).filter(|v| !v.is_empty());

        if let Some(v) = lookup("RESTIC_REPOSITORY") {
            self.repository.repository = v;
        }
        if let Some(v) = lookup("RESTIC_PASSWORD") {
            self.repository.password = v;
        }
        if let Some(v) = lookup("RESTIC_BINARY") {
            self.repository.binary = PathBuf::from(v);
        }
        if let Some(v) = lookup("S3_ENDPOINT") {
            self.repository.s3_endpoint = Some(v);
        }
        if let Some(v) = lookup("S3_ACCESS_KEY") {
            self.repository.s3_access_key = Some(v);
        }
        if let Some(v) = lookup("S3_SECRET_KEY") {
            self.repository.s3_secret_key = Some(v);
        }
        if let Some(v) = lookup("PGSTASH_LISTEN") {
            self.server.listen = v;
        }
        if let Some(v) = lookup("PGSTASH_TIMEOUT") {
            let timeout = humantime::parse_duration(&v).map_err(|e| ConfigError::InvalidValue {
                key: "PGSTASH_TIMEOUT",
                message: e.to_string(),
            })?;
            self.operations.timeout = Some(timeout);
        }
        Ok(())
    }

    /// A repository and its password are required to do anything
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.repository.repository.trim().is_empty() {
            return Err(ConfigError::Missing("RESTIC_REPOSITORY"));
        }
        if self.repository.password.is_empty() {
            return Err(ConfigError::Missing("RESTIC_PASSWORD"));
        }
        if self.operations.timeout == Some(Duration::ZERO) {
            return Err(ConfigError::InvalidValue {
                key: "operations.timeout",
                message: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
