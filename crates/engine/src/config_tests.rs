// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;
use std::io::Write;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

#[test]
fn parses_full_file() {
    let config = StashConfig::parse(
        r#"
[repository]
repository = "s3:https://minio:9000/pg"
password = "hunter2"
s3_endpoint = "https://minio:9000"

[operations]
timeout = "10m"
listing_order = "store_order"
exclusive_backups = true

[retention]
wal_max_age = "7days"

[server]
listen = "127.0.0.1:9000"
json_logs = true
"#,
        Path::new("pgstash.toml"),
    )
    .unwrap();

    assert_eq!(config.repository.repository, "s3:https://minio:9000/pg");
    assert_eq!(config.repository.s3_endpoint.as_deref(), Some("https://minio:9000"));
    assert_eq!(config.operations.timeout, Some(Duration::from_secs(600)));
    assert_eq!(config.operations.listing_order, ListingOrder::StoreOrder);
    assert!(config.operations.exclusive_backups);
    assert_eq!(config.retention.wal_max_age, Some(Duration::from_secs(7 * 24 * 3600)));
    assert_eq!(config.server.listen, "127.0.0.1:9000");
    assert!(config.server.json_logs);
}

#[test]
fn empty_file_uses_defaults() {
    let config = StashConfig::parse("", Path::new("pgstash.toml")).unwrap();
    assert_eq!(config, StashConfig::default());
    assert_eq!(config.server.listen, "0.0.0.0:8080");
    assert_eq!(config.operations.listing_order, ListingOrder::NewestFirst);
    assert_eq!(config.operations.timeout, None);
}

#[test]
fn unparsable_file_names_the_path() {
    let err = StashConfig::parse("[operations]\ntimeout = \"soon\"", Path::new("/etc/pgstash.toml"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("/etc/pgstash.toml"));
}

#[test]
fn environment_overrides_file() {
    let mut config = StashConfig::default();
    config.repository.repository = "/from/file".to_string();

    config
        .apply_env(env(&[
            ("RESTIC_REPOSITORY", "s3:https://s3.example.com/bucket"),
            ("RESTIC_PASSWORD", "secret"),
            ("S3_ENDPOINT", "https://s3.example.com"),
            ("S3_ACCESS_KEY", "AKIA"),
            ("S3_SECRET_KEY", "shh"),
            ("PGSTASH_LISTEN", "[::]:8081"),
            ("PGSTASH_TIMEOUT", "30s"),
        ]))
        .unwrap();

    assert_eq!(config.repository.repository, "s3:https://s3.example.com/bucket");
    assert_eq!(config.repository.password, "secret");
    assert_eq!(config.repository.s3_endpoint.as_deref(), Some("https://s3.example.com"));
    assert_eq!(config.repository.s3_access_key.as_deref(), Some("AKIA"));
    assert_eq!(config.repository.s3_secret_key.as_deref(), Some("shh"));
    assert_eq!(config.server.listen, "[::]:8081");
    assert_eq!(config.operations.timeout, Some(Duration::from_secs(30)));
}

#[test]
fn empty_environment_values_are_ignored() {
    let mut config = StashConfig::default();
    config.repository.repository = "/from/file".to_string();

    config.apply_env(env(&[("RESTIC_REPOSITORY", "")])).unwrap();
    assert_eq!(config.repository.repository, "/from/file");
}

#[test]
fn bad_timeout_in_environment_is_rejected() {
    let err = StashConfig::default()
        .apply_env(env(&[("PGSTASH_TIMEOUT", "forever")]))
        .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { key: "PGSTASH_TIMEOUT", .. }));
}

#[test]
fn validate_requires_repository_and_password() {
    let mut config = StashConfig::default();
    assert!(matches!(config.validate(), Err(ConfigError::Missing("RESTIC_REPOSITORY"))));

    config.repository.repository = "/srv/restic".to_string();
    assert!(matches!(config.validate(), Err(ConfigError::Missing("RESTIC_PASSWORD"))));

    config.repository.password = "pw".to_string();
    assert!(config.validate().is_ok());

    config.operations.timeout = Some(Duration::ZERO);
    assert!(config.validate().is_err());
}

#[test]
fn load_reads_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server]\nlisten = \"127.0.0.1:7000\"").unwrap();

    let config = StashConfig::load(Some(file.path())).unwrap();
    // PGSTASH_LISTEN may be set in the test environment
    if std::env::var("PGSTASH_LISTEN").is_err() {
        assert_eq!(config.server.listen, "127.0.0.1:7000");
    }
}

#[test]
fn load_missing_file_is_read_error() {
    let err = StashConfig::load(Some(Path::new("/nonexistent/pgstash.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}
