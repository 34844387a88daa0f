// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! pgstash daemon (pgstashd)
//!
//! Usage: `pgstashd [CONFIG]`. Settings come from the optional TOML file
//! and the environment (`RESTIC_REPOSITORY`, `RESTIC_PASSWORD`, ...).

use std::path::PathBuf;

use anyhow::Context;
use pgstash_core::OpContext;
use pgstash_daemon::{serve, AppState};
use pgstash_engine::config::ServerConfig;
use pgstash_engine::{ResticStash, StashConfig};
use tokio::net::TcpListener;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = StashConfig::load(config_path.as_deref())?;

    let _log_guard = setup_logging(&config.server)?;

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    info!(repository = %config.repository.repository, "Starting pgstashd");

    let stash = ResticStash::from_config(&config);
    let root = OpContext::background();
    stash
        .init_repository(&stash.context(&root))
        .await
        .context("failed to initialize repository")?;
    info!(
        timeout = ?stash.operations().timeout,
        exclusive_backups = stash.operations().exclusive_backups,
        "Repository ready"
    );

    let listener = TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("failed to listen on {}", config.server.listen))?;
    info!("Listening on {}", listener.local_addr()?);

    let state = AppState::new(stash, root.clone()).with_wal_max_age(config.retention.wal_max_age);
    serve(listener, state, async move {
        shutdown_signal().await;
        // Abort in-flight store calls so graceful shutdown does not wait on them
        root.cancel();
    })
    .await?;

    info!("Daemon stopped");
    Ok(())
}

async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!("Cannot install SIGTERM handler: {}", e);
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Cannot wait for SIGINT: {}", e);
            }
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        _ = tokio::signal::ctrl_c() => info!("Received SIGINT, shutting down..."),
    }
}

fn setup_logging(server: &ServerConfig) -> anyhow::Result<Option<WorkerGuard>> {
    use tracing_subscriber::fmt::writer::BoxMakeWriter;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let (writer, guard) = match &server.log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            if let Some(dir) = dir {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("failed to create {}", dir.display()))?;
            }
            let file_name = path
                .file_name()
                .with_context(|| format!("log file {} has no file name", path.display()))?;
            let appender = tracing_appender::rolling::never(
                dir.unwrap_or_else(|| std::path::Path::new(".")),
                file_name,
            );
            let (non_blocking, guard) = tracing_appender::non_blocking(appender);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = fmt::layer().with_writer(writer);

    if server.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init();
    } else {
        tracing_subscriber::registry().with(filter).with(layer).init();
    }

    Ok(guard)
}
