// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pgstash - PostgreSQL backups and WAL archival over restic

mod commands;
mod config;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{backup, cleanup, wal};
use pgstash_core::OpContext;
use pgstash_engine::{ResticStash, StashConfig};

#[derive(Parser)]
#[command(
    name = "pgstash",
    version,
    about = "pgstash - PostgreSQL backups and WAL archival over restic"
)]
struct Cli {
    /// Config file (default: the user config dir's pgstash/config.toml, if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the repository if it does not exist
    Init,
    /// Take a full backup of a data directory
    Backup(backup::BackupArgs),
    /// Restore a full backup
    Restore(backup::RestoreArgs),
    /// Archive one WAL segment
    WalArchive(wal::WalArchiveArgs),
    /// Restore one WAL segment
    WalRestore(wal::WalRestoreArgs),
    /// List archived WAL segments in replay order
    WalList(wal::WalListArgs),
    /// Print the current timeline
    Timeline,
    /// Delete old WAL segments
    Cleanup(cleanup::CleanupArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let config_path = config::resolve_path(cli.config, dirs::config_dir());
    let config = StashConfig::load(config_path.as_deref())?;
    config.validate()?;

    let stash = ResticStash::from_config(&config);
    let root = OpContext::background();
    spawn_interrupt_handler(root.clone());
    let ctx = stash.context(&root);

    match cli.command {
        Commands::Init => {
            stash.init_repository(&ctx).await?;
            println!("Repository ready");
        }
        Commands::Backup(args) => println!("{}", backup::backup(&stash, &ctx, args).await?),
        Commands::Restore(args) => println!("{}", backup::restore(&stash, &ctx, args).await?),
        Commands::WalArchive(args) => println!("{}", wal::archive(&stash, &ctx, args).await?),
        Commands::WalRestore(args) => println!("{}", wal::restore(&stash, &ctx, args).await?),
        Commands::WalList(args) => {
            let rows = wal::list(&stash, &ctx).await?;
            output::print_list(&rows, args.format);
        }
        Commands::Timeline => {
            let timeline = stash.timelines.current_timeline(&ctx).await?;
            println!("{timeline}");
        }
        Commands::Cleanup(args) => {
            println!("{}", cleanup::cleanup(&stash, &ctx, args, config.retention.wal_max_age).await?);
        }
    }

    Ok(())
}

/// Cancel in-flight store calls on Ctrl-C
fn spawn_interrupt_handler(root: OpContext) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling");
            root.cancel();
        }
    });
}

fn setup_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
