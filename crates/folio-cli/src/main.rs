//! folio command-line tool.
//!
//! Inspect and restructure the lists in a folio fact database.
//!
//! Usage:
//!   folio import notes.json
//!   folio tree <page>
//!   folio indent <page> <block>
//!   RUST_LOG=debug folio renumber <page> --depth 2

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use folio_store::SqliteFactStore;
use folio_types::EntityId;

use crate::commands::Restructure;
use crate::config::FolioConfig;

/// Inspect and restructure folio documents.
#[derive(Parser, Debug)]
#[command(name = "folio")]
#[command(about = "Inspect and restructure folio block lists")]
struct Args {
    /// RON config file (defaults to $XDG_CONFIG_HOME/folio/config.ron)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and mark it initialized
    Init,
    /// Load a JSON array of facts
    Import { file: PathBuf },
    /// Dump every fact as JSON
    Export,
    /// Print the block tree of a container
    Tree { container: EntityId },
    /// Recompute ordered-list numbers
    Renumber {
        container: EntityId,
        /// Depth to recompute (repeatable; default all)
        #[arg(long = "depth")]
        depths: Vec<u32>,
    },
    /// Nest a list item under the item before it
    Indent { container: EntityId, entity: EntityId },
    /// Move a list item one level up
    Outdent { container: EntityId, entity: EntityId },
    /// Take a block out of its list
    OutdentFull { container: EntityId, entity: EntityId },
    /// Delete blocks and their descendants
    Delete {
        container: EntityId,
        #[arg(required = true)]
        entities: Vec<EntityId>,
    },
    /// Set a list item's number; the rest of its run follows
    SetNumber {
        container: EntityId,
        entity: EntityId,
        #[arg(allow_negative_numbers = true)]
        number: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs to stderr; stdout carries command output
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = FolioConfig::discover(args.config.as_deref()).context("loading config")?;
    let db_path = config.database_path(args.db.as_deref());
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let store = SqliteFactStore::open(&db_path)
        .with_context(|| format!("opening {}", db_path.display()))?;
    tracing::debug!(db = %db_path.display(), "opened database");

    let numbering = &config.numbering;
    let mut out = std::io::stdout().lock();
    match args.command {
        Command::Init => commands::init(&store, &mut out).await,
        Command::Import { file } => commands::import(&store, &file, &mut out).await,
        Command::Export => commands::export(&store, &mut out).await,
        Command::Tree { container } => commands::tree(&store, container, &mut out).await,
        Command::Renumber { container, depths } => {
            commands::renumber(&store, numbering, container, &depths, &mut out).await
        }
        Command::Indent { container, entity } => {
            commands::restructure(&store, numbering, Restructure::Indent, container, entity, &mut out)
                .await
        }
        Command::Outdent { container, entity } => {
            commands::restructure(&store, numbering, Restructure::Outdent, container, entity, &mut out)
                .await
        }
        Command::OutdentFull { container, entity } => {
            commands::restructure(
                &store,
                numbering,
                Restructure::OutdentFull,
                container,
                entity,
                &mut out,
            )
            .await
        }
        Command::Delete { container, entities } => {
            commands::delete(&store, numbering, container, &entities, &mut out).await
        }
        Command::SetNumber {
            container,
            entity,
            number,
        } => commands::set_number(&store, numbering, container, entity, number, &mut out).await,
    }
}
