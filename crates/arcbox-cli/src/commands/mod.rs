//! CLI command implementations.
//!
//! Every command opens the naming state under the configured data
//! directory, applies one operation and exits:
//!
//! - Naming operations (create, rename, rm)
//! - Queries (inspect, ps)
//! - Lifecycle reports (start, stop)

use crate::config::Config;
use anyhow::{Context, Result};
use arcbox_container::{ContainerManager, JsonFileStore};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

pub mod create;
pub mod inspect;
pub mod ps;
pub mod rename;
pub mod rm;
pub mod start;
pub mod stop;

/// ArcBox - container naming and links
#[derive(Parser)]
#[command(name = "arcbox")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Data directory (overrides the configuration)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Create a new container
    Create(create::CreateArgs),

    /// Rename a container
    Rename(rename::RenameArgs),

    /// Remove one or more containers
    Rm(rm::RmArgs),

    /// Display detailed information on one or more containers
    Inspect(inspect::InspectArgs),

    /// List containers
    Ps(ps::PsArgs),

    /// Mark one or more containers as started
    Start(start::StartArgs),

    /// Mark one or more containers as stopped
    Stop(stop::StopArgs),
}

/// Opens the container manager over the state under `config.data_dir`.
///
/// # Errors
///
/// Returns an error if the state directory cannot be created or the saved
/// state cannot be loaded.
pub fn open_manager(config: &Config) -> Result<ContainerManager> {
    let dir = config.containers_dir();
    let store = JsonFileStore::new(&dir)
        .with_context(|| format!("failed to open state directory {}", dir.display()))?;
    let manager = ContainerManager::open(Arc::new(store))
        .with_context(|| format!("failed to load naming state from {}", dir.display()))?;
    Ok(manager.with_name_prefix(config.naming.generated_prefix.clone()))
}

/// Expands a unique ID prefix typed by the operator into the full ID.
///
/// Anything that is not a known name, full ID or unique prefix (link
/// paths such as `app/db` included) is passed through unchanged, so the
/// naming operation reports its own error.
pub fn resolve_target(manager: &ContainerManager, name_or_id: &str) -> String {
    manager
        .resolve(name_or_id)
        .map_or_else(|_| name_or_id.to_string(), |id| id.to_string())
}
