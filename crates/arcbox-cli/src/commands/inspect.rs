//! Inspect command implementation.

use anyhow::{Context, Result};
use arcbox_container::ContainerManager;
use clap::Args;

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Container names, IDs or link paths (`app/alias`)
    #[arg(required = true)]
    pub containers: Vec<String>,
}

/// Executes the inspect command.
pub fn execute(args: InspectArgs, manager: &ContainerManager) -> Result<()> {
    let views = args
        .containers
        .iter()
        .map(|name| manager.inspect(&super::resolve_target(manager, name)))
        .collect::<Result<Vec<_>, _>>()?;

    let json = serde_json::to_string_pretty(&views).context("failed to encode inspect output")?;
    println!("{json}");
    Ok(())
}
