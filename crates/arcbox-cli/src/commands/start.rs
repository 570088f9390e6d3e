//! Start command implementation.
//!
//! Process execution is external to this tool: `start` records that the
//! runtime started the container, which registers its name with service
//! discovery.

use anyhow::{Context, Result};
use arcbox_container::ContainerManager;
use clap::Args;

/// Arguments for the start command.
#[derive(Args)]
pub struct StartArgs {
    /// Container names or IDs
    #[arg(required = true)]
    pub containers: Vec<String>,
}

/// Executes the start command.
pub async fn execute(args: StartArgs, manager: &ContainerManager) -> Result<()> {
    for container in &args.containers {
        let id = manager.resolve(container)?;
        manager
            .notify_started(&id)
            .await
            .with_context(|| format!("failed to start container {container}"))?;
        println!("{container}");
    }
    Ok(())
}
