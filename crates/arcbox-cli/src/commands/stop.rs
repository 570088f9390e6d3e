//! Stop command implementation.

use anyhow::{Context, Result};
use arcbox_container::ContainerManager;
use clap::Args;

/// Arguments for the stop command.
#[derive(Args)]
pub struct StopArgs {
    /// Container names or IDs
    #[arg(required = true)]
    pub containers: Vec<String>,

    /// Exit code to record
    #[arg(long, default_value = "0")]
    pub exit_code: i32,
}

/// Executes the stop command.
pub async fn execute(args: StopArgs, manager: &ContainerManager) -> Result<()> {
    for container in &args.containers {
        let id = manager.resolve(container)?;
        let running = manager.get(&id).is_some_and(|c| c.state.is_active());
        if running {
            manager
                .notify_exited(&id, args.exit_code)
                .await
                .with_context(|| format!("failed to stop container {container}"))?;
        }
        println!("{container}");
    }
    Ok(())
}
