//! Rm (remove container) command implementation.

use anyhow::{bail, Result};
use arcbox_container::{ContainerManager, RemoveOptions};
use clap::Args;

/// Arguments for the rm command.
#[derive(Args)]
pub struct RmArgs {
    /// Container names or IDs
    #[arg(required = true)]
    pub containers: Vec<String>,

    /// Force removal of running containers
    #[arg(short, long)]
    pub force: bool,

    /// Remove the specified link
    #[arg(short, long)]
    pub link: bool,
}

/// Executes the rm command.
pub async fn execute(args: RmArgs, manager: &ContainerManager) -> Result<()> {
    let options = RemoveOptions {
        force: args.force,
        link: args.link,
    };

    let mut failed = 0;
    for container in &args.containers {
        let target = if args.link {
            container.clone()
        } else {
            super::resolve_target(manager, container)
        };
        match manager.remove(&target, options).await {
            Ok(()) => println!("{container}"),
            Err(e) => {
                eprintln!("Error response from daemon: {e}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("failed to remove {failed} container(s)");
    }
    Ok(())
}
