//! Create command implementation.

use anyhow::{Context, Result};
use arcbox_container::{ContainerConfig, ContainerManager};
use clap::Args;

/// Arguments for the create command.
#[derive(Args)]
pub struct CreateArgs {
    /// Image to create from
    pub image: String,

    /// Assign a name to the container
    #[arg(long)]
    pub name: Option<String>,

    /// Add link to another container (name:alias)
    #[arg(long = "link")]
    pub links: Vec<String>,

    /// Connect the container to a network
    #[arg(long = "network")]
    pub networks: Vec<String>,
}

impl From<CreateArgs> for ContainerConfig {
    fn from(args: CreateArgs) -> Self {
        Self {
            name: args.name,
            image: args.image,
            links: args.links,
            networks: args.networks,
        }
    }
}

/// Executes the create command.
pub fn execute(args: CreateArgs, manager: &ContainerManager) -> Result<()> {
    let image = args.image.clone();
    let id = manager
        .create(args.into())
        .with_context(|| format!("failed to create container from {image}"))?;

    println!("{id}");
    Ok(())
}
