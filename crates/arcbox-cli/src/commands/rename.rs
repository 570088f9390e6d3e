//! Rename command implementation.

use anyhow::{Context, Result};
use arcbox_container::ContainerManager;
use clap::Args;

/// Arguments for the rename command.
#[derive(Args)]
pub struct RenameArgs {
    /// Container ID or name
    pub container: String,

    /// New name
    pub new_name: String,
}

/// Executes the rename command.
pub async fn execute(args: RenameArgs, manager: &ContainerManager) -> Result<()> {
    let target = super::resolve_target(manager, &args.container);
    let outcome = manager
        .rename(&target, &args.new_name)
        .await
        .with_context(|| format!("failed to rename container {}", args.container))?;

    tracing::debug!(
        dependents = outcome.dependents.len(),
        "links rewritten for dependent containers"
    );
    Ok(())
}
