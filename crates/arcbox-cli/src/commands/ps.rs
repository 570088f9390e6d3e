//! Ps (list containers) command implementation.

use anyhow::Result;
use arcbox_container::{Container, ContainerManager, ContainerState};
use clap::Args;

/// Arguments for the ps command.
#[derive(Args)]
pub struct PsArgs {
    /// Show all containers (including stopped)
    #[arg(short, long)]
    pub all: bool,

    /// Only show container IDs
    #[arg(short, long)]
    pub quiet: bool,
}

/// Executes the ps command.
pub fn execute(args: PsArgs, manager: &ContainerManager) -> Result<()> {
    let containers: Vec<Container> = manager
        .list()
        .into_iter()
        .filter(|c| args.all || c.is_running())
        .collect();

    if args.quiet {
        for container in &containers {
            println!("{}", container.id.short());
        }
        return Ok(());
    }

    println!(
        "{:<12}   {:<20} {:<20} {:<20}",
        "CONTAINER ID", "IMAGE", "STATUS", "NAMES"
    );
    for container in &containers {
        println!(
            "{:<12}   {:<20} {:<20} {:<20}",
            container.id.short(),
            truncate(&container.image, 20),
            status(container),
            container.name
        );
    }

    Ok(())
}

fn status(container: &Container) -> String {
    match container.state {
        ContainerState::Running => "Up".to_string(),
        ContainerState::Exited => format!("Exited ({})", container.exit_code.unwrap_or(0)),
        state => {
            let mut s = state.to_string();
            if let Some(first) = s.get_mut(..1) {
                first.make_ascii_uppercase();
            }
            s
        }
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max - 3).collect();
        out.push_str("...");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status() {
        let mut container = Container::new("web", "nginx");
        assert_eq!(status(&container), "Created");

        container.state = ContainerState::Exited;
        container.exit_code = Some(137);
        assert_eq!(status(&container), "Exited (137)");

        container.state = ContainerState::Running;
        assert_eq!(status(&container), "Up");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("alpine", 20), "alpine");
        assert_eq!(truncate("registry.example.com/team/app", 12), "registry....");
    }
}
