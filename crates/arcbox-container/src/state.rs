//! Container state as seen by the naming subsystem.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Container identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a new random container ID (64 hex characters).
    #[must_use]
    pub fn new() -> Self {
        Self(format!(
            "{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        ))
    }

    /// Creates a container ID from a string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Returns the ID as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the 12 character short form used in logs and tables.
    #[must_use]
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl Default for ContainerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Container state.
///
/// Owned by the runtime; the naming subsystem only observes transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    /// Container created but not started.
    Created,
    /// Container is running.
    Running,
    /// Container is paused.
    Paused,
    /// Container is restarting.
    Restarting,
    /// Container has exited.
    Exited,
    /// Container is being removed.
    Removing,
    /// Container is dead (error state).
    Dead,
}

impl ContainerState {
    /// Returns whether a process is attached to the container, which is
    /// what makes it visible to service discovery.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Paused | Self::Restarting)
    }
}

impl std::fmt::Display for ContainerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Restarting => write!(f, "restarting"),
            Self::Exited => write!(f, "exited"),
            Self::Removing => write!(f, "removing"),
            Self::Dead => write!(f, "dead"),
        }
    }
}

/// Container information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    /// Container ID.
    pub id: ContainerId,
    /// Current name, without the leading `/`.
    pub name: String,
    /// Whether `name` was generated by the daemon.
    #[serde(default)]
    pub generated_name: bool,
    /// Image name.
    pub image: String,
    /// Networks the container is attached to.
    #[serde(default)]
    pub networks: Vec<String>,
    /// Current state.
    pub state: ContainerState,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Start time (if started).
    pub started_at: Option<DateTime<Utc>>,
    /// Finish time (if exited).
    pub finished_at: Option<DateTime<Utc>>,
    /// Exit code (if exited).
    pub exit_code: Option<i32>,
}

impl Container {
    /// Creates a new container record in the `created` state.
    #[must_use]
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: ContainerId::new(),
            name: name.into(),
            generated_name: false,
            image: image.into(),
            networks: Vec::new(),
            state: ContainerState::Created,
            created: Utc::now(),
            started_at: None,
            finished_at: None,
            exit_code: None,
        }
    }

    /// Returns whether the container is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == ContainerState::Running
    }

    /// Returns the name as exposed by the API (`/name`).
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("/{}", self.name)
    }
}
