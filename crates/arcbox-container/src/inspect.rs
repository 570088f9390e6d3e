//! Docker-compatible inspect view.

use crate::{
    discovery::is_discoverable_network,
    state::{Container, ContainerState},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Container inspect response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerInspect {
    /// Container ID.
    pub id: String,
    /// Name with its leading `/`.
    pub name: String,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Runtime state.
    pub state: InspectState,
    /// Container configuration.
    pub config: InspectConfig,
    /// Host configuration.
    pub host_config: InspectHostConfig,
    /// Network settings.
    pub network_settings: InspectNetworkSettings,
}

/// State section of an inspect response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InspectState {
    /// State name (`running`, `exited`, ...).
    pub status: ContainerState,
    /// Whether the container is running.
    pub running: bool,
    /// Exit code of the last run.
    pub exit_code: i32,
    /// Last start time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// Last exit time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Config section of an inspect response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InspectConfig {
    /// Image name.
    pub image: String,
}

/// Host config section of an inspect response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InspectHostConfig {
    /// Legacy links as `/<target>:/<source>/<alias>`, in creation order.
    pub links: Vec<String>,
}

/// Network settings section of an inspect response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InspectNetworkSettings {
    /// Attached networks.
    pub networks: BTreeMap<String, EndpointSettings>,
}

/// Per-network endpoint settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EndpointSettings {
    /// Names the container answers to on this network. Empty while the
    /// container is not active or still carries a generated name.
    pub aliases: Vec<String>,
}

impl ContainerInspect {
    /// Builds the view for `container` with its rendered links.
    #[must_use]
    pub fn new(container: &Container, links: Vec<String>) -> Self {
        let networks = container
            .networks
            .iter()
            .map(|network| {
                let aliases = if container.state.is_active()
                    && is_discoverable_network(network)
                    && !container.generated_name
                {
                    vec![container.name.clone()]
                } else {
                    Vec::new()
                };
                (network.clone(), EndpointSettings { aliases })
            })
            .collect();

        Self {
            id: container.id.to_string(),
            name: container.display_name(),
            created: container.created,
            state: InspectState {
                status: container.state,
                running: container.is_running(),
                exit_code: container.exit_code.unwrap_or(0),
                started_at: container.started_at,
                finished_at: container.finished_at,
            },
            config: InspectConfig {
                image: container.image.clone(),
            },
            host_config: InspectHostConfig { links },
            network_settings: InspectNetworkSettings { networks },
        }
    }
}
