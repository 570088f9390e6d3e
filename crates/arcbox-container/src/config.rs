//! Container creation and removal options.

use serde::{Deserialize, Serialize};

/// Container configuration, as far as naming and linking are concerned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Container name. A name is generated when unset.
    pub name: Option<String>,
    /// Image name.
    pub image: String,
    /// Legacy links, each `name[:alias]`.
    pub links: Vec<String>,
    /// Networks to attach the container to.
    pub networks: Vec<String>,
}

impl ContainerConfig {
    /// Creates a configuration for the given image.
    #[must_use]
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Self::default()
        }
    }

    /// Sets the container name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a legacy link.
    #[must_use]
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.links.push(link.into());
        self
    }

    /// Attaches the container to a network.
    #[must_use]
    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.networks.push(network.into());
        self
    }
}

/// Options for removing a container.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RemoveOptions {
    /// Remove the container even if it is running.
    pub force: bool,
    /// Treat the target as a link path (`/source/alias`) and remove only
    /// that link.
    pub link: bool,
}
