//! Service discovery notifications.
//!
//! Containers attached to user-defined networks are resolvable by name
//! from their peers. The resolver itself lives outside this crate; the
//! container manager only tells it which name a container currently holds.
//!
//! Registration happens on start and on rename of an active container.
//! Backends that bind names only when a container starts will keep
//! answering for the old name until the container is restarted; the
//! [`EmbeddedResolver`] re-binds immediately.

use crate::state::ContainerId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// Networks that provide no name resolution.
const NON_DISCOVERABLE_NETWORKS: &[&str] = &["bridge", "default", "host", "none"];

/// Returns whether containers on `network` are resolvable by name.
#[must_use]
pub fn is_discoverable_network(network: &str) -> bool {
    !NON_DISCOVERABLE_NETWORKS.contains(&network)
}

/// Trait for the in-network name resolver.
///
/// This trait abstracts the network service discovery backend, allowing
/// different implementations (embedded resolver, external DNS, mock for
/// testing).
#[async_trait]
pub trait ServiceDiscovery: Send + Sync {
    /// Makes `id` resolvable as `name` within `network`, replacing any name
    /// previously registered for it there.
    async fn register(
        &self,
        id: &ContainerId,
        name: &str,
        network: &str,
    ) -> std::result::Result<(), String>;

    /// Removes every name registered for `id` within `network`.
    async fn deregister(&self, id: &ContainerId, network: &str) -> std::result::Result<(), String>;
}

/// In-memory resolver keyed by network.
#[derive(Debug, Default)]
pub struct EmbeddedResolver {
    networks: RwLock<HashMap<String, HashMap<String, ContainerId>>>,
}

impl EmbeddedResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `name` within `network`.
    #[must_use]
    pub fn resolve(&self, network: &str, name: &str) -> Option<ContainerId> {
        self.networks.read().ok()?.get(network)?.get(name).cloned()
    }

    /// Returns the names registered for `id` within `network`.
    #[must_use]
    pub fn names_of(&self, network: &str, id: &ContainerId) -> Vec<String> {
        let Ok(networks) = self.networks.read() else {
            return Vec::new();
        };
        networks
            .get(network)
            .map(|names| {
                names
                    .iter()
                    .filter(|(_, holder)| *holder == id)
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl ServiceDiscovery for EmbeddedResolver {
    async fn register(
        &self,
        id: &ContainerId,
        name: &str,
        network: &str,
    ) -> std::result::Result<(), String> {
        let mut networks = self
            .networks
            .write()
            .map_err(|_| "resolver lock poisoned".to_string())?;
        let names = networks.entry(network.to_string()).or_default();
        names.retain(|_, holder| holder != id);
        names.insert(name.to_string(), id.clone());
        Ok(())
    }

    async fn deregister(&self, id: &ContainerId, network: &str) -> std::result::Result<(), String> {
        let mut networks = self
            .networks
            .write()
            .map_err(|_| "resolver lock poisoned".to_string())?;
        if let Some(names) = networks.get_mut(network) {
            names.retain(|_, holder| holder != id);
        }
        Ok(())
    }
}
