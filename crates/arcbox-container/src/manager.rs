//! Container manager.
//!
//! Owns the container records, the name registry and the link graph behind
//! a single lock, so every operation sees the three in agreement. Mutations
//! are persisted before the lock is released and undone if persisting
//! fails.

use crate::{
    config::{ContainerConfig, RemoveOptions},
    discovery::{is_discoverable_network, ServiceDiscovery},
    error::{ContainerError, Result},
    event::{Event, EventBus},
    inspect::ContainerInspect,
    links::{parse_link, LinkGraph},
    names::{normalize_name, NameRegistry},
    state::{Container, ContainerId, ContainerState},
    store::{MemoryStore, Snapshot, StateStore},
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Prefix of generated container names.
pub const DEFAULT_NAME_PREFIX: &str = "container";

/// Naming state guarded by the manager lock.
#[derive(Debug, Default)]
pub(crate) struct Inner {
    pub(crate) containers: HashMap<ContainerId, Container>,
    pub(crate) names: NameRegistry,
    pub(crate) links: LinkGraph,
}

impl Inner {
    /// Rebuilds the indices from a stored snapshot.
    ///
    /// Containers recorded as active are restored as exited: whatever ran
    /// them did not survive the restart.
    fn from_snapshot(snapshot: Snapshot) -> Result<Self> {
        let mut inner = Self::default();

        for mut container in snapshot.containers {
            inner
                .names
                .reserve(&container.name, &container.id)
                .map_err(|e| {
                    ContainerError::Store(format!("cannot restore container {}: {e}", container.id))
                })?;
            if container.state.is_active() {
                container.state = ContainerState::Exited;
                container.finished_at.get_or_insert_with(Utc::now);
            }
            inner.containers.insert(container.id.clone(), container);
        }

        for edge in snapshot.links {
            if inner.containers.contains_key(&edge.source) {
                inner.links.insert(edge);
            } else {
                warn!(source = %edge.source, alias = %edge.alias, "dropping link of unknown container");
            }
        }

        Ok(inner)
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        let mut containers: Vec<Container> = self.containers.values().cloned().collect();
        containers.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));
        Snapshot {
            containers,
            links: self.links.edges(),
        }
    }
}

/// Container manager.
///
/// Manages container names, legacy links and the service discovery
/// registrations that follow them.
pub struct ContainerManager {
    inner: RwLock<Inner>,
    /// Backend the naming state is persisted to.
    store: Arc<dyn StateStore>,
    /// Resolver notified of name changes, if any.
    discovery: Option<Arc<dyn ServiceDiscovery>>,
    /// Serializes discovery calls so the last one always carries the
    /// current name.
    discovery_lock: Mutex<()>,
    events: EventBus,
    /// Channel to notify waiters when container state changes.
    /// Sends (container_id, new_state).
    state_sender: broadcast::Sender<(ContainerId, ContainerState)>,
    name_prefix: String,
}

impl ContainerManager {
    /// Creates a manager backed by an in-memory store.
    #[must_use]
    pub fn new() -> Self {
        let (state_sender, _) = broadcast::channel(256);

        Self {
            inner: RwLock::new(Inner::default()),
            store: Arc::new(MemoryStore::new()),
            discovery: None,
            discovery_lock: Mutex::new(()),
            events: EventBus::new(),
            state_sender,
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
        }
    }

    /// Opens a manager over `store`, restoring any saved state.
    ///
    /// # Errors
    ///
    /// Returns an error if the saved state cannot be read or is
    /// inconsistent (for example, two containers holding one name).
    pub fn open(store: Arc<dyn StateStore>) -> Result<Self> {
        let inner = match store.load()? {
            Some(snapshot) => Inner::from_snapshot(snapshot)?,
            None => Inner::default(),
        };
        info!(containers = inner.containers.len(), "naming state restored");

        Ok(Self {
            inner: RwLock::new(inner),
            store,
            ..Self::new()
        })
    }

    /// Sets the service discovery backend.
    #[must_use]
    pub fn with_discovery(mut self, discovery: Arc<dyn ServiceDiscovery>) -> Self {
        self.discovery = Some(discovery);
        self
    }

    /// Sets the prefix of generated names.
    #[must_use]
    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    pub(crate) fn read(&self) -> Result<RwLockReadGuard<'_, Inner>> {
        self.inner.read().map_err(|_| ContainerError::lock_poisoned())
    }

    pub(crate) fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>> {
        self.inner.write().map_err(|_| ContainerError::lock_poisoned())
    }

    pub(crate) fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    pub(crate) fn events(&self) -> &EventBus {
        &self.events
    }

    /// Creates a new container.
    ///
    /// The name is reserved and the links are resolved by the names their
    /// targets hold right now.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is invalid or taken, a link is malformed
    /// or its target does not exist, or the state cannot be persisted.
    pub fn create(&self, config: ContainerConfig) -> Result<ContainerId> {
        let specs = config
            .links
            .iter()
            .map(|link| parse_link(link))
            .collect::<Result<Vec<_>>>()?;

        let mut container = Container::new(String::new(), config.image);
        container.networks = config.networks;
        let id = container.id.clone();

        let mut inner = self.write()?;

        container.name = match config.name.as_deref() {
            Some(name) if !name.is_empty() => inner.names.reserve(name, &id)?,
            _ => {
                container.generated_name = true;
                self.reserve_generated(&mut inner.names, &id)?
            }
        };

        let Inner { names, links, .. } = &mut *inner;
        for spec in &specs {
            if let Err(e) = links.add_link(names, &id, &spec.target, &spec.alias) {
                links.remove_links_from(&id);
                names.release(&id);
                return Err(e);
            }
        }

        let name = container.name.clone();
        inner.containers.insert(id.clone(), container);

        if let Err(e) = self.store.save(&inner.snapshot()) {
            inner.containers.remove(&id);
            inner.links.remove_links_from(&id);
            inner.names.release(&id);
            return Err(e);
        }
        drop(inner);

        info!(id = %id.short(), name = %name, links = specs.len(), "container created");
        self.events.publish(Event::Created {
            id: id.clone(),
            name,
        });
        Ok(id)
    }

    fn reserve_generated(&self, names: &mut NameRegistry, id: &ContainerId) -> Result<String> {
        loop {
            let suffix = Uuid::new_v4().simple().to_string();
            let candidate = format!("{}_{}", self.name_prefix, &suffix[..12]);
            match names.reserve(&candidate, id) {
                Err(ContainerError::NameConflict { .. }) => continue,
                other => return other,
            }
        }
    }

    /// Removes a container, or a single link when `options.link` is set.
    ///
    /// The name becomes available immediately. Links pointing at the
    /// removed container are kept and stop resolving.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is not found, is running and
    /// `force` is not set, or the state cannot be persisted.
    pub async fn remove(&self, name_or_id: &str, options: RemoveOptions) -> Result<()> {
        if options.link {
            return self.remove_link(name_or_id);
        }

        let removed = {
            let mut inner = self.write()?;
            let id = inner.names.lookup(name_or_id)?;
            let container = inner
                .containers
                .get(&id)
                .cloned()
                .ok_or_else(|| ContainerError::not_found(name_or_id))?;

            if container.state.is_active() && !options.force {
                return Err(ContainerError::invalid_state(format!(
                    "You cannot remove a running container {id}. \
                     Stop the container before attempting removal or force remove"
                )));
            }

            inner.containers.remove(&id);
            inner.names.release(&id);
            let edges = inner.links.remove_links_from(&id);

            if let Err(e) = self.store.save(&inner.snapshot()) {
                inner.names.restore(&container.name, &id);
                for edge in edges {
                    inner.links.insert(edge);
                }
                inner.containers.insert(id, container);
                return Err(e);
            }
            container
        };

        info!(id = %removed.id.short(), name = %removed.name, "container removed");
        if removed.state.is_active() {
            self.deregister(&removed.id, &removed.networks).await;
        }
        let _ = self
            .state_sender
            .send((removed.id.clone(), ContainerState::Removing));
        self.events.publish(Event::Removed {
            id: removed.id,
            name: removed.name,
        });
        Ok(())
    }

    /// Removes the link named by `path` (`/source/alias`).
    fn remove_link(&self, path: &str) -> Result<()> {
        let Some((source, alias)) = normalize_name(path).split_once('/') else {
            return Err(ContainerError::InvalidLink(format!(
                "{path}: cannot remove the default name of the container"
            )));
        };

        let mut inner = self.write()?;
        let id = inner.names.lookup(source)?;
        let previous = inner.links.links_from(&id).to_vec();

        if inner.links.remove_link(&id, alias).is_none() {
            return Err(ContainerError::NoSuchLink {
                source_name: normalize_name(source).to_string(),
                alias: alias.to_string(),
            });
        }

        if let Err(e) = self.store.save(&inner.snapshot()) {
            inner.links.remove_links_from(&id);
            for edge in previous {
                inner.links.insert(edge);
            }
            return Err(e);
        }
        drop(inner);

        info!(source = %id.short(), alias = %alias, "link removed");
        self.events.publish(Event::LinkRemoved {
            source: id,
            alias: alias.to_string(),
        });
        Ok(())
    }

    /// Inspects a container by ID, name or link path (`app/alias`).
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if nothing matches.
    pub fn inspect(&self, name_or_id: &str) -> Result<ContainerInspect> {
        let inner = self.read()?;
        let id = inner.links.lookup_path(&inner.names, name_or_id)?;
        let container = inner
            .containers
            .get(&id)
            .ok_or_else(|| ContainerError::not_found(name_or_id))?;

        Ok(ContainerInspect::new(
            container,
            inner.links.host_mappings(&inner.names, &id),
        ))
    }

    /// Resolves a full container ID or a name.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if nothing matches.
    pub fn lookup(&self, name_or_id: &str) -> Result<ContainerId> {
        self.read()?.names.lookup(name_or_id)
    }

    /// Resolves a full container ID, a name or a unique ID prefix.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if nothing matches or the prefix is ambiguous.
    pub fn resolve(&self, name_or_id: &str) -> Result<ContainerId> {
        self.read()?.names.resolve(name_or_id)
    }

    /// Resolves `alias` within the links of a container.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown source and `NoSuchLink` for an
    /// unknown alias or a removed target.
    pub fn resolve_alias(&self, source: &str, alias: &str) -> Result<ContainerId> {
        let inner = self.read()?;
        let source = inner.names.lookup(source)?;
        inner.links.resolve_alias(&inner.names, &source, alias)
    }

    /// Returns the rendered links of a container.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the container does not exist.
    pub fn links(&self, name_or_id: &str) -> Result<Vec<String>> {
        let inner = self.read()?;
        let id = inner.names.lookup(name_or_id)?;
        Ok(inner.links.host_mappings(&inner.names, &id))
    }

    /// Gets container information.
    #[must_use]
    pub fn get(&self, id: &ContainerId) -> Option<Container> {
        self.inner.read().ok()?.containers.get(id).cloned()
    }

    /// Lists all containers, oldest first.
    #[must_use]
    pub fn list(&self) -> Vec<Container> {
        self.inner
            .read()
            .map(|inner| inner.snapshot().containers)
            .unwrap_or_default()
    }

    /// Subscribes to container events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Records that the runtime started a container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is not found or the state cannot
    /// be persisted.
    pub async fn notify_started(&self, id: &ContainerId) -> Result<()> {
        self.transition(id, ContainerState::Running, None).await
    }

    /// Records that a container exited.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is not found or the state cannot
    /// be persisted.
    pub async fn notify_exited(&self, id: &ContainerId, exit_code: i32) -> Result<()> {
        self.transition(id, ContainerState::Exited, Some(exit_code))
            .await
    }

    /// Records any other state reported by the runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is not found or the state cannot
    /// be persisted.
    pub async fn notify_state(&self, id: &ContainerId, state: ContainerState) -> Result<()> {
        self.transition(id, state, None).await
    }

    async fn transition(
        &self,
        id: &ContainerId,
        state: ContainerState,
        exit_code: Option<i32>,
    ) -> Result<()> {
        let (previous, networks) = {
            let mut inner = self.write()?;
            let container = inner
                .containers
                .get_mut(id)
                .ok_or_else(|| ContainerError::not_found(id.to_string()))?;
            let before = container.clone();

            container.state = state;
            match state {
                ContainerState::Running => {
                    container.started_at = Some(Utc::now());
                    container.finished_at = None;
                    container.exit_code = None;
                }
                ContainerState::Exited | ContainerState::Dead => {
                    container.finished_at = Some(Utc::now());
                    container.exit_code = exit_code.or(container.exit_code);
                }
                _ => {}
            }

            if let Err(e) = self.store.save(&inner.snapshot()) {
                inner.containers.insert(id.clone(), before);
                return Err(e);
            }
            (before.state, before.networks)
        };

        debug!(id = %id.short(), from = %previous, to = %state, "container state changed");
        let _ = self.state_sender.send((id.clone(), state));
        self.events.publish(Event::StateChanged {
            id: id.clone(),
            state,
        });

        match (previous.is_active(), state.is_active()) {
            (false, true) => self.register(id).await,
            (true, false) => self.deregister(id, &networks).await,
            _ => {}
        }
        Ok(())
    }

    /// Waits for a container to reach one of `states`.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is not found, is removed while
    /// waiting, or `timeout` elapses.
    pub async fn wait_for_state(
        &self,
        id: &ContainerId,
        states: &[ContainerState],
        timeout: std::time::Duration,
    ) -> Result<ContainerState> {
        // Subscribe before checking to avoid missing a transition.
        let mut receiver = self.state_sender.subscribe();

        let current = self
            .get(id)
            .ok_or_else(|| ContainerError::not_found(id.to_string()))?
            .state;
        if states.contains(&current) {
            return Ok(current);
        }

        let wait_future = async {
            loop {
                match receiver.recv().await {
                    Ok((changed_id, new_state)) if &changed_id == id => {
                        if states.contains(&new_state) {
                            return Ok(new_state);
                        }
                        if new_state == ContainerState::Removing {
                            return Err(ContainerError::not_found(id.to_string()));
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        // Missed some messages, check current state.
                        match self.get(id) {
                            Some(container) if states.contains(&container.state) => {
                                return Ok(container.state);
                            }
                            Some(_) => {}
                            None => return Err(ContainerError::not_found(id.to_string())),
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(ContainerError::Runtime(
                            "state change channel closed".to_string(),
                        ));
                    }
                }
            }
        };

        tokio::time::timeout(timeout, wait_future)
            .await
            .unwrap_or_else(|_| {
                Err(ContainerError::Runtime(format!(
                    "timeout waiting for container {id} to reach {states:?}"
                )))
            })
    }

    /// Registers the container's current name on its discoverable networks.
    ///
    /// Best effort: failures are logged and otherwise ignored.
    pub(crate) async fn register(&self, id: &ContainerId) {
        let Some(discovery) = self.discovery.as_ref() else {
            return;
        };
        let _guard = self.discovery_lock.lock().await;

        // Read under the guard so a rename racing with this call is either
        // fully visible here or registers after us.
        let Some(container) = self.get(id) else {
            return;
        };
        if !container.state.is_active() || container.generated_name {
            return;
        }

        for network in container
            .networks
            .iter()
            .filter(|n| is_discoverable_network(n))
        {
            match discovery.register(id, &container.name, network).await {
                Ok(()) => debug!(id = %id.short(), name = %container.name, network = %network, "registered with service discovery"),
                Err(e) => warn!(id = %id.short(), name = %container.name, network = %network, error = %e, "service discovery registration failed"),
            }
        }
    }

    /// Removes the container's registrations, unless it became active again.
    pub(crate) async fn deregister(&self, id: &ContainerId, networks: &[String]) {
        let Some(discovery) = self.discovery.as_ref() else {
            return;
        };
        let _guard = self.discovery_lock.lock().await;

        if self.get(id).is_some_and(|c| c.state.is_active()) {
            return;
        }

        for network in networks.iter().filter(|n| is_discoverable_network(n)) {
            if let Err(e) = discovery.deregister(id, network).await {
                warn!(id = %id.short(), network = %network, error = %e, "service discovery deregistration failed");
            }
        }
    }
}

impl Default for ContainerManager {
    fn default() -> Self {
        Self::new()
    }
}
