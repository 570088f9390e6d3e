//! Container events.

use crate::state::{ContainerId, ContainerState};
use tokio::sync::broadcast;

/// Events published by the container manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Container created.
    Created { id: ContainerId, name: String },
    /// Container renamed. `dependents` are the containers whose rendered
    /// links changed as a result.
    Renamed {
        id: ContainerId,
        old_name: String,
        new_name: String,
        dependents: Vec<ContainerId>,
    },
    /// Container state changed.
    StateChanged {
        id: ContainerId,
        state: ContainerState,
    },
    /// A single link removed.
    LinkRemoved { source: ContainerId, alias: String },
    /// Container removed.
    Removed { id: ContainerId, name: String },
}

/// Event bus for container event distribution.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
}

impl EventBus {
    /// Creates a new event bus.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    /// Publishes an event.
    pub fn publish(&self, event: Event) {
        let _ = self.sender.send(event);
    }

    /// Subscribes to events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
