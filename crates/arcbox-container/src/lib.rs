//! # arcbox-container
//!
//! Container naming and legacy links for ArcBox.
//!
//! This crate keeps the identity side of containers consistent:
//!
//! - Unique, validated container names (explicit or generated)
//! - Atomic renames that never leave links or names half updated
//! - Legacy links stored by container ID and rendered from current names
//! - Service discovery notifications for user-defined networks
//! - Durable naming state across daemon restarts
//!
//! ## Architecture
//!
//! Process lifecycle is owned by the runtime, which reports state changes
//! to the [`ContainerManager`]. The manager owns the naming state behind a
//! single lock and tells the network resolver which name each running
//! container answers to.
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               arcbox-container              │
//! │  ┌─────────────────────────────────────┐    │
//! │  │          ContainerManager           │    │
//! │  │  - NameRegistry    - LinkGraph      │    │
//! │  │  - rename coordination              │    │
//! │  └─────────────────────────────────────┘    │
//! │          │                     │            │
//! │          ▼                     ▼            │
//! │   ┌─────────────┐     ┌──────────────────┐  │
//! │   │ StateStore  │     │ ServiceDiscovery │  │
//! │   └─────────────┘     └──────────────────┘  │
//! └─────────────────────────────────────────────┘
//! ```

#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod discovery;
pub mod error;
pub mod event;
pub mod inspect;
pub mod links;
pub mod manager;
pub mod names;
pub mod rename;
pub mod state;
pub mod store;

pub use config::{ContainerConfig, RemoveOptions};
pub use discovery::{EmbeddedResolver, ServiceDiscovery};
pub use error::{ContainerError, Result};
pub use event::{Event, EventBus};
pub use inspect::ContainerInspect;
pub use links::{LinkEdge, LinkGraph};
pub use manager::ContainerManager;
pub use names::NameRegistry;
pub use rename::RenameOutcome;
pub use state::{Container, ContainerId, ContainerState};
pub use store::{JsonFileStore, MemoryStore, Snapshot, StateStore};
