//! Error types for container naming and linking operations.

use thiserror::Error;

/// Result type alias for container operations.
pub type Result<T> = std::result::Result<T, ContainerError>;

/// Errors that can occur during container operations.
///
/// The messages of the user-facing variants are part of the API contract:
/// clients match on substrings such as `"No such container: "`.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Name does not match the permitted container name syntax.
    #[error("Invalid container name ({0}), only [a-zA-Z0-9][a-zA-Z0-9_.-] are allowed")]
    InvalidName(String),

    /// Name is already held by another live container.
    #[error(
        "Conflict. The container name \"/{name}\" is already in use by container \"{id}\". \
         You have to remove (or rename) that container to be able to reuse that name."
    )]
    NameConflict {
        /// Contested name, without the leading `/`.
        name: String,
        /// Container currently holding the name.
        id: String,
    },

    /// Rename to the container's current name.
    #[error("Renaming a container with the same name as its current name")]
    SameName,

    /// Container not found.
    #[error("No such container: {0}")]
    NotFound(String),

    /// Link alias not found for a container.
    #[error("No such link: /{source_name}/{alias}")]
    NoSuchLink {
        /// Name of the linking container.
        source_name: String,
        /// Alias looked up within its links.
        alias: String,
    },

    /// Malformed link specification.
    #[error("Invalid link specification: {0}")]
    InvalidLink(String),

    /// Invalid container state.
    #[error("invalid container state: {0}")]
    InvalidState(String),

    /// State store error.
    #[error("state store error: {0}")]
    Store(String),

    /// Runtime error.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ContainerError {
    /// Creates a new not found error.
    #[must_use]
    pub fn not_found(name_or_id: impl Into<String>) -> Self {
        Self::NotFound(name_or_id.into())
    }

    /// Creates a new invalid state error.
    #[must_use]
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Creates a new name conflict error.
    #[must_use]
    pub fn name_conflict(name: impl Into<String>, id: impl std::fmt::Display) -> Self {
        Self::NameConflict {
            name: name.into(),
            id: id.to_string(),
        }
    }

    pub(crate) fn lock_poisoned() -> Self {
        Self::Runtime("lock poisoned".to_string())
    }

    /// Returns true if this is a not found error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
