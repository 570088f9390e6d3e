//! Name registry.
//!
//! Bijective mapping between container IDs and their human-readable names.
//! Names are stored without the leading `/` that the API exposes.

use crate::{
    error::{ContainerError, Result},
    state::ContainerId,
};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// Characters a container name may consist of.
pub const VALID_NAME_CHARS: &str = "[a-zA-Z0-9][a-zA-Z0-9_.-]";

/// Minimum length of an ID prefix accepted by [`NameRegistry::resolve`].
const MIN_ID_PREFIX_LEN: usize = 3;

static NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^/?{VALID_NAME_CHARS}+$")).expect("container name pattern is valid")
});

/// Strips the optional leading `/` from a name.
#[must_use]
pub fn normalize_name(name: &str) -> &str {
    name.strip_prefix('/').unwrap_or(name)
}

/// Validates a container name and returns its normalized form.
///
/// # Errors
///
/// Returns [`ContainerError::InvalidName`] if the name contains characters
/// outside [`VALID_NAME_CHARS`], such as `:` or an inner `/`.
pub fn validate_name(name: &str) -> Result<&str> {
    if !NAME_PATTERN.is_match(name) {
        return Err(ContainerError::InvalidName(name.to_string()));
    }
    Ok(normalize_name(name))
}

/// A validated rename, ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    /// Container being renamed.
    pub id: ContainerId,
    /// Name held before the rename.
    pub old_name: String,
    /// Name held after the rename.
    pub new_name: String,
}

impl RenamePlan {
    /// Returns the plan that undoes this one.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            id: self.id.clone(),
            old_name: self.new_name.clone(),
            new_name: self.old_name.clone(),
        }
    }
}

/// Name registry.
///
/// Invariant: `by_name` and `by_id` are exact inverses of each other.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry {
    by_name: HashMap<String, ContainerId>,
    by_id: HashMap<ContainerId, String>,
}

impl NameRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves `desired` for `id` and returns the normalized name.
    ///
    /// Reserving the name an ID already holds is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` on a syntax violation, `NameConflict` if another
    /// container holds the name, and `InvalidState` if `id` already holds a
    /// different name.
    pub fn reserve(&mut self, desired: &str, id: &ContainerId) -> Result<String> {
        let name = validate_name(desired)?;

        if let Some(holder) = self.by_name.get(name) {
            if holder == id {
                return Ok(name.to_string());
            }
            return Err(ContainerError::name_conflict(name, holder));
        }
        if let Some(current) = self.by_id.get(id) {
            return Err(ContainerError::invalid_state(format!(
                "container {id} already holds name /{current}"
            )));
        }

        self.by_name.insert(name.to_string(), id.clone());
        self.by_id.insert(id.clone(), name.to_string());
        Ok(name.to_string())
    }

    /// Validates a rename without mutating the registry.
    ///
    /// Checks run in order: the container must exist, the new name must
    /// differ from the current one, must be syntactically valid, and must
    /// not be held by another container.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `SameName`, `InvalidName` or `NameConflict`.
    pub fn plan_rename(&self, name_or_id: &str, new_name: &str) -> Result<RenamePlan> {
        let id = self.lookup(name_or_id)?;
        let old_name = self
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| ContainerError::not_found(name_or_id))?;

        if normalize_name(new_name) == old_name {
            return Err(ContainerError::SameName);
        }

        let new_name = validate_name(new_name)?;
        if let Some(holder) = self.by_name.get(new_name) {
            return Err(ContainerError::name_conflict(new_name, holder));
        }

        Ok(RenamePlan {
            id,
            old_name,
            new_name: new_name.to_string(),
        })
    }

    /// Applies a plan produced by [`Self::plan_rename`] (or its reverse).
    pub fn commit(&mut self, plan: &RenamePlan) {
        if self.by_name.get(&plan.old_name) == Some(&plan.id) {
            self.by_name.remove(&plan.old_name);
        }
        self.by_name.insert(plan.new_name.clone(), plan.id.clone());
        self.by_id.insert(plan.id.clone(), plan.new_name.clone());
    }

    /// Validates and applies a rename in one step.
    ///
    /// # Errors
    ///
    /// See [`Self::plan_rename`].
    pub fn rename(&mut self, name_or_id: &str, new_name: &str) -> Result<RenamePlan> {
        let plan = self.plan_rename(name_or_id, new_name)?;
        self.commit(&plan);
        Ok(plan)
    }

    /// Releases the name held by `id`, making it available immediately.
    pub fn release(&mut self, id: &ContainerId) -> Option<String> {
        let name = self.by_id.remove(id)?;
        self.by_name.remove(&name);
        Some(name)
    }

    /// Puts back an entry removed by [`Self::release`] while the caller
    /// still holds exclusive access.
    pub(crate) fn restore(&mut self, name: &str, id: &ContainerId) {
        self.by_name.insert(name.to_string(), id.clone());
        self.by_id.insert(id.clone(), name.to_string());
    }

    /// Resolves a full ID or a name (with or without `/`) to a container ID.
    ///
    /// ID prefixes are not accepted: a name vacated by a rename must stop
    /// resolving even if it reads like the start of some ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if nothing matches.
    pub fn lookup(&self, name_or_id: &str) -> Result<ContainerId> {
        if name_or_id.is_empty() {
            return Err(ContainerError::not_found(name_or_id));
        }

        let id = ContainerId::from_string(name_or_id);
        if self.by_id.contains_key(&id) {
            return Ok(id);
        }

        self.by_name
            .get(normalize_name(name_or_id))
            .cloned()
            .ok_or_else(|| ContainerError::not_found(name_or_id))
    }

    /// Like [`Self::lookup`], but also accepts a unique ID prefix.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if nothing matches or the prefix is ambiguous.
    pub fn resolve(&self, name_or_id: &str) -> Result<ContainerId> {
        match self.lookup(name_or_id) {
            Err(e) if e.is_not_found() && name_or_id.len() >= MIN_ID_PREFIX_LEN => {
                let mut matches = self
                    .by_id
                    .keys()
                    .filter(|id| id.as_str().starts_with(name_or_id));
                match (matches.next(), matches.next()) {
                    (Some(id), None) => Ok(id.clone()),
                    _ => Err(e),
                }
            }
            other => other,
        }
    }

    /// Returns the ID holding `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ContainerId> {
        self.by_name.get(normalize_name(name))
    }

    /// Returns the current name of `id`.
    #[must_use]
    pub fn name_of(&self, id: &ContainerId) -> Option<&str> {
        self.by_id.get(id).map(String::as_str)
    }

    /// Returns whether `id` holds a name.
    #[must_use]
    pub fn contains(&self, id: &ContainerId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Returns the number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(names: &[&str]) -> (NameRegistry, Vec<ContainerId>) {
        let mut registry = NameRegistry::new();
        let ids = names
            .iter()
            .map(|name| {
                let id = ContainerId::new();
                registry.reserve(name, &id).unwrap();
                id
            })
            .collect();
        (registry, ids)
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("first_name").unwrap(), "first_name");
        assert_eq!(validate_name("/db1").unwrap(), "db1");
        assert_eq!(validate_name("a.b-c_1").unwrap(), "a.b-c_1");

        for bad in ["", "a", "new:invalid", "_lead", "app/mysql", "//x1", "sp ace"] {
            assert!(
                matches!(validate_name(bad), Err(ContainerError::InvalidName(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_reserve_conflict() {
        let (mut registry, ids) = registry_with(&["db1"]);
        let other = ContainerId::new();

        let err = registry.reserve("/db1", &other).unwrap_err();
        assert!(matches!(err, ContainerError::NameConflict { ref name, .. } if name == "db1"));
        assert_eq!(registry.reserve("db1", &ids[0]).unwrap(), "db1");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_rename_then_lookup() {
        let (mut registry, ids) = registry_with(&["old"]);

        let plan = registry.rename("old", "new").unwrap();
        assert_eq!(plan.old_name, "old");
        assert_eq!(plan.new_name, "new");
        assert_eq!(registry.lookup("new").unwrap(), ids[0]);
        assert!(registry.lookup("old").unwrap_err().is_not_found());
        assert_eq!(registry.name_of(&ids[0]), Some("new"));
    }

    #[test]
    fn test_rename_same_name_by_name_and_id() {
        let (mut registry, ids) = registry_with(&["old"]);

        assert!(matches!(
            registry.rename("old", "old"),
            Err(ContainerError::SameName)
        ));
        assert!(matches!(
            registry.rename(ids[0].as_str(), "/old"),
            Err(ContainerError::SameName)
        ));
        assert_eq!(registry.name_of(&ids[0]), Some("old"));
    }

    #[test]
    fn test_rename_check_order() {
        let (registry, _) = registry_with(&["a0", "a1"]);

        assert!(registry.plan_rename("missing", "x:y").unwrap_err().is_not_found());
        assert!(matches!(
            registry.plan_rename("a0", "new:invalid"),
            Err(ContainerError::InvalidName(_))
        ));
        assert!(matches!(
            registry.plan_rename("a0", "a1"),
            Err(ContainerError::NameConflict { .. })
        ));
    }

    #[test]
    fn test_reversed_plan_restores() {
        let (mut registry, ids) = registry_with(&["a0"]);

        let plan = registry.rename("a0", "a1").unwrap();
        registry.commit(&plan.reversed());
        assert_eq!(registry.lookup("a0").unwrap(), ids[0]);
        assert!(registry.get("a1").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_release_allows_reuse() {
        let (mut registry, ids) = registry_with(&["first_name"]);

        registry.rename("first_name", "second_name").unwrap();
        let fresh = ContainerId::new();
        registry.reserve("first_name", &fresh).unwrap();

        assert_eq!(registry.release(&ids[0]).as_deref(), Some("second_name"));
        assert!(!registry.contains(&ids[0]));
        assert_eq!(registry.lookup("first_name").unwrap(), fresh);
    }

    #[test]
    fn test_resolve_by_prefix() {
        let mut registry = NameRegistry::new();
        let a = ContainerId::from_string("abc111");
        let b = ContainerId::from_string("abc222");
        registry.reserve("one", &a).unwrap();
        registry.reserve("two", &b).unwrap();

        assert_eq!(registry.resolve("abc1").unwrap(), a);
        assert!(registry.resolve("abc").unwrap_err().is_not_found());
        assert!(registry.resolve("ab").unwrap_err().is_not_found());
        assert_eq!(registry.resolve("/two").unwrap(), b);
        assert!(registry.lookup("abc1").unwrap_err().is_not_found());
    }

    #[test]
    fn test_vacated_hex_name_stops_resolving() {
        let mut registry = NameRegistry::new();
        let id = ContainerId::from_string("cafe0123456789abcdef");
        registry.reserve("cafe", &id).unwrap();

        registry.rename("cafe", "bistro").unwrap();

        assert!(registry.lookup("cafe").unwrap_err().is_not_found());
        assert!(registry.get("cafe").is_none());
        assert_eq!(registry.lookup("bistro").unwrap(), id);
        assert!(matches!(
            registry.plan_rename("cafe", "brasserie"),
            Err(ContainerError::NotFound(_))
        ));

        let other = ContainerId::new();
        registry.reserve("cafe", &other).unwrap();
        assert_eq!(registry.lookup("cafe").unwrap(), other);
    }
}
