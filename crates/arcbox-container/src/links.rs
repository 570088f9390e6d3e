//! Legacy link graph.
//!
//! A link gives a container a local alias for another container. Edges are
//! keyed by container ID, so renaming either end never touches the graph;
//! the textual forms (`/db1:/app1/mysql`) are rendered from current names
//! whenever they are read.

use crate::{
    error::{ContainerError, Result},
    names::{normalize_name, NameRegistry},
    state::ContainerId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A directed link: `source` reaches `target` under `alias`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEdge {
    /// Linking container.
    pub source: ContainerId,
    /// Alias of the target inside the source.
    pub alias: String,
    /// Linked container.
    pub target: ContainerId,
}

/// A parsed `name[:alias]` link option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSpec {
    /// Target name or ID.
    pub target: String,
    /// Alias; defaults to the target name.
    pub alias: String,
}

/// Parses a `name[:alias]` link option.
///
/// A leading `/` on either part is ignored.
///
/// # Errors
///
/// Returns `InvalidLink` for empty parts or more than one `:`.
pub fn parse_link(spec: &str) -> Result<LinkSpec> {
    let mut parts = spec.split(':');
    let target = parts.next().map(normalize_name).unwrap_or_default();
    let alias = parts.next().map_or(target, normalize_name);

    if parts.next().is_some() || target.is_empty() || !is_valid_alias(alias) {
        return Err(ContainerError::InvalidLink(spec.to_string()));
    }

    Ok(LinkSpec {
        target: target.to_string(),
        alias: alias.to_string(),
    })
}

fn is_valid_alias(alias: &str) -> bool {
    !alias.is_empty() && !alias.contains(['/', ':'])
}

/// Link graph, edges grouped by source in creation order.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    edges: HashMap<ContainerId, Vec<LinkEdge>>,
}

impl LinkGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Links `source` to the container currently known as `target`.
    ///
    /// The target is resolved once, now; the edge follows that container
    /// through later renames.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the target does not resolve, `InvalidLink` for
    /// a bad alias or a self link, and `NameConflict` if `source` already
    /// uses `alias`.
    pub fn add_link(
        &mut self,
        registry: &NameRegistry,
        source: &ContainerId,
        target: &str,
        alias: &str,
    ) -> Result<ContainerId> {
        let alias = normalize_name(alias);
        if !is_valid_alias(alias) {
            return Err(ContainerError::InvalidLink(format!("{target}:{alias}")));
        }

        let target_id = registry.lookup(target)?;
        if &target_id == source {
            return Err(ContainerError::InvalidLink(format!(
                "{target}:{alias} (a container cannot link to itself)"
            )));
        }

        if let Some(existing) = self.find(source, alias) {
            let source_name = registry.name_of(source).unwrap_or(source.as_str());
            return Err(ContainerError::name_conflict(
                format!("{source_name}/{alias}"),
                &existing.target,
            ));
        }

        self.insert(LinkEdge {
            source: source.clone(),
            alias: alias.to_string(),
            target: target_id.clone(),
        });
        Ok(target_id)
    }

    /// Inserts an already resolved edge.
    pub fn insert(&mut self, edge: LinkEdge) {
        self.edges.entry(edge.source.clone()).or_default().push(edge);
    }

    /// Resolves `alias` within the links of `source`.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchLink` if there is no such alias, or if its target has
    /// been removed since the link was created.
    pub fn resolve_alias(
        &self,
        registry: &NameRegistry,
        source: &ContainerId,
        alias: &str,
    ) -> Result<ContainerId> {
        self.find(source, normalize_name(alias))
            .filter(|edge| registry.contains(&edge.target))
            .map(|edge| edge.target.clone())
            .ok_or_else(|| ContainerError::NoSuchLink {
                source_name: registry
                    .name_of(source)
                    .unwrap_or(source.as_str())
                    .to_string(),
                alias: normalize_name(alias).to_string(),
            })
    }

    /// Resolves a `name/alias[/alias...]` path to a container ID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` naming the full path if any segment fails.
    pub fn lookup_path(&self, registry: &NameRegistry, path: &str) -> Result<ContainerId> {
        let trimmed = normalize_name(path);
        let Some((head, rest)) = trimmed.split_once('/') else {
            return registry.lookup(path);
        };

        let mut current = registry
            .lookup(head)
            .map_err(|_| ContainerError::not_found(path))?;
        for alias in rest.split('/') {
            current = self
                .resolve_alias(registry, &current, alias)
                .map_err(|_| ContainerError::not_found(path))?;
        }
        Ok(current)
    }

    /// Returns the containers whose rendered links change when `id` is
    /// renamed: every source linking to `id`, and `id` itself if it links
    /// to anything.
    #[must_use]
    pub fn rewrite_on_rename(&self, id: &ContainerId) -> Vec<ContainerId> {
        let mut dependents: BTreeSet<ContainerId> =
            self.links_to(id).map(|edge| edge.source.clone()).collect();
        if !self.links_from(id).is_empty() {
            dependents.insert(id.clone());
        }
        dependents.into_iter().collect()
    }

    /// Renders the links of `source` as `/<target>:/<source>/<alias>`.
    ///
    /// Edges whose target is gone are skipped.
    #[must_use]
    pub fn host_mappings(&self, registry: &NameRegistry, source: &ContainerId) -> Vec<String> {
        let Some(source_name) = registry.name_of(source) else {
            return Vec::new();
        };

        self.links_from(source)
            .iter()
            .filter_map(|edge| {
                registry
                    .name_of(&edge.target)
                    .map(|target| format!("/{target}:/{source_name}/{}", edge.alias))
            })
            .collect()
    }

    /// Returns the links of `source`.
    #[must_use]
    pub fn links_from(&self, source: &ContainerId) -> &[LinkEdge] {
        self.edges.get(source).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the links pointing at `target`.
    pub fn links_to<'a>(&'a self, target: &'a ContainerId) -> impl Iterator<Item = &'a LinkEdge> {
        self.edges
            .values()
            .flatten()
            .filter(move |edge| &edge.target == target)
    }

    /// Removes all links of `source`, returning them.
    pub fn remove_links_from(&mut self, source: &ContainerId) -> Vec<LinkEdge> {
        self.edges.remove(source).unwrap_or_default()
    }

    /// Removes a single link of `source`.
    pub fn remove_link(&mut self, source: &ContainerId, alias: &str) -> Option<LinkEdge> {
        let alias = normalize_name(alias);
        let edges = self.edges.get_mut(source)?;
        let index = edges.iter().position(|edge| edge.alias == alias)?;
        let edge = edges.remove(index);
        if edges.is_empty() {
            self.edges.remove(source);
        }
        Some(edge)
    }

    /// Returns all edges, grouped by source in ID order.
    #[must_use]
    pub fn edges(&self) -> Vec<LinkEdge> {
        let mut sources: Vec<_> = self.edges.keys().collect();
        sources.sort();
        sources
            .into_iter()
            .flat_map(|source| self.links_from(source).iter().cloned())
            .collect()
    }

    fn find(&self, source: &ContainerId, alias: &str) -> Option<&LinkEdge> {
        self.links_from(source).iter().find(|edge| edge.alias == alias)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(names: &[&str]) -> (NameRegistry, LinkGraph, Vec<ContainerId>) {
        let mut registry = NameRegistry::new();
        let ids = names
            .iter()
            .map(|name| {
                let id = ContainerId::new();
                registry.reserve(name, &id).unwrap();
                id
            })
            .collect();
        (registry, LinkGraph::new(), ids)
    }

    #[test]
    fn test_parse_link() {
        assert_eq!(
            parse_link("db1:/mysql").unwrap(),
            LinkSpec {
                target: "db1".to_string(),
                alias: "mysql".to_string()
            }
        );
        assert_eq!(parse_link("/a0").unwrap().alias, "a0");
        assert!(parse_link("").is_err());
        assert!(parse_link("a:b:c").is_err());
        assert!(parse_link("db1:").is_err());
    }

    #[test]
    fn test_alias_follows_rename() {
        let (mut registry, mut graph, ids) = setup(&["db1", "app1"]);
        let (db, app) = (&ids[0], &ids[1]);

        graph.add_link(&registry, app, "db1", "mysql").unwrap();
        registry.rename("app1", "app2").unwrap();
        registry.rename("db1", "db2").unwrap();

        assert_eq!(graph.resolve_alias(&registry, app, "mysql").unwrap(), *db);
        assert_eq!(graph.lookup_path(&registry, "app2/mysql").unwrap(), *db);
        assert_eq!(
            graph.host_mappings(&registry, app),
            vec!["/db2:/app2/mysql".to_string()]
        );
    }

    #[test]
    fn test_removed_target_is_not_retargeted() {
        let (mut registry, mut graph, ids) = setup(&["a0", "b0"]);
        let (a, b) = (&ids[0], &ids[1]);

        graph.add_link(&registry, b, "a0", "a0").unwrap();
        registry.rename("a0", "a1").unwrap();
        let replacement = ContainerId::new();
        registry.reserve("a0", &replacement).unwrap();

        assert_eq!(graph.resolve_alias(&registry, b, "a0").unwrap(), *a);
        assert_eq!(graph.host_mappings(&registry, b), vec!["/a1:/b0/a0"]);

        registry.release(a);
        assert!(matches!(
            graph.resolve_alias(&registry, b, "a0"),
            Err(ContainerError::NoSuchLink { .. })
        ));
        assert!(graph.host_mappings(&registry, b).is_empty());
    }

    #[test]
    fn test_duplicate_alias_conflicts() {
        let (registry, mut graph, ids) = setup(&["db1", "db2", "app"]);

        graph.add_link(&registry, &ids[2], "db1", "db").unwrap();
        let err = graph.add_link(&registry, &ids[2], "db2", "db").unwrap_err();
        assert!(matches!(err, ContainerError::NameConflict { ref name, .. } if name == "app/db"));
        assert!(matches!(
            graph.add_link(&registry, &ids[2], "app", "me"),
            Err(ContainerError::InvalidLink(_))
        ));
        assert!(graph.add_link(&registry, &ids[2], "nope", "x").unwrap_err().is_not_found());
    }

    #[test]
    fn test_rewrite_on_rename_dependents() {
        let (registry, mut graph, ids) = setup(&["db", "web", "worker"]);
        let (db, web, worker) = (&ids[0], &ids[1], &ids[2]);

        graph.add_link(&registry, web, "db", "db").unwrap();
        graph.add_link(&registry, worker, "db", "database").unwrap();
        graph.add_link(&registry, worker, "web", "web").unwrap();

        let mut expected = vec![web.clone(), worker.clone()];
        expected.sort();
        assert_eq!(graph.rewrite_on_rename(db), expected);
        assert_eq!(graph.rewrite_on_rename(worker), vec![worker.clone()]);
        assert_eq!(graph.links_to(db).count(), 2);
    }

    #[test]
    fn test_remove_links() {
        let (registry, mut graph, ids) = setup(&["db", "web"]);

        graph.add_link(&registry, &ids[1], "db", "db").unwrap();
        graph.add_link(&registry, &ids[1], "db", "primary").unwrap();

        assert!(graph.remove_link(&ids[1], "/db").is_some());
        assert!(graph.remove_link(&ids[1], "db").is_none());
        assert_eq!(graph.remove_links_from(&ids[1]).len(), 1);
        assert!(graph.edges().is_empty());
    }
}
