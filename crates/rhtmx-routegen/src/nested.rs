//! Nested route tree
//!
//! Groups the index and layout files found at one logical path into a node,
//! and hangs each node under its nearest routable ancestor. Directories that
//! contain no index or layout file are skipped, so `blog/post/[slug]` becomes a
//! direct child of `blog` when `blog/post` has no route file of its own.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::NestedConfig;
use crate::entry::{RouteEntry, RouteFileKind};
use crate::path::hierarchy::{is_ancestor, PathHierarchy};
use crate::path::{join_patterns, PathToken};
use crate::specificity::{self, Specificity};

/// One node of the nested route tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedRouteEntry {
    pub name: String,
    pub index: Option<RouteEntry>,
    pub layout: Option<RouteEntry>,
    /// Tokens left after removing the ones consumed by the parent
    pub path_tokens: Vec<PathToken>,
    pub parent: Option<String>,
    pub children: Vec<NestedRouteEntry>,
}

impl NestedRouteEntry {
    /// Pattern relative to the parent node, e.g. `[slug]` compiles to `:slug`
    pub fn relative_pattern(&self) -> String {
        join_patterns(&self.path_tokens)
    }

    /// Finds a node by name in this subtree
    pub fn find(&self, name: &str) -> Option<&NestedRouteEntry> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(name))
    }

    /// This node followed by all of its descendants, depth first
    pub fn descendants(&self) -> Vec<&NestedRouteEntry> {
        std::iter::once(self)
            .chain(self.children.iter().flat_map(|child| child.descendants()))
            .collect()
    }
}

impl Specificity for NestedRouteEntry {
    fn specificity_name(&self) -> &str {
        &self.name
    }

    fn specificity_tokens(&self) -> &[PathToken] {
        &self.path_tokens
    }
}

/// Builds the nested route forest from a flat list of route files
///
/// The input is copied and sorted by specificity first; the caller's slice is
/// never reordered. Files that are neither index nor layout are ignored.
///
/// # Examples
///
/// ```
/// use rhtmx_routegen::{build_nested_routes, NestedConfig, RouteEntry, RouteFolder};
///
/// let page = |name: &str, file: &str| {
///     RouteEntry::new(RouteFolder::Pages, name, file, format!("pages/{name}/{file}")).unwrap()
/// };
/// let entries = vec![
///     page("about", "index.rsx"),
///     page("about", "layout.rsx"),
///     page("about/team", "index.rsx"),
/// ];
///
/// let tree = build_nested_routes(&entries, &NestedConfig::default());
/// assert_eq!(tree.len(), 1);
/// assert!(tree[0].index.is_some() && tree[0].layout.is_some());
/// assert_eq!(tree[0].children[0].name, "about/team");
/// assert_eq!(tree[0].children[0].parent.as_deref(), Some("about"));
/// ```
pub fn build_nested_routes(entries: &[RouteEntry], nested: &NestedConfig) -> Vec<NestedRouteEntry> {
    let routable: Vec<RouteEntry> = specificity::sorted(entries)
        .into_iter()
        .filter(|entry| entry.file_kind(nested) != RouteFileKind::Other)
        .collect();

    let roots = root_entries(&routable);
    build_level(&routable, &roots, None, 0, nested)
}

/// Entries with no other entry above them
fn root_entries(entries: &[RouteEntry]) -> Vec<&RouteEntry> {
    entries
        .iter()
        .filter(|entry| {
            !PathHierarchy::ancestors(&entry.name)
                .any(|ancestor| entries.iter().any(|other| other.name == ancestor))
        })
        .collect()
}

/// Entries below `parent` with no routable entry in between
///
/// A candidate is any entry under `parent`. It is a direct descendant unless
/// another candidate sits strictly between the two.
fn direct_descendants<'a>(entries: &'a [RouteEntry], parent: &str) -> Vec<&'a RouteEntry> {
    let candidates: Vec<&RouteEntry> = entries
        .iter()
        .filter(|entry| is_ancestor(parent, &entry.name))
        .collect();

    candidates
        .iter()
        .copied()
        .filter(|child| {
            !candidates
                .iter()
                .any(|intermediate| is_ancestor(&intermediate.name, &child.name))
        })
        .collect()
}

/// Builds one level of nodes, recursing into each node's direct descendants
fn build_level(
    entries: &[RouteEntry],
    level: &[&RouteEntry],
    parent: Option<&str>,
    consumed: usize,
    nested: &NestedConfig,
) -> Vec<NestedRouteEntry> {
    let mut names: Vec<&str> = Vec::new();
    for entry in level {
        if !names.contains(&entry.name.as_str()) {
            names.push(&entry.name);
        }
    }

    names
        .into_iter()
        .filter_map(|name| {
            let group: Vec<&RouteEntry> = level
                .iter()
                .copied()
                .filter(|entry| entry.name == name)
                .collect();

            let index = pick(&group, RouteFileKind::Index, nested);
            let layout = pick(&group, RouteFileKind::Layout, nested);

            let Some(representative) = index.or(layout) else {
                debug!(name = %name, "skipping route node without index or layout");
                return None;
            };

            let full = &representative.path_tokens;
            let path_tokens = full[consumed.min(full.len())..].to_vec();
            let children = build_level(
                entries,
                &direct_descendants(entries, name),
                Some(name),
                full.len(),
                nested,
            );

            Some(NestedRouteEntry {
                name: name.to_string(),
                index: index.cloned(),
                layout: layout.cloned(),
                path_tokens,
                parent: parent.map(str::to_string),
                children,
            })
        })
        .collect()
}

/// First entry of the given kind; later duplicates are reported and dropped
fn pick<'a>(
    group: &[&'a RouteEntry],
    kind: RouteFileKind,
    nested: &NestedConfig,
) -> Option<&'a RouteEntry> {
    let mut matching = group
        .iter()
        .copied()
        .filter(|entry| entry.file_kind(nested) == kind);

    let first = matching.next()?;
    for duplicate in matching {
        warn!(
            name = %first.name,
            kept = %first.file_fullpath.display(),
            ignored = %duplicate.file_fullpath.display(),
            "duplicate {:?} file for route",
            kind
        );
    }
    Some(first)
}
