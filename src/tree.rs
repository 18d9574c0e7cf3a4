//! Virtual folder hierarchy over flat secret identifiers.
//!
//! The tree is always rebuilt from the complete list a store returned; it is
//! never patched in place. When one identifier is both a leaf and the prefix
//! of another (`a` and `a/x`), the folder interpretation wins regardless of
//! input order and the ambiguous path is recorded in [`NamespaceTree::collisions`].

use std::collections::BTreeMap;

use crate::models::Secret;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceNode {
    pub name: String,
    pub full_path: String,
    pub is_folder: bool,
    /// Originating secret, set on leaves only.
    pub secret: Option<Secret>,
    pub children: BTreeMap<String, NamespaceNode>,
    pub depth: usize,
}

impl NamespaceNode {
    fn root() -> Self {
        Self {
            name: String::new(),
            full_path: String::new(),
            is_folder: true,
            secret: None,
            children: BTreeMap::new(),
            depth: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceTree {
    root: NamespaceNode,
    separator: String,
    collisions: Vec<String>,
}

impl Default for NamespaceTree {
    fn default() -> Self {
        Self {
            root: NamespaceNode::root(),
            separator: "/".to_string(),
            collisions: Vec::new(),
        }
    }
}

/// Splits an identifier into its non-empty segments. An empty separator keeps
/// the identifier whole.
pub fn segments<'a>(name: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return if name.is_empty() { Vec::new() } else { vec![name] };
    }
    name.split(separator).filter(|s| !s.is_empty()).collect()
}

impl NamespaceTree {
    pub fn build(secrets: &[Secret], separator: &str) -> Self {
        let mut root = NamespaceNode::root();
        let mut collisions = Vec::new();

        for secret in secrets {
            let parts = segments(&secret.name, separator);
            let mut current = &mut root;
            for (idx, part) in parts.iter().enumerate() {
                let last = idx + 1 == parts.len();
                let full_path = if last {
                    secret.name.clone()
                } else {
                    parts[..=idx].join(separator)
                };
                let node = current
                    .children
                    .entry((*part).to_string())
                    .or_insert_with(|| NamespaceNode {
                        name: (*part).to_string(),
                        full_path,
                        is_folder: !last,
                        secret: None,
                        children: BTreeMap::new(),
                        depth: idx,
                    });

                if last {
                    if node.is_folder {
                        collisions.push(secret.name.clone());
                    } else if node.secret.is_none() {
                        node.secret = Some(secret.clone());
                    }
                } else if !node.is_folder {
                    // A leaf that gains children becomes a folder.
                    if let Some(previous) = node.secret.take() {
                        collisions.push(previous.name);
                    }
                    node.is_folder = true;
                    node.full_path = parts[..=idx].join(separator);
                }
                current = node;
            }
        }

        collisions.sort();
        collisions.dedup();
        Self {
            root,
            separator: separator.to_string(),
            collisions,
        }
    }

    /// Identifiers that were shadowed by a folder of the same path.
    pub fn collisions(&self) -> &[String] {
        &self.collisions
    }

    pub fn node(&self, path: &[String]) -> Option<&NamespaceNode> {
        let mut current = &self.root;
        for segment in path {
            current = current.children.get(segment)?;
        }
        Some(current)
    }

    /// Direct children of `path`, folders first, then by name. `filter` matches
    /// display names case-insensitively; an empty filter matches everything.
    pub fn list(&self, path: &[String], filter: &str) -> Vec<&NamespaceNode> {
        let Some(node) = self.node(path) else {
            return Vec::new();
        };
        let needle = filter.to_lowercase();
        let mut items: Vec<&NamespaceNode> = node
            .children
            .values()
            .filter(|child| needle.is_empty() || child.name.to_lowercase().contains(&needle))
            .collect();
        items.sort_by(|a, b| b.is_folder.cmp(&a.is_folder).then_with(|| a.name.cmp(&b.name)));
        items
    }

    /// Describes how `name` would collide with the current hierarchy, if at all.
    pub fn conflict_for(&self, name: &str) -> Option<String> {
        let parts = segments(name, &self.separator);
        let mut current = &self.root;
        for (idx, part) in parts.iter().enumerate() {
            let Some(child) = current.children.get(*part) else {
                return None;
            };
            let last = idx + 1 == parts.len();
            if last && child.is_folder {
                return Some(format!("'{}' is already a folder", child.full_path));
            }
            if !last && !child.is_folder {
                return Some(format!("'{}' is already a secret", child.full_path));
            }
            current = child;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets(names: &[&str]) -> Vec<Secret> {
        names
            .iter()
            .map(|n| Secret {
                name: n.to_string(),
                create_time: String::new(),
                replication: String::new(),
                labels: Default::default(),
            })
            .collect()
    }

    fn leaves(node: &NamespaceNode, out: &mut Vec<String>) {
        for child in node.children.values() {
            if let Some(secret) = &child.secret {
                assert_eq!(child.full_path, secret.name);
                out.push(child.full_path.clone());
            }
            leaves(child, out);
        }
    }

    fn names(items: &[&NamespaceNode]) -> Vec<(String, bool)> {
        items.iter().map(|n| (n.name.clone(), n.is_folder)).collect()
    }

    #[test]
    fn root_and_folder_listing() {
        let tree = NamespaceTree::build(&secrets(&["a/x", "a/y", "b"]), "/");
        assert_eq!(
            names(&tree.list(&[], "")),
            vec![("a".to_string(), true), ("b".to_string(), false)]
        );
        assert_eq!(
            names(&tree.list(&["a".to_string()], "")),
            vec![("x".to_string(), false), ("y".to_string(), false)]
        );
        assert_eq!(names(&tree.list(&[], "b")), vec![("b".to_string(), false)]);
    }

    #[test]
    fn filter_is_case_insensitive() {
        let tree = NamespaceTree::build(&secrets(&["Team/API_KEY", "team2/db"]), "/");
        let hits = tree.list(&["Team".to_string()], "api");
        assert_eq!(names(&hits), vec![("API_KEY".to_string(), false)]);
    }

    #[test]
    fn folders_sort_before_leaves() {
        let tree = NamespaceTree::build(&secrets(&["z", "m/one", "a", "k/two"]), "/");
        assert_eq!(
            names(&tree.list(&[], "")),
            vec![
                ("k".to_string(), true),
                ("m".to_string(), true),
                ("a".to_string(), false),
                ("z".to_string(), false),
            ]
        );
    }

    #[test]
    fn missing_path_yields_empty() {
        let tree = NamespaceTree::build(&secrets(&["a/x"]), "/");
        assert!(tree.list(&["nope".to_string()], "").is_empty());
        assert!(tree.list(&["a".to_string(), "x".to_string(), "deeper".to_string()], "").is_empty());
    }

    #[test]
    fn empty_segments_are_discarded() {
        let tree = NamespaceTree::build(&secrets(&["//a//b/", "c"]), "/");
        let root = tree.list(&[], "");
        assert_eq!(names(&root), vec![("a".to_string(), true), ("c".to_string(), false)]);
        let inner = tree.list(&["a".to_string()], "");
        assert_eq!(inner.len(), 1);
        assert_eq!(inner[0].full_path, "//a//b/");
        assert_eq!(inner[0].depth, 1);
    }

    #[test]
    fn rebuild_is_deterministic_and_leaves_round_trip() {
        let input = secrets(&["svc/api/token", "svc/db", "root", "x::y", "svc/api/other"]);
        let first = NamespaceTree::build(&input, "/");
        let second = NamespaceTree::build(&input, "/");
        assert_eq!(first, second);

        let mut found = Vec::new();
        leaves(&first.root, &mut found);
        found.sort();
        let mut expected: Vec<String> = input.iter().map(|s| s.name.clone()).collect();
        expected.sort();
        assert_eq!(found, expected);
    }

    #[test]
    fn folder_wins_collision_in_either_order() {
        for order in [["a", "a/x"], ["a/x", "a"]] {
            let tree = NamespaceTree::build(&secrets(&order), "/");
            let root = tree.list(&[], "");
            assert_eq!(names(&root), vec![("a".to_string(), true)]);
            assert!(root[0].secret.is_none());
            assert_eq!(tree.collisions(), ["a".to_string()]);
        }
    }

    #[test]
    fn custom_separator() {
        let tree = NamespaceTree::build(&secrets(&["prod--db--password", "prod--api"]), "--");
        let prod = tree.list(&["prod".to_string()], "");
        assert_eq!(
            names(&prod),
            vec![("db".to_string(), true), ("api".to_string(), false)]
        );
        assert_eq!(prod[0].full_path, "prod--db");
    }

    #[test]
    fn conflict_detection() {
        let tree = NamespaceTree::build(&secrets(&["a/x", "b"]), "/");
        assert!(tree.conflict_for("a").is_some());
        assert!(tree.conflict_for("b/child").is_some());
        assert!(tree.conflict_for("a/z").is_none());
        assert!(tree.conflict_for("c").is_none());
    }
}
