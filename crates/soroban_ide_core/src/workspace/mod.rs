//! Workspace tree engine.
//!
//! A [`Workspace`] is an immutable snapshot of the project tree plus the
//! active editor selection. Every mutating operation returns a new snapshot
//! and leaves `self` untouched, so a failed operation can never leave a
//! partially applied change behind.
//!
//! Rewrites are structural: only the nodes on the path from the root to the
//! mutated node are rebuilt. Every other subtree is shared with the previous
//! snapshot (`Arc::ptr_eq` holds), which lets a UI layer skip re-rendering
//! untouched branches.
//!
//! # Example
//!
//! ```ignore
//! use soroban_ide_core::workspace::{Node, NodeKind, Workspace};
//!
//! let ws = Workspace::from_nodes(vec![Node::directory("hello_world", vec![])])?;
//! let ws = ws.create("hello_world", "src", NodeKind::Directory)?;
//! let ws = ws.create("hello_world/src", "lib.rs", NodeKind::File)?;
//! let ws = ws.rename("hello_world/src", "source")?;
//! assert!(ws.select("hello_world/source/lib.rs").is_ok());
//! ```

mod node;
/// Path helpers for `/`-separated node paths.
pub mod path;

pub use node::{Node, NodeBody, NodeKind};

use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::error::{IdeError, Result};

/// The file currently open for editing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveFile {
    /// Path of the open file.
    pub path: String,
    /// In-memory text of the open file.
    pub content: String,
}

/// Project tree snapshot with the active selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workspace {
    roots: Vec<Arc<Node>>,
    active: Option<ActiveFile>,
}

impl Workspace {
    /// An empty workspace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a workspace from root nodes, deriving every path from names.
    ///
    /// Fails with `InvalidName` or `InvalidTree` if a name is malformed or
    /// two siblings share a name.
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self> {
        node::ensure_unique_names(nodes.iter().map(|n| n.name()), "")?;
        let roots = nodes
            .iter()
            .map(|n| n.normalized("").map(Arc::new))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            roots,
            active: None,
        })
    }

    /// Top-level nodes in display order.
    pub fn roots(&self) -> &[Arc<Node>] {
        &self.roots
    }

    /// True when the workspace has no nodes.
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.roots.iter().map(|n| n.subtree_len()).sum()
    }

    /// Active selection, if a file is open.
    pub fn active(&self) -> Option<&ActiveFile> {
        self.active.as_ref()
    }

    /// Path of the active file, if any.
    pub fn active_file(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.path.as_str())
    }

    /// Text of the active file, empty when nothing is open.
    pub fn active_content(&self) -> &str {
        self.active.as_ref().map(|a| a.content.as_str()).unwrap_or("")
    }

    /// Look up a node by exact path.
    pub fn select(&self, target: &str) -> Result<&Arc<Node>> {
        find(&self.roots, target).ok_or_else(|| IdeError::NotFound(target.to_string()))
    }

    /// True if a node exists at `target`.
    pub fn contains(&self, target: &str) -> bool {
        find(&self.roots, target).is_some()
    }

    /// Replace the content of the file at `target`.
    ///
    /// If `target` is the active file, the active content follows.
    pub fn set_content(&self, target: &str, text: &str) -> Result<Workspace> {
        let roots = rewrite(&self.roots, target, |node| match &node.body {
            NodeBody::File { .. } => Ok(Some(Node {
                name: node.name.clone(),
                path: node.path.clone(),
                body: NodeBody::File {
                    content: text.to_string(),
                },
            })),
            NodeBody::Directory { .. } => Err(IdeError::NotFound(target.to_string())),
        })?;

        let active = match &self.active {
            Some(active) if active.path == target => Some(ActiveFile {
                path: active.path.clone(),
                content: text.to_string(),
            }),
            other => other.clone(),
        };
        Ok(Workspace { roots, active })
    }

    /// Append an empty node named `name` to the directory at `parent_path`.
    ///
    /// An empty `parent_path` creates a top-level node.
    pub fn create(&self, parent_path: &str, name: &str, kind: NodeKind) -> Result<Workspace> {
        path::validate_name(name)?;
        let new_path = path::join(parent_path, name);
        let mut fresh = Node::empty(name, kind);
        fresh.path = new_path.clone();

        if parent_path.is_empty() {
            if self.roots.iter().any(|n| n.name == name) {
                return Err(IdeError::Conflict(new_path));
            }
            let mut roots = self.roots.clone();
            roots.push(Arc::new(fresh));
            return Ok(self.with_roots(roots));
        }

        let roots = rewrite(&self.roots, parent_path, |parent| {
            let NodeBody::Directory { children } = &parent.body else {
                return Err(IdeError::NotFound(parent_path.to_string()));
            };
            if children.iter().any(|c| c.name == name) {
                return Err(IdeError::Conflict(new_path.clone()));
            }
            let mut children = children.clone();
            children.push(Arc::new(fresh));
            Ok(Some(Node {
                name: parent.name.clone(),
                path: parent.path.clone(),
                body: NodeBody::Directory { children },
            }))
        })?;
        Ok(self.with_roots(roots))
    }

    /// Remove the subtree rooted at `target`.
    ///
    /// Clears the active selection if the active file was inside it.
    pub fn delete(&self, target: &str) -> Result<Workspace> {
        let roots = rewrite(&self.roots, target, |_| Ok(None))?;
        let active = self
            .active
            .clone()
            .filter(|a| !path::is_within(&a.path, target));
        Ok(Workspace { roots, active })
    }

    /// Rename the node at `target`, re-deriving every descendant path.
    ///
    /// The active selection follows the rename if it lies in the subtree.
    pub fn rename(&self, target: &str, new_name: &str) -> Result<Workspace> {
        path::validate_name(new_name)?;
        let node = self.select(target)?;
        if node.name == new_name {
            return Ok(self.clone());
        }

        let parent = path::parent(target);
        let new_path = path::join(parent, new_name);
        let siblings: &[Arc<Node>] = if parent.is_empty() {
            &self.roots
        } else {
            self.select(parent)?.children().unwrap_or(&[])
        };
        if siblings.iter().any(|s| s.name == new_name) {
            return Err(IdeError::Conflict(new_path));
        }

        let roots = rewrite(&self.roots, target, |node| {
            Ok(Some(node.relocated(new_name, new_path.clone())))
        })?;

        let active = self.active.as_ref().map(|a| {
            if path::is_within(&a.path, target) {
                ActiveFile {
                    path: path::rebase(&a.path, target, &new_path),
                    content: a.content.clone(),
                }
            } else {
                a.clone()
            }
        });
        Ok(Workspace { roots, active })
    }

    /// Make the file at `target` the active file.
    pub fn open(&self, target: &str) -> Result<Workspace> {
        let node = self.select(target)?;
        let content = node
            .content()
            .ok_or_else(|| IdeError::NotFound(target.to_string()))?;
        Ok(Workspace {
            roots: self.roots.clone(),
            active: Some(ActiveFile {
                path: target.to_string(),
                content: content.to_string(),
            }),
        })
    }

    /// Clear the active selection.
    pub fn close_active(&self) -> Workspace {
        Workspace {
            roots: self.roots.clone(),
            active: None,
        }
    }

    /// Replace the text of the active file (editor change).
    pub fn edit_active(&self, text: &str) -> Result<Workspace> {
        let active = self
            .active
            .as_ref()
            .ok_or_else(|| IdeError::NotFound(String::new()))?;
        self.set_content(&active.path, text)
    }

    /// Depth-first, pre-order list of every node.
    pub fn walk(&self) -> Vec<&Arc<Node>> {
        fn visit<'a>(nodes: &'a [Arc<Node>], out: &mut Vec<&'a Arc<Node>>) {
            for node in nodes {
                out.push(node);
                if let Some(children) = node.children() {
                    visit(children, out);
                }
            }
        }

        let mut out = Vec::new();
        visit(&self.roots, &mut out);
        out
    }

    /// Flattened `path -> content` map of every file, in tree order.
    pub fn file_map(&self) -> IndexMap<String, String> {
        self.walk()
            .into_iter()
            .filter_map(|n| n.content().map(|c| (n.path.clone(), c.to_string())))
            .collect()
    }

    /// First file (in tree order) whose name is `name`.
    pub fn find_first_file(&self, name: &str) -> Option<&Arc<Node>> {
        self.walk()
            .into_iter()
            .find(|n| n.is_file() && n.name == name)
    }

    fn with_roots(&self, roots: Vec<Arc<Node>>) -> Workspace {
        Workspace {
            roots,
            active: self.active.clone(),
        }
    }
}

/// Recursive descent by path prefix.
fn find<'a>(nodes: &'a [Arc<Node>], target: &str) -> Option<&'a Arc<Node>> {
    for node in nodes {
        if node.path == target {
            return Some(node);
        }
        if path::is_descendant(target, &node.path) {
            return node.children().and_then(|children| find(children, target));
        }
    }
    None
}

/// Rebuild `nodes` with the node at `target` replaced by the result of `f`
/// (`None` removes it). Nodes off the root-to-target path are shared.
fn rewrite<F>(nodes: &[Arc<Node>], target: &str, f: F) -> Result<Vec<Arc<Node>>>
where
    F: FnOnce(&Node) -> Result<Option<Node>>,
{
    for (i, node) in nodes.iter().enumerate() {
        if node.path == target {
            let mut out = nodes.to_vec();
            match f(node)? {
                Some(replacement) => out[i] = Arc::new(replacement),
                None => {
                    out.remove(i);
                }
            }
            return Ok(out);
        }

        if path::is_descendant(target, &node.path) {
            let NodeBody::Directory { children } = &node.body else {
                break;
            };
            let children = rewrite(children, target, f)?;
            let mut out = nodes.to_vec();
            out[i] = Arc::new(Node {
                name: node.name.clone(),
                path: node.path.clone(),
                body: NodeBody::Directory { children },
            });
            return Ok(out);
        }
    }
    Err(IdeError::NotFound(target.to_string()))
}

struct Roots<'a>(&'a [Arc<Node>]);

impl Serialize for Roots<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(|n| n.as_ref()))
    }
}

impl Serialize for Workspace {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Workspace", 3)?;
        state.serialize_field("files", &Roots(&self.roots))?;
        state.serialize_field("activeFile", self.active_file().unwrap_or(""))?;
        state.serialize_field("activeContent", self.active_content())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_workspace;

    fn child_names(ws: &Workspace, dir: &str) -> Vec<String> {
        ws.select(dir)
            .unwrap()
            .children()
            .unwrap()
            .iter()
            .map(|c| c.name().to_string())
            .collect()
    }

    #[test]
    fn test_select_exact_path() {
        let ws = sample_workspace();
        let node = ws.select("hello_world/src/lib.rs").unwrap();
        assert_eq!(node.kind(), NodeKind::File);
        assert!(matches!(
            ws.select("hello_world/src/lib"),
            Err(IdeError::NotFound(_))
        ));
        assert!(matches!(ws.select(""), Err(IdeError::NotFound(_))));
    }

    #[test]
    fn test_create_directory_appends_in_order() {
        let ws = sample_workspace();
        let ws = ws.create("hello_world", "src2", NodeKind::Directory).unwrap();

        assert_eq!(child_names(&ws, "hello_world"), ["Cargo.toml", "src", "src2"]);
        let src2 = ws.select("hello_world/src2").unwrap();
        assert_eq!(src2.children().map(|c| c.len()), Some(0));
    }

    #[test]
    fn test_create_file_conflict() {
        let ws = sample_workspace();
        let err = ws
            .create("hello_world", "Cargo.toml", NodeKind::File)
            .unwrap_err();
        assert!(matches!(err, IdeError::Conflict(p) if p == "hello_world/Cargo.toml"));
    }

    #[test]
    fn test_create_under_file_is_not_found() {
        let ws = sample_workspace();
        assert!(matches!(
            ws.create("hello_world/Cargo.toml", "x", NodeKind::File),
            Err(IdeError::NotFound(_))
        ));
        assert!(matches!(
            ws.create("missing", "x", NodeKind::File),
            Err(IdeError::NotFound(_))
        ));
    }

    #[test]
    fn test_create_at_root_level() {
        let ws = sample_workspace();
        let ws = ws.create("", "notes.md", NodeKind::File).unwrap();
        assert_eq!(ws.roots().len(), 2);
        assert_eq!(ws.select("notes.md").unwrap().content(), Some(""));
        assert!(matches!(
            ws.create("", "hello_world", NodeKind::Directory),
            Err(IdeError::Conflict(_))
        ));
    }

    #[test]
    fn test_create_rejects_invalid_name() {
        let ws = sample_workspace();
        assert!(matches!(
            ws.create("hello_world", "a/b", NodeKind::File),
            Err(IdeError::InvalidName(_))
        ));
    }

    #[test]
    fn test_rename_directory_rewrites_descendants() {
        let ws = sample_workspace();
        let ws = ws.rename("hello_world/src", "source").unwrap();

        assert!(!ws.contains("hello_world/src"));
        assert!(!ws.contains("hello_world/src/lib.rs"));
        let lib = ws.select("hello_world/source/lib.rs").unwrap();
        assert_eq!(lib.name(), "lib.rs");
        assert_eq!(child_names(&ws, "hello_world"), ["Cargo.toml", "source"]);
    }

    #[test]
    fn test_rename_conflict_leaves_tree_unchanged() {
        let ws = sample_workspace();
        let before = ws.clone();
        assert!(matches!(
            ws.rename("hello_world/src", "Cargo.toml"),
            Err(IdeError::Conflict(_))
        ));
        assert_eq!(ws, before);
    }

    #[test]
    fn test_rename_to_same_name_is_noop() {
        let ws = sample_workspace();
        let renamed = ws.rename("hello_world/src", "src").unwrap();
        assert_eq!(renamed, ws);
    }

    #[test]
    fn test_rename_follows_active_file() {
        let ws = sample_workspace().open("hello_world/src/lib.rs").unwrap();
        let ws = ws.rename("hello_world/src", "source").unwrap();
        assert_eq!(ws.active_file(), Some("hello_world/source/lib.rs"));

        let ws = ws.rename("hello_world/source/lib.rs", "main.rs").unwrap();
        assert_eq!(ws.active_file(), Some("hello_world/source/main.rs"));
    }

    #[test]
    fn test_delete_ancestor_clears_active_file() {
        let ws = sample_workspace().open("hello_world/src/lib.rs").unwrap();
        let ws = ws.delete("hello_world/src").unwrap();

        assert_eq!(ws.active_file(), None);
        assert_eq!(ws.active_content(), "");
        assert_eq!(child_names(&ws, "hello_world"), ["Cargo.toml"]);
    }

    #[test]
    fn test_delete_unrelated_keeps_active_file() {
        let ws = sample_workspace().open("hello_world/src/lib.rs").unwrap();
        let content = ws.active_content().to_string();
        let ws = ws.delete("hello_world/Cargo.toml").unwrap();

        assert_eq!(ws.active_file(), Some("hello_world/src/lib.rs"));
        assert_eq!(ws.active_content(), content);
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let ws = sample_workspace();
        assert!(matches!(
            ws.delete("hello_world/nope"),
            Err(IdeError::NotFound(_))
        ));
    }

    #[test]
    fn test_set_content_updates_active() {
        let ws = sample_workspace().open("hello_world/Cargo.toml").unwrap();
        let ws = ws.set_content("hello_world/Cargo.toml", "[package]").unwrap();
        assert_eq!(ws.active_content(), "[package]");
        assert_eq!(
            ws.select("hello_world/Cargo.toml").unwrap().content(),
            Some("[package]")
        );
    }

    #[test]
    fn test_set_content_on_directory_is_not_found() {
        let ws = sample_workspace();
        assert!(matches!(
            ws.set_content("hello_world/src", "x"),
            Err(IdeError::NotFound(_))
        ));
    }

    #[test]
    fn test_edit_active_without_selection() {
        let ws = sample_workspace();
        assert!(ws.edit_active("x").is_err());

        let ws = ws.open("hello_world/src/lib.rs").unwrap();
        let ws = ws.edit_active("#![no_std]").unwrap();
        assert_eq!(
            ws.select("hello_world/src/lib.rs").unwrap().content(),
            Some("#![no_std]")
        );
    }

    #[test]
    fn test_open_directory_is_not_found() {
        let ws = sample_workspace();
        assert!(matches!(ws.open("hello_world/src"), Err(IdeError::NotFound(_))));
    }

    #[test]
    fn test_untouched_branches_are_shared() {
        let ws = sample_workspace();
        let edited = ws.set_content("hello_world/src/lib.rs", "changed").unwrap();

        let old_cargo = ws.select("hello_world/Cargo.toml").unwrap();
        let new_cargo = edited.select("hello_world/Cargo.toml").unwrap();
        assert!(Arc::ptr_eq(old_cargo, new_cargo));

        let old_src = ws.select("hello_world/src").unwrap();
        let new_src = edited.select("hello_world/src").unwrap();
        assert!(!Arc::ptr_eq(old_src, new_src));
    }

    #[test]
    fn test_file_map_in_tree_order() {
        let ws = sample_workspace();
        let files: Vec<_> = ws.file_map().into_keys().collect();
        assert_eq!(files, ["hello_world/Cargo.toml", "hello_world/src/lib.rs"]);
    }

    #[test]
    fn test_from_nodes_derives_paths() {
        let ws = Workspace::from_nodes(vec![Node::directory(
            "app",
            vec![Node::directory("src", vec![Node::file("lib.rs", "")])],
        )])
        .unwrap();
        assert!(ws.contains("app/src/lib.rs"));
        assert_eq!(ws.len(), 3);
    }

    #[test]
    fn test_serialize_snapshot() {
        let ws = sample_workspace().open("hello_world/Cargo.toml").unwrap();
        let value = serde_json::to_value(&ws).unwrap();
        assert_eq!(value["activeFile"], "hello_world/Cargo.toml");
        assert_eq!(value["files"][0]["name"], "hello_world");
    }
}
