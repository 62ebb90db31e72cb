//! Workspace node types.
//!
//! A [`Node`] is one file or directory in the project. Its kind-specific data
//! lives in [`NodeBody`], so a file can never carry children and a directory
//! can never carry content. Children are reference counted so that tree
//! rewrites can share every subtree they do not touch.

use std::collections::HashSet;
use std::sync::Arc;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use ts_rs::TS;

use super::path;
use crate::error::{IdeError, Result};

/// Kind of a workspace node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A text file.
    File,
    /// A directory holding an ordered list of children.
    #[serde(alias = "folder")]
    Directory,
}

/// Kind-specific payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeBody {
    /// File content.
    File {
        /// Full text of the file.
        content: String,
    },
    /// Directory children in display order.
    Directory {
        /// Child nodes, shared between tree snapshots.
        children: Vec<Arc<Node>>,
    },
}

/// One file or directory in the workspace tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) body: NodeBody,
}

impl Node {
    /// Create a root-level file node.
    pub fn file(name: impl Into<String>, content: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            name,
            body: NodeBody::File {
                content: content.into(),
            },
        }
    }

    /// Create a root-level directory node.
    ///
    /// Child paths are derived when the node is placed into a
    /// [`Workspace`](super::Workspace).
    pub fn directory(name: impl Into<String>, children: Vec<Node>) -> Self {
        let name = name.into();
        Self {
            path: name.clone(),
            name,
            body: NodeBody::Directory {
                children: children.into_iter().map(Arc::new).collect(),
            },
        }
    }

    /// An empty node of the given kind.
    pub fn empty(name: impl Into<String>, kind: NodeKind) -> Self {
        match kind {
            NodeKind::File => Node::file(name, String::new()),
            NodeKind::Directory => Node::directory(name, Vec::new()),
        }
    }

    /// Display name (final path segment).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical slash-delimited path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Node kind.
    pub fn kind(&self) -> NodeKind {
        match self.body {
            NodeBody::File { .. } => NodeKind::File,
            NodeBody::Directory { .. } => NodeKind::Directory,
        }
    }

    /// Kind-specific payload.
    pub fn body(&self) -> &NodeBody {
        &self.body
    }

    /// True for files.
    pub fn is_file(&self) -> bool {
        matches!(self.body, NodeBody::File { .. })
    }

    /// True for directories.
    pub fn is_dir(&self) -> bool {
        matches!(self.body, NodeBody::Directory { .. })
    }

    /// File content, `None` for directories.
    pub fn content(&self) -> Option<&str> {
        match &self.body {
            NodeBody::File { content } => Some(content),
            NodeBody::Directory { .. } => None,
        }
    }

    /// Directory children, `None` for files.
    pub fn children(&self) -> Option<&[Arc<Node>]> {
        match &self.body {
            NodeBody::File { .. } => None,
            NodeBody::Directory { children } => Some(children),
        }
    }

    /// Direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Arc<Node>> {
        self.children()?.iter().find(|c| c.name == name)
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self
            .children()
            .map(|children| children.iter().map(|c| c.subtree_len()).sum())
            .unwrap_or(0)
    }

    /// Copy of this subtree under a new name and path, with every descendant
    /// path re-derived.
    pub(crate) fn relocated(&self, name: &str, new_path: String) -> Node {
        let body = match &self.body {
            NodeBody::File { content } => NodeBody::File {
                content: content.clone(),
            },
            NodeBody::Directory { children } => NodeBody::Directory {
                children: children
                    .iter()
                    .map(|c| Arc::new(c.relocated(&c.name, path::join(&new_path, &c.name))))
                    .collect(),
            },
        };
        Node {
            name: name.to_string(),
            path: new_path,
            body,
        }
    }

    /// Validate names and sibling uniqueness in this subtree, deriving every
    /// path from `parent`.
    pub(crate) fn normalized(&self, parent: &str) -> Result<Node> {
        path::validate_name(&self.name)?;
        let node_path = path::join(parent, &self.name);
        let body = match &self.body {
            NodeBody::File { content } => NodeBody::File {
                content: content.clone(),
            },
            NodeBody::Directory { children } => {
                ensure_unique_names(children.iter().map(|c| c.name.as_str()), &node_path)?;
                let children = children
                    .iter()
                    .map(|c| c.normalized(&node_path).map(Arc::new))
                    .collect::<Result<Vec<_>>>()?;
                NodeBody::Directory { children }
            }
        };
        Ok(Node {
            name: self.name.clone(),
            path: node_path,
            body,
        })
    }
}

/// Fail with `InvalidTree` if two siblings share a name.
pub(crate) fn ensure_unique_names<'a>(
    names: impl Iterator<Item = &'a str>,
    parent: &str,
) -> Result<()> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(IdeError::InvalidTree(format!(
                "duplicate entry '{}'",
                path::join(parent, name)
            )));
        }
    }
    Ok(())
}

// ============================================================================
// Wire format
// ============================================================================

/// Backend representation: `{ name, type, path, content?, children? }`.
#[derive(Deserialize)]
struct RawNode {
    name: String,
    #[serde(rename = "type")]
    kind: NodeKind,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    children: Option<Vec<Node>>,
}

impl TryFrom<RawNode> for Node {
    type Error = IdeError;

    fn try_from(raw: RawNode) -> Result<Self> {
        let path = raw.path.unwrap_or_else(|| raw.name.clone());
        let body = match raw.kind {
            NodeKind::File => {
                if raw.children.is_some() {
                    return Err(IdeError::InvalidTree(format!("file '{path}' has children")));
                }
                NodeBody::File {
                    content: raw.content.unwrap_or_default(),
                }
            }
            NodeKind::Directory => {
                if raw.content.is_some() {
                    return Err(IdeError::InvalidTree(format!(
                        "directory '{path}' has content"
                    )));
                }
                NodeBody::Directory {
                    children: raw
                        .children
                        .unwrap_or_default()
                        .into_iter()
                        .map(Arc::new)
                        .collect(),
                }
            }
        };
        Ok(Node {
            name: raw.name,
            path,
            body,
        })
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawNode::deserialize(deserializer)?;
        Node::try_from(raw).map_err(serde::de::Error::custom)
    }
}

struct SharedChildren<'a>(&'a [Arc<Node>]);

impl Serialize for SharedChildren<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(|c| c.as_ref()))
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Node", 4)?;
        state.serialize_field("name", &self.name)?;
        state.serialize_field("type", &self.kind())?;
        state.serialize_field("path", &self.path)?;
        match &self.body {
            NodeBody::File { content } => state.serialize_field("content", content)?,
            NodeBody::Directory { children } => {
                state.serialize_field("children", &SharedChildren(children))?
            }
        }
        state.end()
    }
}
