//! Workspace events.
//!
//! Emitted by [`SyncedWorkspace`](crate::sync::SyncedWorkspace) whenever the
//! local tree changes or a backend confirmation settles. A UI layer uses them
//! to re-render and to show per-node sync status.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::workspace::NodeKind;

/// Events describing workspace changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "type")]
pub enum WorkspaceEvent {
    /// A file or directory was created locally.
    NodeCreated {
        /// Path of the new node.
        path: String,
        /// File or directory.
        kind: NodeKind,
    },

    /// A subtree was removed locally.
    NodeDeleted {
        /// Path of the removed node.
        path: String,
    },

    /// A node was renamed locally.
    NodeRenamed {
        /// Path before the rename.
        old_path: String,
        /// Path after the rename.
        new_path: String,
    },

    /// File content changed (editor edit).
    ContentChanged {
        /// Path of the edited file.
        path: String,
    },

    /// The active file changed; `None` when the selection was cleared.
    ActiveFileChanged {
        /// New active path.
        #[serde(default)]
        path: Option<String>,
    },

    /// The backend confirmed a mutation.
    MutationConfirmed {
        /// Ledger id of the mutation.
        id: u64,
        /// Path the mutation targeted.
        path: String,
    },

    /// The backend rejected a mutation; the local change was kept.
    MutationFailed {
        /// Ledger id of the mutation.
        id: u64,
        /// Path the mutation targeted.
        path: String,
        /// Failure reason reported by the backend.
        reason: String,
    },
}

impl WorkspaceEvent {
    /// The path this event is about.
    pub fn path(&self) -> Option<&str> {
        match self {
            WorkspaceEvent::NodeCreated { path, .. }
            | WorkspaceEvent::NodeDeleted { path }
            | WorkspaceEvent::ContentChanged { path }
            | WorkspaceEvent::MutationConfirmed { path, .. }
            | WorkspaceEvent::MutationFailed { path, .. } => Some(path),
            WorkspaceEvent::NodeRenamed { new_path, .. } => Some(new_path),
            WorkspaceEvent::ActiveFileChanged { path } => path.as_deref(),
        }
    }

    /// True for events produced by a backend response.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            WorkspaceEvent::MutationConfirmed { .. } | WorkspaceEvent::MutationFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = WorkspaceEvent::NodeRenamed {
            old_path: "hello_world/src".into(),
            new_path: "hello_world/source".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "NodeRenamed");
        assert_eq!(json["new_path"], "hello_world/source");

        let back: WorkspaceEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_event_path() {
        let cleared = WorkspaceEvent::ActiveFileChanged { path: None };
        assert_eq!(cleared.path(), None);
        assert!(!cleared.is_remote());

        let failed = WorkspaceEvent::MutationFailed {
            id: 3,
            path: "a".into(),
            reason: "boom".into(),
        };
        assert_eq!(failed.path(), Some("a"));
        assert!(failed.is_remote());
    }
}
