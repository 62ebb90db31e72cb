//! Optimistic synchronization of the workspace with the backend.
//!
//! Every tree mutation is applied locally first and recorded in a
//! [`MutationLedger`] as pending. The backend's answer later settles it as
//! confirmed or failed. Failed mutations are not rolled back; their status is
//! kept so a UI can flag the diverged nodes and let the user re-fetch or retry.
//!
//! [`SyncedWorkspace`] is the synchronous state machine. [`BackendSync`] wraps
//! it with an [`IdeBackend`] so a mutation can be issued and awaited in one
//! call while other mutations are still in flight.

mod ledger;

use std::sync::Mutex;

pub use ledger::{
    DEFAULT_CONFIRMED_RETENTION, MutationId, MutationLedger, MutationRecord, MutationStatus,
};

use crate::backend::{IdeBackend, NodeAck, TreeMutation};
use crate::callback_registry::{CallbackRegistry, EventCallback, SubscriptionId};
use crate::error::{IdeError, Result};
use crate::events::WorkspaceEvent;
use crate::workspace::{NodeKind, Workspace};

/// A mutation applied locally and waiting for the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMutation {
    /// Ledger id to settle with.
    pub id: MutationId,
    /// The mutation to send to the backend.
    pub mutation: TreeMutation,
}

/// Workspace plus the bookkeeping needed to reconcile it with the backend.
#[derive(Debug, Default)]
pub struct SyncedWorkspace {
    workspace: Workspace,
    ledger: MutationLedger,
    callbacks: CallbackRegistry,
}

impl SyncedWorkspace {
    /// Wrap `workspace` with an empty ledger.
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace,
            ..Self::default()
        }
    }

    /// Current snapshot.
    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// Mutation ledger.
    pub fn ledger(&self) -> &MutationLedger {
        &self.ledger
    }

    /// Status of the latest mutation touching `target`.
    pub fn status_of(&self, target: &str) -> Option<&MutationStatus> {
        self.ledger.status_of(target)
    }

    /// Register a callback for workspace events.
    pub fn subscribe(&self, callback: EventCallback) -> SubscriptionId {
        self.callbacks.subscribe(callback)
    }

    /// Remove a callback. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.callbacks.unsubscribe(id)
    }

    /// Apply `mutation` locally and record it as pending.
    ///
    /// Local failures (`NotFound`, `Conflict`, `InvalidName`) leave the
    /// workspace untouched and produce no pending mutation. Renaming a node to
    /// its current name changes nothing and returns `Ok(None)`.
    pub fn apply(&mut self, mutation: TreeMutation) -> Result<Option<PendingMutation>> {
        let next = match &mutation {
            TreeMutation::Create {
                parent_path,
                name,
                kind,
            } => self.workspace.create(parent_path, name, *kind)?,
            TreeMutation::Delete { path } => self.workspace.delete(path)?,
            TreeMutation::Rename { old_path, new_name } => {
                let next = self.workspace.rename(old_path, new_name)?;
                if mutation.target_path() == *old_path {
                    log::debug!("[SyncedWorkspace] rename of {} is a no-op", old_path);
                    return Ok(None);
                }
                next
            }
        };

        let event = match &mutation {
            TreeMutation::Create { kind, .. } => WorkspaceEvent::NodeCreated {
                path: mutation.target_path(),
                kind: *kind,
            },
            TreeMutation::Delete { path } => WorkspaceEvent::NodeDeleted { path: path.clone() },
            TreeMutation::Rename { old_path, .. } => WorkspaceEvent::NodeRenamed {
                old_path: old_path.clone(),
                new_path: mutation.target_path(),
            },
        };

        self.commit(next);
        let id = self.ledger.issue(mutation.clone());
        log::debug!(
            "[SyncedWorkspace] applied {} #{} ({})",
            mutation.operation(),
            id,
            mutation.target_path()
        );
        self.callbacks.emit(&event);
        Ok(Some(PendingMutation { id, mutation }))
    }

    /// Record the backend's answer for mutation `id`.
    ///
    /// The local tree is never rolled back. Returns `NotFound` for an unknown id.
    pub fn settle(&mut self, id: MutationId, outcome: &Result<NodeAck>) -> Result<()> {
        let already_settled = self
            .ledger
            .get(id)
            .ok_or_else(|| IdeError::NotFound(format!("mutation #{id}")))?
            .status
            .is_settled();
        if already_settled {
            log::warn!("[SyncedWorkspace] ignoring late answer for #{}", id);
            return Ok(());
        }

        let status = match outcome {
            Ok(_) => MutationStatus::Confirmed,
            Err(e) => MutationStatus::Failed {
                reason: e.to_string(),
            },
        };
        let Some(record) = self.ledger.settle(id, status) else {
            return Ok(());
        };

        let event = match (&record.status, outcome) {
            (MutationStatus::Failed { reason }, _) => {
                log::error!(
                    "[SyncedWorkspace] {} of {} failed: {}",
                    record.mutation.operation(),
                    record.path,
                    reason
                );
                WorkspaceEvent::MutationFailed {
                    id,
                    path: record.path.clone(),
                    reason: reason.clone(),
                }
            }
            (_, Ok(ack)) if !ack.path.is_empty() && ack.path != record.path => {
                log::warn!(
                    "[SyncedWorkspace] backend placed {} at {}",
                    record.path,
                    ack.path
                );
                WorkspaceEvent::MutationConfirmed {
                    id,
                    path: record.path.clone(),
                }
            }
            _ => WorkspaceEvent::MutationConfirmed {
                id,
                path: record.path.clone(),
            },
        };
        self.callbacks.emit(&event);
        Ok(())
    }

    /// Make `target` the active file. Local only.
    pub fn open(&mut self, target: &str) -> Result<()> {
        let next = self.workspace.open(target)?;
        self.commit(next);
        Ok(())
    }

    /// Close the active file. Local only.
    pub fn close_active(&mut self) {
        let next = self.workspace.close_active();
        self.commit(next);
    }

    /// Editor change on the active file. Local only.
    pub fn edit_active(&mut self, text: &str) -> Result<()> {
        let next = self.workspace.edit_active(text)?;
        let edited = next.active_file().map(String::from);
        self.commit(next);
        if let Some(path) = edited {
            self.callbacks.emit(&WorkspaceEvent::ContentChanged { path });
        }
        Ok(())
    }

    /// Replace the content of any file. Local only.
    pub fn set_content(&mut self, target: &str, text: &str) -> Result<()> {
        let next = self.workspace.set_content(target, text)?;
        self.commit(next);
        self.callbacks.emit(&WorkspaceEvent::ContentChanged {
            path: target.to_string(),
        });
        Ok(())
    }

    /// Swap in a tree fetched from the backend, keeping the active file
    /// open if it still exists.
    pub fn replace(&mut self, workspace: Workspace) {
        let reopened = self
            .workspace
            .active_file()
            .and_then(|active| workspace.open(active).ok());
        self.commit(reopened.unwrap_or(workspace));
    }

    /// Install `next`, emitting `ActiveFileChanged` if the selection moved.
    fn commit(&mut self, next: Workspace) {
        let changed = next.active_file() != self.workspace.active_file();
        self.workspace = next;
        if changed {
            self.callbacks.emit(&WorkspaceEvent::ActiveFileChanged {
                path: self.workspace.active_file().map(String::from),
            });
        }
    }
}

/// A [`SyncedWorkspace`] bound to a backend.
///
/// The state lock is only held while applying or settling, never across the
/// backend call, so several mutations can be in flight at once. Racing
/// mutations resolve last-issued-wins locally. Event callbacks run under the
/// lock and must not call back into this type.
pub struct BackendSync<B> {
    backend: B,
    state: Mutex<SyncedWorkspace>,
}

impl<B: IdeBackend> BackendSync<B> {
    /// Bind `workspace` to `backend`.
    pub fn new(backend: B, workspace: Workspace) -> Self {
        Self {
            backend,
            state: Mutex::new(SyncedWorkspace::new(workspace)),
        }
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Snapshot of the current workspace.
    pub fn snapshot(&self) -> Workspace {
        self.with_state(|s| s.workspace().clone())
    }

    /// Run `f` with exclusive access to the synced state.
    pub fn with_state<R>(&self, f: impl FnOnce(&mut SyncedWorkspace) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut state)
    }

    /// Apply locally, send to the backend and settle.
    ///
    /// On a remote failure the error is returned and the local change stays.
    /// A mutation that changes nothing locally is not sent.
    pub async fn submit(&self, mutation: TreeMutation) -> Result<NodeAck> {
        let path = mutation.target_path();
        let Some(pending) = self.with_state(|s| s.apply(mutation))? else {
            return Ok(NodeAck { path });
        };
        let outcome = self.backend.execute(&pending.mutation).await;
        self.with_state(|s| s.settle(pending.id, &outcome))?;
        outcome
    }

    /// Create a file or folder and mirror it on the backend.
    pub async fn create(&self, parent_path: &str, name: &str, kind: NodeKind) -> Result<NodeAck> {
        self.submit(TreeMutation::Create {
            parent_path: parent_path.to_string(),
            name: name.to_string(),
            kind,
        })
        .await
    }

    /// Delete a node and mirror it on the backend.
    pub async fn delete(&self, target: &str) -> Result<NodeAck> {
        self.submit(TreeMutation::Delete {
            path: target.to_string(),
        })
        .await
    }

    /// Rename a node and mirror it on the backend.
    pub async fn rename(&self, old_path: &str, new_name: &str) -> Result<NodeAck> {
        self.submit(TreeMutation::Rename {
            old_path: old_path.to_string(),
            new_name: new_name.to_string(),
        })
        .await
    }

    /// Replace the local tree with the backend's copy.
    pub async fn refresh(&self) -> Result<()> {
        let nodes = self.backend.fetch_tree().await?;
        let workspace = Workspace::from_nodes(nodes)?;
        log::info!("[BackendSync] refreshed {} nodes from backend", workspace.len());
        self.with_state(|s| s.replace(workspace));
        Ok(())
    }
}
