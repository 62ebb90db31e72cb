//! Ledger of optimistic mutations and their backend status.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::backend::TreeMutation;
use crate::workspace::path;

/// Identifier assigned to each mutation, increasing in issue order.
pub type MutationId = u64;

/// Confirmed records kept around for [`MutationLedger::status_of`].
pub const DEFAULT_CONFIRMED_RETENTION: usize = 64;

/// Sync status of a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MutationStatus {
    /// Sent, no answer yet.
    Pending,
    /// Accepted by the backend.
    Confirmed,
    /// Rejected by the backend. The local change stays.
    Failed {
        /// Error reported for the mutation.
        reason: String,
    },
}

impl MutationStatus {
    /// True once the backend has answered.
    pub fn is_settled(&self) -> bool {
        !matches!(self, MutationStatus::Pending)
    }
}

/// One mutation and its sync status.
#[derive(Debug, Clone)]
pub struct MutationRecord {
    /// Ledger id.
    pub id: MutationId,
    /// The mutation as issued.
    pub mutation: TreeMutation,
    /// Local path produced by the mutation.
    pub path: String,
    /// Current status.
    pub status: MutationStatus,
    /// When the mutation was applied locally.
    pub issued_at: DateTime<Utc>,
    /// When the backend answered.
    pub settled_at: Option<DateTime<Utc>>,
}

/// Mutations in issue order.
///
/// Pending and failed records are kept until superseded. Confirmed records
/// are capped at the retention limit, oldest first.
#[derive(Debug)]
pub struct MutationLedger {
    records: IndexMap<MutationId, MutationRecord>,
    next_id: MutationId,
    confirmed_retention: usize,
}

impl Default for MutationLedger {
    fn default() -> Self {
        Self::with_retention(DEFAULT_CONFIRMED_RETENTION)
    }
}

impl MutationLedger {
    /// An empty ledger with the default retention.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep at most `confirmed_retention` confirmed records (at least one).
    pub fn with_retention(confirmed_retention: usize) -> Self {
        Self {
            records: IndexMap::new(),
            next_id: 0,
            confirmed_retention: confirmed_retention.max(1),
        }
    }

    /// Record a freshly applied mutation as pending.
    pub fn issue(&mut self, mutation: TreeMutation) -> MutationId {
        self.next_id += 1;
        let id = self.next_id;
        let path = mutation.target_path();
        self.records.insert(
            id,
            MutationRecord {
                id,
                mutation,
                path,
                status: MutationStatus::Pending,
                issued_at: Utc::now(),
                settled_at: None,
            },
        );
        id
    }

    /// Set the final status of a mutation.
    ///
    /// Returns `None` for unknown ids. Settling twice keeps the first outcome.
    /// Confirming a mutation drops older settled records under its path and
    /// trims confirmed records beyond the retention limit.
    pub fn settle(&mut self, id: MutationId, status: MutationStatus) -> Option<&MutationRecord> {
        let record = self.records.get_mut(&id)?;
        if record.status.is_settled() {
            log::warn!("[MutationLedger] mutation {} already settled", id);
        } else {
            record.status = status;
            record.settled_at = Some(Utc::now());
            if record.status == MutationStatus::Confirmed {
                let target = record.path.clone();
                self.compact(id, &target);
            }
        }
        self.records.get(&id)
    }

    fn compact(&mut self, confirmed: MutationId, target: &str) {
        let before = self.records.len();
        self.records.retain(|&id, r| {
            id >= confirmed || !r.status.is_settled() || !path::is_within(&r.path, target)
        });

        let excess = self
            .records
            .values()
            .filter(|r| r.status == MutationStatus::Confirmed)
            .count()
            .saturating_sub(self.confirmed_retention);
        let mut dropped = 0;
        self.records.retain(|&id, r| {
            if dropped < excess && id != confirmed && r.status == MutationStatus::Confirmed {
                dropped += 1;
                false
            } else {
                true
            }
        });

        let removed = before - self.records.len();
        if removed > 0 {
            log::trace!("[MutationLedger] compacted {} records", removed);
        }
    }

    /// Record for `id`, if still retained.
    pub fn get(&self, id: MutationId) -> Option<&MutationRecord> {
        self.records.get(&id)
    }

    /// Status of the latest mutation whose path is `target` or one of its
    /// ancestors.
    pub fn status_of(&self, target: &str) -> Option<&MutationStatus> {
        self.records
            .values()
            .rev()
            .find(|r| path::is_within(target, &r.path))
            .map(|r| &r.status)
    }

    /// Mutations still waiting for the backend.
    pub fn pending(&self) -> impl Iterator<Item = &MutationRecord> {
        self.records
            .values()
            .filter(|r| r.status == MutationStatus::Pending)
    }

    /// Mutations the backend rejected.
    pub fn failed(&self) -> impl Iterator<Item = &MutationRecord> {
        self.records
            .values()
            .filter(|r| matches!(r.status, MutationStatus::Failed { .. }))
    }

    /// Drop confirmed records; pending and failed ones stay visible.
    pub fn prune_confirmed(&mut self) -> usize {
        let before = self.records.len();
        self.records
            .retain(|_, r| r.status != MutationStatus::Confirmed);
        before - self.records.len()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::NodeKind;

    fn create(parent: &str, name: &str) -> TreeMutation {
        TreeMutation::Create {
            parent_path: parent.into(),
            name: name.into(),
            kind: NodeKind::Directory,
        }
    }

    #[test]
    fn test_issue_and_settle() {
        let mut ledger = MutationLedger::new();
        let a = ledger.issue(create("hello_world", "src2"));
        let b = ledger.issue(create("hello_world", "tests"));
        assert!(b > a);
        assert_eq!(ledger.pending().count(), 2);

        ledger.settle(b, MutationStatus::Confirmed).unwrap();
        ledger
            .settle(
                a,
                MutationStatus::Failed {
                    reason: "disk full".into(),
                },
            )
            .unwrap();

        assert_eq!(ledger.pending().count(), 0);
        assert_eq!(ledger.failed().count(), 1);
        assert!(ledger.get(a).unwrap().settled_at.is_some());
        assert!(ledger.settle(99, MutationStatus::Confirmed).is_none());
    }

    #[test]
    fn test_second_settle_is_ignored() {
        let mut ledger = MutationLedger::new();
        let id = ledger.issue(create("", "a"));
        ledger.settle(id, MutationStatus::Confirmed);
        let record = ledger
            .settle(id, MutationStatus::Failed { reason: "late".into() })
            .unwrap();
        assert_eq!(record.status, MutationStatus::Confirmed);
    }

    #[test]
    fn test_status_of_covers_descendants() {
        let mut ledger = MutationLedger::new();
        ledger.issue(create("hello_world", "src2"));
        assert_eq!(
            ledger.status_of("hello_world/src2/lib.rs"),
            Some(&MutationStatus::Pending)
        );
        assert_eq!(ledger.status_of("hello_world/src"), None);
        assert_eq!(ledger.status_of("hello_world"), None);
    }

    #[test]
    fn test_latest_mutation_wins_status() {
        let mut ledger = MutationLedger::new();
        let first = ledger.issue(create("", "a"));
        ledger.settle(first, MutationStatus::Failed { reason: "x".into() });
        ledger.issue(TreeMutation::Delete { path: "a".into() });
        assert_eq!(ledger.status_of("a"), Some(&MutationStatus::Pending));
    }

    #[test]
    fn test_prune_confirmed() {
        let mut ledger = MutationLedger::new();
        let a = ledger.issue(create("", "a"));
        ledger.issue(create("", "b"));
        ledger.settle(a, MutationStatus::Confirmed);
        assert_eq!(ledger.prune_confirmed(), 1);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_confirmed_records_are_capped() {
        let mut ledger = MutationLedger::with_retention(8);
        let failed = ledger.issue(create("", "broken"));
        ledger.settle(failed, MutationStatus::Failed { reason: "x".into() });
        let pending = ledger.issue(create("", "waiting"));

        for i in 0..1000 {
            let id = ledger.issue(create("", &format!("dir{i}")));
            ledger.settle(id, MutationStatus::Confirmed);
        }

        assert_eq!(ledger.len(), 10);
        assert_eq!(ledger.failed().count(), 1);
        assert_eq!(ledger.get(pending).unwrap().status, MutationStatus::Pending);
        assert_eq!(ledger.status_of("dir999"), Some(&MutationStatus::Confirmed));
        assert_eq!(ledger.status_of("dir0"), None);
    }

    #[test]
    fn test_confirmation_supersedes_older_failure() {
        let mut ledger = MutationLedger::new();
        let first = ledger.issue(create("", "a"));
        ledger.settle(first, MutationStatus::Failed { reason: "x".into() });
        let retry = ledger.issue(create("", "a"));
        ledger.settle(retry, MutationStatus::Confirmed);

        assert!(ledger.get(first).is_none());
        assert_eq!(ledger.failed().count(), 0);
        assert_eq!(ledger.status_of("a/b"), Some(&MutationStatus::Confirmed));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(MutationStatus::Failed {
            reason: "boom".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["reason"], "boom");
    }
}
