use crate::board::Board;
use crate::catalog::catalog;
use crate::config::BoardConfig;
use crate::drag::StageChange;
use crate::error::Result;
use crate::opportunity::Opportunity;
use crate::types::{Severity, Taxonomy};
use serde::{Deserialize, Serialize};

pub const REVERT_MESSAGE: &str = "Failed to update stage. Reverting.";
pub const DEFER_MESSAGE: &str = "Failed to update stage.";

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Full list of records for the caller's tenant.
pub trait RecordSource {
    fn fetch_records(&self) -> Result<Vec<Opportunity>>;
}

/// Authoritative stage mutation. Any `Err` means "did not succeed".
pub trait StageUpdater {
    fn update_stage(&self, record_id: &str, taxonomy: Taxonomy, stage_id: &str) -> Result<()>;
}

/// External toast/banner surface.
pub trait Notifier {
    fn notify(&self, message: &str, severity: Severity);
}

// ---------------------------------------------------------------------------
// ReconcilePolicy
// ---------------------------------------------------------------------------

/// What a board does when the server rejects an optimistic move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePolicy {
    /// Roll the card back locally, then refetch.
    StrictRevert,
    /// Leave local state alone and let the next refetch decide.
    DeferToNextFetch,
}

// ---------------------------------------------------------------------------
// PendingCommit / Settlement
// ---------------------------------------------------------------------------

/// An optimistic move whose server confirmation is still outstanding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCommit {
    pub seq: u64,
    pub change: StageChange,
    /// Board generation the optimistic edit was applied against.
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Server accepted; the optimistic state is the confirmed state.
    Confirmed,
    /// Server rejected; the board was reloaded from a fresh snapshot.
    Repaired,
    /// Server rejected and no fresh snapshot could be obtained. The board
    /// must be refetched before it can be trusted again.
    Stale,
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Reconciler {
    policy: ReconcilePolicy,
    success_toast: bool,
    next_seq: u64,
    in_flight: Vec<u64>,
}

impl Reconciler {
    pub fn new(config: &BoardConfig) -> Self {
        Self {
            policy: config.policy,
            success_toast: config.success_toast,
            next_seq: 1,
            in_flight: Vec::new(),
        }
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.policy
    }

    /// Number of commits sent but not yet settled.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Apply `change` to the local board immediately.
    pub fn begin(&mut self, board: &mut Board, change: StageChange) -> Result<PendingCommit> {
        board.apply_stage(&change.record_id, change.target)?;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.in_flight.push(seq);
        tracing::debug!(seq, record = %change.record_id, to = change.target, "optimistic move applied");
        Ok(PendingCommit {
            seq,
            change,
            generation: board.generation(),
        })
    }

    /// Resolve a pending commit with the server's answer.
    ///
    /// A failure is reported through `notifier` exactly once and never
    /// returned to the caller.
    pub fn settle(
        &mut self,
        board: &mut Board,
        pending: PendingCommit,
        outcome: Result<()>,
        source: Option<&dyn RecordSource>,
        notifier: &dyn Notifier,
    ) -> Settlement {
        self.in_flight.retain(|s| *s != pending.seq);
        let change = &pending.change;

        let err = match outcome {
            Ok(()) => {
                tracing::info!(
                    record = %change.record_id,
                    taxonomy = %change.taxonomy,
                    from = change.source,
                    to = change.target,
                    "stage change confirmed"
                );
                if self.success_toast {
                    let label = catalog(change.taxonomy)
                        .label_of(change.target)
                        .unwrap_or(change.target);
                    notifier.notify(&format!("Moved to {label}"), Severity::Success);
                }
                return Settlement::Confirmed;
            }
            Err(e) => e,
        };

        tracing::warn!(
            record = %change.record_id,
            to = change.target,
            policy = ?self.policy,
            "stage update rejected: {err}"
        );

        match self.policy {
            ReconcilePolicy::StrictRevert => {
                notifier.notify(REVERT_MESSAGE, Severity::Error);
                // A refetch since `begin` already replaced the optimistic
                // edit; rolling back would clobber fresher data.
                if board.generation() == pending.generation {
                    if let Err(e) = board.apply_stage(&change.record_id, change.source) {
                        tracing::debug!("local rollback skipped: {e}");
                    }
                }
            }
            ReconcilePolicy::DeferToNextFetch => {
                notifier.notify(DEFER_MESSAGE, Severity::Error);
            }
        }

        match source.map(|s| s.fetch_records()) {
            Some(Ok(records)) => {
                board.replace(records);
                Settlement::Repaired
            }
            Some(Err(e)) => {
                tracing::warn!("refetch after rejected update failed: {e}");
                Settlement::Stale
            }
            None => Settlement::Stale,
        }
    }

    /// Optimistically apply `change`, send it, and settle the result.
    pub fn commit(
        &mut self,
        board: &mut Board,
        change: StageChange,
        updater: &dyn StageUpdater,
        source: Option<&dyn RecordSource>,
        notifier: &dyn Notifier,
    ) -> Result<Settlement> {
        let pending = self.begin(board, change)?;
        let outcome = updater.update_stage(
            &pending.change.record_id,
            pending.change.taxonomy,
            pending.change.target,
        );
        Ok(self.settle(board, pending, outcome, source, notifier))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
