use crate::board::{Board, Partition};
use crate::config::Config;
use crate::drag::{DragController, DropOutcome, DropTarget, StageChange};
use crate::error::Result;
use crate::gesture::{GestureEvent, GestureTracker, PointerKind};
use crate::invalidation::{InvalidationHub, Subscription};
use crate::reconcile::{
    Notifier, PendingCommit, ReconcilePolicy, Reconciler, RecordSource, Settlement, StageUpdater,
};
use crate::types::{Severity, Taxonomy};

pub const EXTERNAL_UPDATE_MESSAGE: &str = "Pipeline updated externally";

/// One hosted board view: the local snapshot plus everything that moves
/// cards on it and keeps it in step with the backend.
pub struct BoardSession<B, N> {
    board: Board,
    drag: DragController,
    gestures: GestureTracker,
    reconciler: Reconciler,
    backend: B,
    notifier: N,
    subscription: Option<Subscription>,
    needs_refresh: bool,
}

impl<B, N> BoardSession<B, N>
where
    B: RecordSource + StageUpdater,
    N: Notifier,
{
    /// Mount a board view and load its first snapshot.
    pub fn open(taxonomy: Taxonomy, config: &Config, backend: B, notifier: N) -> Result<Self> {
        let board_cfg = config.board(taxonomy);
        let records = backend.fetch_records()?;
        Ok(Self {
            board: Board::new(taxonomy, records),
            drag: DragController::new(taxonomy, board_cfg.card_target),
            gestures: GestureTracker::new(config.gestures.clone()),
            reconciler: Reconciler::new(board_cfg),
            backend,
            notifier,
            subscription: None,
            needs_refresh: false,
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn partition(&self) -> Partition<'_> {
        self.board.partition()
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn policy(&self) -> ReconcilePolicy {
        self.reconciler.policy()
    }

    /// True after a rejected update that could not be repaired by a refetch.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh
    }

    // -----------------------------------------------------------------------
    // Snapshot
    // -----------------------------------------------------------------------

    /// Replace local state with a fresh server snapshot.
    pub fn refresh(&mut self) -> Result<()> {
        let records = self.backend.fetch_records()?;
        self.board.replace(records);
        self.needs_refresh = false;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Invalidation
    // -----------------------------------------------------------------------

    /// Subscribe this view to remote-change signals. A view holds at most one
    /// subscription; attaching again keeps the existing one.
    pub fn attach(&mut self, hub: &InvalidationHub) {
        if self.subscription.is_some() {
            tracing::debug!("board already subscribed to invalidations");
            return;
        }
        self.subscription = Some(hub.subscribe());
    }

    pub fn detach(&mut self) {
        self.subscription = None;
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Handle queued invalidation signals. Returns true if any arrived.
    ///
    /// The refetch supersedes any optimistic state still on the board,
    /// including a move whose confirmation has not come back yet.
    pub fn pump_invalidations(&mut self) -> bool {
        let signalled = self
            .subscription
            .as_mut()
            .map(Subscription::take_pending)
            .unwrap_or(false);
        if !signalled {
            return false;
        }

        tracing::info!(
            taxonomy = %self.board.taxonomy(),
            in_flight = self.reconciler.in_flight(),
            "external change signalled, refetching"
        );
        if let Err(e) = self.refresh() {
            tracing::warn!("refetch after invalidation failed: {e}");
            self.needs_refresh = true;
        }
        self.notifier.notify(EXTERNAL_UPDATE_MESSAGE, Severity::Info);
        true
    }

    // -----------------------------------------------------------------------
    // Gestures
    // -----------------------------------------------------------------------

    pub fn press(&mut self, record_id: &str, kind: PointerKind, x: f64, y: f64) {
        self.gestures.press(record_id, kind, x, y);
    }

    pub fn motion(&mut self, x: f64, y: f64) -> Result<GestureEvent> {
        self.gestures.motion(x, y, &mut self.drag, &self.board)
    }

    pub fn release(&mut self, at_ms: u64) -> GestureEvent {
        self.gestures.release(at_ms)
    }

    // -----------------------------------------------------------------------
    // Drag transaction
    // -----------------------------------------------------------------------

    pub fn begin_drag(&mut self, record_id: &str) -> Result<()> {
        self.drag.begin_drag(&self.board, record_id)
    }

    pub fn hover(&mut self, candidate: &str) -> Result<()> {
        self.drag.hover(candidate)
    }

    pub fn cancel(&mut self) -> Result<()> {
        self.drag.cancel()
    }

    /// Finish the open drag. A valid move is committed through the
    /// reconciler; a discarded drop returns `None` and touches nothing.
    ///
    /// A move the board can no longer apply lost a race with a refetch.
    /// That is a discard too: the fresh snapshot already wins.
    pub fn drop(&mut self, target: &DropTarget) -> Result<Option<Settlement>> {
        let change = match self.drag.drop(&self.board, target)? {
            DropOutcome::Commit(change) => change,
            DropOutcome::Discarded(_) => return Ok(None),
        };
        let pending = match self.begin_commit(change) {
            Ok(pending) => pending,
            Err(e) => {
                tracing::info!("drop superseded by refetch: {e}");
                return Ok(None);
            }
        };
        let outcome = self.send(&pending);
        Ok(Some(self.settle(pending, outcome)))
    }

    // -----------------------------------------------------------------------
    // Reconciliation
    // -----------------------------------------------------------------------

    /// Apply a move locally without contacting the server yet.
    pub fn begin_commit(&mut self, change: StageChange) -> Result<PendingCommit> {
        self.reconciler.begin(&mut self.board, change)
    }

    /// Send a pending move to the server.
    pub fn send(&self, pending: &PendingCommit) -> Result<()> {
        self.backend.update_stage(
            &pending.change.record_id,
            pending.change.taxonomy,
            pending.change.target,
        )
    }

    pub fn settle(&mut self, pending: PendingCommit, outcome: Result<()>) -> Settlement {
        let settlement = self.reconciler.settle(
            &mut self.board,
            pending,
            outcome,
            Some(&self.backend),
            &self.notifier,
        );
        match settlement {
            Settlement::Stale => self.needs_refresh = true,
            Settlement::Repaired => self.needs_refresh = false,
            Settlement::Confirmed => {}
        }
        settlement
    }

    pub fn commit(&mut self, change: StageChange) -> Result<Settlement> {
        let pending = self.begin_commit(change)?;
        let outcome = self.send(&pending);
        Ok(self.settle(pending, outcome))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
