use crate::board::Board;
use crate::catalog::catalog;
use crate::error::{PipelineError, Result};
use crate::types::Taxonomy;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Drop targets
// ---------------------------------------------------------------------------

/// What the pointer was released over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// A stage column; carries the column's droppable id.
    Stage(String),
    /// Another card; carries that card's record id.
    Card(String),
}

/// How a board treats a drop onto another card rather than onto a column.
///
/// The main pipeline resolves the card to the stage it sits in. The forecast
/// board only accepts column ids, so a card drop falls outside its catalog
/// and is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardTargetPolicy {
    ResolveToStage,
    Ignore,
}

// ---------------------------------------------------------------------------
// StageChange / outcomes
// ---------------------------------------------------------------------------

/// A committed drag, ready to hand to the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageChange {
    pub record_id: String,
    pub taxonomy: Taxonomy,
    pub source: &'static str,
    pub target: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// Released over the dragged card itself.
    OntoSelf,
    /// Target is not a stage of the active taxonomy.
    UnknownTarget,
    /// Target stage is the stage the card already holds.
    SameStage,
    /// A refetch during the drag removed the dragged record.
    RecordGone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    Commit(StageChange),
    Discarded(DiscardReason),
}

// ---------------------------------------------------------------------------
// DragState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragState {
    Idle,
    Dragging {
        record_id: String,
        source: &'static str,
    },
    Hovering {
        record_id: String,
        source: &'static str,
        candidate: String,
    },
    Committed(StageChange),
    Cancelled,
}

impl DragState {
    /// True while a gesture is open (not yet committed or cancelled).
    pub fn is_active(&self) -> bool {
        matches!(self, DragState::Dragging { .. } | DragState::Hovering { .. })
    }

    fn name(&self) -> &'static str {
        match self {
            DragState::Idle => "idle",
            DragState::Dragging { .. } => "dragging",
            DragState::Hovering { .. } => "hovering",
            DragState::Committed(_) => "committed",
            DragState::Cancelled => "cancelled",
        }
    }
}

// ---------------------------------------------------------------------------
// DragController
// ---------------------------------------------------------------------------

/// Owns the lifecycle of a single drag gesture on one board.
///
/// At most one transaction is open at a time. A finished transaction
/// (committed or cancelled) behaves like idle for the next `begin_drag`.
#[derive(Debug)]
pub struct DragController {
    taxonomy: Taxonomy,
    card_targets: CardTargetPolicy,
    state: DragState,
}

impl DragController {
    pub fn new(taxonomy: Taxonomy, card_targets: CardTargetPolicy) -> Self {
        Self {
            taxonomy,
            card_targets,
            state: DragState::Idle,
        }
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Stage currently highlighted as the drop target, if any.
    pub fn candidate(&self) -> Option<&str> {
        match &self.state {
            DragState::Hovering { candidate, .. } => Some(candidate),
            _ => None,
        }
    }

    pub fn begin_drag(&mut self, board: &Board, record_id: &str) -> Result<()> {
        if let DragState::Dragging { record_id: open, .. }
        | DragState::Hovering { record_id: open, .. } = &self.state
        {
            return Err(PipelineError::DragInProgress(open.clone()));
        }
        let record = board
            .find(record_id)
            .ok_or_else(|| PipelineError::OpportunityNotFound(record_id.to_string()))?;
        let source = record.stage_id(self.taxonomy);

        tracing::debug!(record = record_id, source, taxonomy = %self.taxonomy, "drag started");
        self.state = DragState::Dragging {
            record_id: record_id.to_string(),
            source,
        };
        Ok(())
    }

    /// Record the stage under the pointer. Purely a rendering hint.
    pub fn hover(&mut self, candidate: &str) -> Result<()> {
        let (record_id, source) = self.open_transaction()?;
        self.state = DragState::Hovering {
            record_id,
            source,
            candidate: candidate.to_string(),
        };
        Ok(())
    }

    /// Release the open drag over `target`.
    ///
    /// The source stage is re-read from `board`, since a refetch may have
    /// replaced the snapshot the drag started on.
    pub fn drop(&mut self, board: &Board, target: &DropTarget) -> Result<DropOutcome> {
        let (record_id, picked_from) = self.open_transaction()?;
        let Some(source) = board.find(&record_id).map(|r| r.stage_id(self.taxonomy)) else {
            tracing::info!(record = %record_id, "dragged record vanished in a refetch");
            self.state = DragState::Cancelled;
            return Ok(DropOutcome::Discarded(DiscardReason::RecordGone));
        };
        if source != picked_from {
            tracing::info!(
                record = %record_id,
                picked_from,
                now = source,
                "dragged record moved by a refetch"
            );
        }

        let resolved = match target {
            DropTarget::Card(id) if *id == record_id => Err(DiscardReason::OntoSelf),
            DropTarget::Stage(id) => catalog(self.taxonomy)
                .resolve(id)
                .map(|e| e.id)
                .ok_or(DiscardReason::UnknownTarget),
            DropTarget::Card(id) => match self.card_targets {
                CardTargetPolicy::ResolveToStage => board
                    .find(id)
                    .map(|r| r.stage_id(self.taxonomy))
                    .ok_or(DiscardReason::UnknownTarget),
                CardTargetPolicy::Ignore => Err(DiscardReason::UnknownTarget),
            },
        };

        let outcome = match resolved {
            Ok(stage) if stage == source => DropOutcome::Discarded(DiscardReason::SameStage),
            Ok(stage) => DropOutcome::Commit(StageChange {
                record_id,
                taxonomy: self.taxonomy,
                source,
                target: stage,
            }),
            Err(reason) => DropOutcome::Discarded(reason),
        };

        self.state = match &outcome {
            DropOutcome::Commit(change) => {
                tracing::debug!(
                    record = %change.record_id,
                    from = change.source,
                    to = change.target,
                    "drop committed"
                );
                DragState::Committed(change.clone())
            }
            DropOutcome::Discarded(reason) => {
                tracing::debug!(?reason, "drop discarded");
                DragState::Cancelled
            }
        };
        Ok(outcome)
    }

    /// Abandon the open gesture with no side effects.
    pub fn cancel(&mut self) -> Result<()> {
        if !self.state.is_active() {
            return Err(PipelineError::NoActiveDrag);
        }
        tracing::debug!(from = self.state.name(), "drag cancelled");
        self.state = DragState::Cancelled;
        Ok(())
    }

    fn open_transaction(&self) -> Result<(String, &'static str)> {
        match &self.state {
            DragState::Dragging { record_id, source }
            | DragState::Hovering {
                record_id, source, ..
            } => Ok((record_id.clone(), source)),
            _ => Err(PipelineError::NoActiveDrag),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opportunity::Opportunity;
    use crate::types::{ForecastStage, PrimaryStage};

    fn board(taxonomy: Taxonomy) -> Board {
        let mut a = Opportunity::new("a", "A");
        a.stage = PrimaryStage::Sourced;
        let mut b = Opportunity::new("b", "B");
        b.stage = PrimaryStage::Win;
        b.forecast_stage = ForecastStage::HighPriority;
        let c = Opportunity::new("c", "C");
        Board::new(taxonomy, vec![a, b, c])
    }

    fn stage(id: &str) -> DropTarget {
        DropTarget::Stage(id.to_string())
    }

    #[test]
    fn full_lifecycle_commits() {
        let board = board(Taxonomy::Primary);
        let mut ctl = DragController::new(Taxonomy::Primary, CardTargetPolicy::ResolveToStage);
        assert_eq!(ctl.state(), &DragState::Idle);

        ctl.begin_drag(&board, "a").unwrap();
        assert!(ctl.is_active());
        ctl.hover("opp qualified").unwrap();
        assert_eq!(ctl.candidate(), Some("opp qualified"));
        ctl.hover("Win").unwrap();

        let outcome = ctl.drop(&board, &stage("Win")).unwrap();
        let expected = StageChange {
            record_id: "a".to_string(),
            taxonomy: Taxonomy::Primary,
            source: "opp sourced",
            target: "Win",
        };
        assert_eq!(outcome, DropOutcome::Commit(expected.clone()));
        assert_eq!(ctl.state(), &DragState::Committed(expected));
        assert!(!ctl.is_active());
    }

    #[test]
    fn second_begin_drag_is_rejected() {
        let board = board(Taxonomy::Primary);
        let mut ctl = DragController::new(Taxonomy::Primary, CardTargetPolicy::ResolveToStage);
        ctl.begin_drag(&board, "a").unwrap();
        assert!(matches!(
            ctl.begin_drag(&board, "b"),
            Err(PipelineError::DragInProgress(id)) if id == "a"
        ));
        ctl.hover("Win").unwrap();
        assert!(ctl.begin_drag(&board, "b").is_err());

        ctl.cancel().unwrap();
        ctl.begin_drag(&board, "b").unwrap();
    }

    #[test]
    fn same_stage_drop_is_noop() {
        let board = board(Taxonomy::Primary);
        let mut ctl = DragController::new(Taxonomy::Primary, CardTargetPolicy::ResolveToStage);
        ctl.begin_drag(&board, "a").unwrap();
        let outcome = ctl.drop(&board, &stage("opp sourced")).unwrap();
        assert_eq!(outcome, DropOutcome::Discarded(DiscardReason::SameStage));
        assert_eq!(ctl.state(), &DragState::Cancelled);
    }

    #[test]
    fn unknown_stage_drop_is_noop() {
        let board = board(Taxonomy::Forecast);
        let mut ctl = DragController::new(Taxonomy::Forecast, CardTargetPolicy::Ignore);
        ctl.begin_drag(&board, "a").unwrap();
        // A primary stage id is not a forecast column.
        let outcome = ctl.drop(&board, &stage("Win")).unwrap();
        assert_eq!(outcome, DropOutcome::Discarded(DiscardReason::UnknownTarget));
    }

    #[test]
    fn drop_onto_self_is_noop() {
        let board = board(Taxonomy::Primary);
        let mut ctl = DragController::new(Taxonomy::Primary, CardTargetPolicy::ResolveToStage);
        ctl.begin_drag(&board, "a").unwrap();
        let outcome = ctl.drop(&board, &DropTarget::Card("a".into())).unwrap();
        assert_eq!(outcome, DropOutcome::Discarded(DiscardReason::OntoSelf));
    }

    #[test]
    fn primary_board_resolves_card_target_to_its_stage() {
        let board = board(Taxonomy::Primary);
        let mut ctl = DragController::new(Taxonomy::Primary, CardTargetPolicy::ResolveToStage);

        ctl.begin_drag(&board, "a").unwrap();
        let outcome = ctl.drop(&board, &DropTarget::Card("b".into())).unwrap();
        assert!(matches!(outcome, DropOutcome::Commit(ref c) if c.target == "Win"));

        // Card in the same column resolves to the same stage: no-op.
        ctl.begin_drag(&board, "a").unwrap();
        let outcome = ctl.drop(&board, &DropTarget::Card("c".into())).unwrap();
        assert_eq!(outcome, DropOutcome::Discarded(DiscardReason::SameStage));
    }

    #[test]
    fn forecast_board_ignores_card_targets() {
        let board = board(Taxonomy::Forecast);
        let mut ctl = DragController::new(Taxonomy::Forecast, CardTargetPolicy::Ignore);
        ctl.begin_drag(&board, "a").unwrap();
        let outcome = ctl.drop(&board, &DropTarget::Card("b".into())).unwrap();
        assert_eq!(outcome, DropOutcome::Discarded(DiscardReason::UnknownTarget));

        ctl.begin_drag(&board, "a").unwrap();
        let outcome = ctl.drop(&board, &stage("High Priority")).unwrap();
        assert!(matches!(
            outcome,
            DropOutcome::Commit(ref c) if c.source == "Source" && c.target == "High Priority"
        ));
    }

    #[test]
    fn operations_without_open_drag_fail() {
        let board = board(Taxonomy::Primary);
        let mut ctl = DragController::new(Taxonomy::Primary, CardTargetPolicy::ResolveToStage);
        assert!(matches!(ctl.hover("Win"), Err(PipelineError::NoActiveDrag)));
        assert!(matches!(
            ctl.drop(&board, &stage("Win")),
            Err(PipelineError::NoActiveDrag)
        ));
        assert!(matches!(ctl.cancel(), Err(PipelineError::NoActiveDrag)));
    }

    #[test]
    fn drop_after_record_removed_is_discarded() {
        let mut board = board(Taxonomy::Primary);
        let mut ctl = DragController::new(Taxonomy::Primary, CardTargetPolicy::ResolveToStage);
        ctl.begin_drag(&board, "a").unwrap();

        let rest = board.records().iter().filter(|r| r.id != "a").cloned().collect();
        board.replace(rest);

        let outcome = ctl.drop(&board, &stage("Win")).unwrap();
        assert_eq!(outcome, DropOutcome::Discarded(DiscardReason::RecordGone));
        assert_eq!(ctl.state(), &DragState::Cancelled);
    }

    #[test]
    fn drop_uses_stage_from_latest_snapshot() {
        let mut board = board(Taxonomy::Primary);
        let mut ctl = DragController::new(Taxonomy::Primary, CardTargetPolicy::ResolveToStage);
        ctl.begin_drag(&board, "a").unwrap();

        let mut moved = board.records().to_vec();
        moved[0].stage = PrimaryStage::Win;
        board.replace(moved);

        // Someone else already moved it to Win.
        let outcome = ctl.drop(&board, &stage("Win")).unwrap();
        assert_eq!(outcome, DropOutcome::Discarded(DiscardReason::SameStage));

        ctl.begin_drag(&board, "a").unwrap();
        let outcome = ctl.drop(&board, &stage("lost")).unwrap();
        assert!(matches!(outcome, DropOutcome::Commit(ref c) if c.source == "Win"));
    }

    #[test]
    fn begin_drag_unknown_record() {
        let board = board(Taxonomy::Primary);
        let mut ctl = DragController::new(Taxonomy::Primary, CardTargetPolicy::ResolveToStage);
        assert!(matches!(
            ctl.begin_drag(&board, "nope"),
            Err(PipelineError::OpportunityNotFound(_))
        ));
        assert_eq!(ctl.state(), &DragState::Idle);
    }
}
