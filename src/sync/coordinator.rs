use tracing::{debug, info};

use crate::model::board::Board;
use crate::model::mutation::Mutation;
use crate::ops::board_ops::{move_cards, move_list};
use crate::ops::calendar_ops::place_on_calendar;
use crate::ops::BoardError;

use super::drop_target::{classify, DragEvent, DragKind, DragStart, DropTarget};
use super::engine::{EngineError, SyncEngine};
use super::reconcile::SuspendToken;
use super::worker::MutationId;

/// Drag gesture in progress, if any
#[derive(Debug, Default)]
pub(super) enum DragState {
    #[default]
    Idle,
    Dragging {
        token: SuspendToken,
        dragged_id: String,
        kind: DragKind,
    },
}

/// How a drag gesture ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragOutcome {
    /// Dropped outside any droppable
    Cancelled,
    /// Dropped back where it started
    Unchanged,
    /// The drop does not apply to the current board
    Ignored(String),
    /// Local transform written, remote call issued
    Dispatched(MutationId),
}

impl SyncEngine {
    /// Freeze the visual board for the length of a drag.
    ///
    /// Dragging an unselected card makes it the only selected card.
    pub fn on_drag_start(&mut self, start: DragStart) -> Result<(), EngineError> {
        if self.is_dragging() {
            return Err(EngineError::DragInProgress);
        }
        let token = self.reconciler.suspend()?;
        if start.kind == DragKind::Card && !self.selection.contains(&start.dragged_id) {
            self.selection.select_only(&start.dragged_id);
        }
        debug!(dragged = %start.dragged_id, kind = ?start.kind, "drag started");
        self.drag = DragState::Dragging {
            token,
            dragged_id: start.dragged_id,
            kind: start.kind,
        };
        Ok(())
    }

    /// Commit (or abandon) the drag and lift the freeze.
    ///
    /// The reconciler is resumed without discarding on every path. When the
    /// drop dispatches nothing and an authoritative value was deferred during
    /// the drag (a rollback or a refetch), the board is refetched so the
    /// visual value converges.
    pub fn on_drag_end(&mut self, event: DragEvent) -> Result<DragOutcome, EngineError> {
        let DragState::Dragging {
            token,
            dragged_id,
            kind,
        } = std::mem::take(&mut self.drag)
        else {
            debug!(dragged = %event.dragged_id, "drag end without a drag in progress");
            return Ok(DragOutcome::Ignored("no drag in progress".into()));
        };

        let outcome = if dragged_id != event.dragged_id || kind != event.kind {
            DragOutcome::Ignored(format!(
                "drag started on {:?} {} but ended on {:?} {}",
                kind, dragged_id, event.kind, event.dragged_id
            ))
        } else {
            self.finish_drop(&event)
        };
        self.reconciler.resume(token, false)?;

        match &outcome {
            DragOutcome::Dispatched(id) => info!(id, dragged = %event.dragged_id, "drop committed"),
            other => {
                debug!(dragged = %event.dragged_id, outcome = ?other, "drop not committed");
                if self.reconciler.has_deferred() {
                    debug!("authoritative update deferred during drag, refetching");
                    self.invalidate();
                }
            }
        }
        Ok(outcome)
    }

    fn finish_drop(&mut self, event: &DragEvent) -> DragOutcome {
        let Some(destination) = &event.destination else {
            return DragOutcome::Cancelled;
        };
        if event.is_in_place() {
            return DragOutcome::Unchanged;
        }
        let Some(target) = classify(event.kind, destination) else {
            return DragOutcome::Ignored(format!(
                "{:?} cannot be dropped on {}",
                event.kind, destination.droppable
            ));
        };
        let Some(board) = self.reconciler.current().cloned() else {
            return DragOutcome::Ignored("no board loaded".into());
        };

        match self.plan_drop(&board, &event.dragged_id, target) {
            Ok((next, mutation)) => {
                self.reconciler.set_visual(next);
                let id = self.dispatch(mutation);
                self.selection.clear();
                DragOutcome::Dispatched(id)
            }
            Err(e) => DragOutcome::Ignored(e.to_string()),
        }
    }

    /// New visual board and the mutation that reproduces it remotely
    fn plan_drop(
        &mut self,
        board: &Board,
        dragged_id: &str,
        target: DropTarget,
    ) -> Result<(Board, Mutation), BoardError> {
        match target {
            DropTarget::ListSlot { index } => {
                let from = board
                    .list_position(dragged_id)
                    .ok_or_else(|| BoardError::ListNotFound(dragged_id.to_string()))?;
                let next = move_list(board, from, index)?;
                Ok((
                    next,
                    Mutation::MoveList {
                        list_id: dragged_id.to_string(),
                        new_index: index,
                    },
                ))
            }
            DropTarget::CardSlot { list_id, index } => {
                let ids = self.selection.ordered_for_drag(board, dragged_id);
                let next = move_cards(board, &ids, &list_id, index)?;
                let mutation = match <[String; 1]>::try_from(ids) {
                    Ok([card_id]) => Mutation::MoveCard {
                        card_id,
                        list_id,
                        new_index: index,
                    },
                    Err(card_ids) => Mutation::BulkMoveCards {
                        card_ids,
                        list_id,
                        start_index: index,
                    },
                };
                Ok((next, mutation))
            }
            DropTarget::DateBucket { date, index } => self.plan_calendar(board, dragged_id, Some(date), index),
            DropTarget::Unscheduled { index } => self.plan_calendar(board, dragged_id, None, index),
        }
    }

    fn plan_calendar(
        &mut self,
        board: &Board,
        dragged_id: &str,
        bucket: Option<chrono::NaiveDate>,
        index: usize,
    ) -> Result<(Board, Mutation), BoardError> {
        let ids = self.selection.ordered_for_drag(board, dragged_id);
        let (next, updates) = place_on_calendar(board, &ids, bucket, index, &self.calendar)?;
        Ok((next, Mutation::BulkUpdateCards { updates }))
    }
}
