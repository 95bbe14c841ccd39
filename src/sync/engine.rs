use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, info, trace, warn};

use crate::model::board::Board;
use crate::model::config::CalendarConfig;
use crate::model::mutation::Mutation;
use crate::ops::apply::applied;

use super::coordinator::DragState;
use super::optimistic::{Notice, OptimisticMutation, QueryCache, RollbackContext};
use super::reconcile::{ReconcileError, Reconciler};
use super::remote::{RemoteError, RemoteStore};
use super::selection::Selection;
use super::worker::{Completion, MutationId, MutationWorker, Request};

/// Error type for engine operations
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("timed out waiting for {pending} remote call(s) to settle")]
    Timeout { pending: usize },
    #[error("remote worker stopped")]
    WorkerStopped,
    #[error("a drag is already in progress")]
    DragInProgress,
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// Local copy of the authoritative board, as last fetched or optimistically
/// updated.
#[derive(Debug, Default)]
pub(super) struct BoardCache {
    pub(super) data: Option<Board>,
    /// Bumped by cancel/invalidate; fetch results from older generations are dropped
    pub(super) generation: u64,
    /// Fetch requests submitted and not yet answered (any generation)
    pub(super) outstanding_fetches: usize,
}

/// Rollback bookkeeping for one in-flight mutation
struct PendingMutation {
    protocol: OptimisticMutation<Mutation, Board>,
    context: RollbackContext<Board>,
}

/// `QueryCache` view over the engine: writes to the cache are forwarded to
/// the reconciler as authoritative observations.
struct CacheHandle<'a> {
    cache: &'a mut BoardCache,
    reconciler: &'a mut Reconciler<Board>,
    worker: &'a MutationWorker,
}

impl QueryCache<Board> for CacheHandle<'_> {
    fn cancel(&mut self) {
        self.cache.generation += 1;
        trace!(generation = self.cache.generation, "in-flight fetches cancelled");
    }

    fn current(&self) -> Option<Board> {
        self.cache.data.clone()
    }

    fn set_current(&mut self, value: Option<Board>) {
        self.cache.data = value.clone();
        if let Some(board) = value {
            self.reconciler.observe(board);
        }
    }

    fn invalidate(&mut self) {
        self.cache.generation += 1;
        let generation = self.cache.generation;
        if self.worker.submit(Request::Fetch { generation }) {
            self.cache.outstanding_fetches += 1;
        } else {
            warn!("remote worker gone, cannot refetch");
        }
    }
}

/// The optimistic synchronization engine.
///
/// Owns the visual board (through the reconciler), the cache of the
/// authoritative board, the selection and the drag state. Remote calls run on
/// a [`MutationWorker`]; call [`SyncEngine::poll`] each tick (or
/// [`SyncEngine::wait_idle`]) to process their completions.
pub struct SyncEngine {
    pub(super) reconciler: Reconciler<Board>,
    pub(super) cache: BoardCache,
    pub(super) selection: Selection,
    pub(super) drag: DragState,
    pub(super) calendar: CalendarConfig,
    worker: MutationWorker,
    pending: HashMap<MutationId, PendingMutation>,
    next_id: MutationId,
    notices: Vec<Notice>,
}

impl SyncEngine {
    /// Start the worker for `store` and request the first board.
    pub fn new(store: impl RemoteStore, calendar: CalendarConfig) -> Self {
        let mut engine = SyncEngine {
            reconciler: Reconciler::new(),
            cache: BoardCache::default(),
            selection: Selection::new(),
            drag: DragState::Idle,
            calendar,
            worker: MutationWorker::spawn(store),
            pending: HashMap::new(),
            next_id: 1,
            notices: Vec::new(),
        };
        engine.invalidate();
        engine
    }

    fn cache_handle(&mut self) -> CacheHandle<'_> {
        CacheHandle {
            cache: &mut self.cache,
            reconciler: &mut self.reconciler,
            worker: &self.worker,
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// The board to render
    pub fn current(&self) -> Option<&Board> {
        self.reconciler.current()
    }

    /// The cached authoritative board (including optimistic writes)
    pub fn cached(&self) -> Option<&Board> {
        self.cache.data.as_ref()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn is_dragging(&self) -> bool {
        !matches!(self.drag, DragState::Idle)
    }

    pub fn is_suspended(&self) -> bool {
        self.reconciler.is_suspended()
    }

    pub fn pending_mutations(&self) -> usize {
        self.pending.len()
    }

    /// No mutation in flight and no fetch outstanding
    pub fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.cache.outstanding_fetches == 0
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    pub fn toggle_selection(&mut self, card_id: &str) -> bool {
        self.selection.toggle(card_id)
    }

    pub fn select_range(&mut self, from: &str, to: &str) {
        if let Some(board) = self.reconciler.current() {
            self.selection.select_range(board, from, to);
        }
    }

    pub fn extend_selection(&mut self, card_id: &str) {
        if let Some(board) = self.reconciler.current() {
            self.selection.extend_to(board, card_id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Mark the cached board stale and refetch it. Called when the
    /// authoritative source is known to have changed.
    pub fn invalidate(&mut self) {
        self.cache_handle().invalidate();
    }

    /// Run a mutation through the optimistic protocol.
    pub fn mutate(&mut self, mutation: Mutation) -> MutationId {
        self.dispatch(mutation)
    }

    pub(super) fn dispatch(&mut self, mutation: Mutation) -> MutationId {
        let id = self.next_id;
        self.next_id += 1;

        let protocol = OptimisticMutation::new(mutation.name(), |board: &Board, m: &Mutation| {
            applied(board, m).ok()
        });
        let context = protocol.on_mutate(&mut self.cache_handle(), &mutation);
        self.pending.insert(id, PendingMutation { protocol, context });

        let name = mutation.name();
        if self.worker.submit(Request::Mutate { id, mutation }) {
            debug!(id, mutation = name, "mutation dispatched");
        } else {
            self.complete_mutation(id, Err(RemoteError::Unavailable("remote worker stopped".into())));
        }
        id
    }

    // -----------------------------------------------------------------------
    // Completions
    // -----------------------------------------------------------------------

    /// Process every completion that has arrived. Returns how many.
    pub fn poll(&mut self) -> usize {
        let completions = self.worker.poll();
        let n = completions.len();
        for completion in completions {
            self.handle_completion(completion);
        }
        n
    }

    /// Process completions until nothing is in flight.
    pub fn wait_idle(&mut self, timeout: Duration) -> Result<(), EngineError> {
        let deadline = Instant::now() + timeout;
        while !self.is_idle() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.worker.recv_timeout(remaining) {
                Some(completion) => self.handle_completion(completion),
                None if !self.worker.is_alive() => return Err(EngineError::WorkerStopped),
                None => {
                    return Err(EngineError::Timeout {
                        pending: self.pending.len() + self.cache.outstanding_fetches,
                    });
                }
            }
        }
        Ok(())
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Fetched { generation, result } => {
                self.cache.outstanding_fetches = self.cache.outstanding_fetches.saturating_sub(1);
                if generation != self.cache.generation {
                    trace!(generation, current = self.cache.generation, "stale fetch dropped");
                    return;
                }
                match result {
                    Ok(board) => {
                        debug!(generation, "authoritative board received");
                        self.cache_handle().set_current(Some(board));
                    }
                    Err(e) => {
                        warn!(error = %e, "board fetch failed");
                        self.notices.push(Notice::failure("fetch-board", &e));
                    }
                }
            }
            Completion::Mutated { id, result } => self.complete_mutation(id, result),
        }
    }

    fn complete_mutation(&mut self, id: MutationId, result: Result<(), RemoteError>) {
        let Some(PendingMutation { protocol, context }) = self.pending.remove(&id) else {
            warn!(id, "completion for unknown mutation");
            return;
        };
        match result {
            Ok(()) => info!(id, mutation = protocol.name(), "mutation committed"),
            Err(e) => {
                let notice = protocol.on_error(&mut self.cache_handle(), context, &e);
                self.notices.push(notice);
            }
        }
        protocol.on_settled(&mut self.cache_handle());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::card::{Card, CardPatch};
    use crate::model::list::List;
    use crate::sync::remote::MemoryStore;
    use pretty_assertions::assert_eq;

    const WAIT: Duration = Duration::from_secs(5);

    fn sample_board() -> Board {
        Board::new("b", "Sprint").with_lists(vec![
            List::new("A", "Todo").with_cards(vec![Card::new("c1", "one"), Card::new("c2", "two")]),
            List::new("B", "Doing"),
        ])
    }

    fn loaded_engine() -> (SyncEngine, MemoryStore) {
        let store = MemoryStore::new(sample_board());
        let mut engine = SyncEngine::new(store.clone(), CalendarConfig::default());
        engine.wait_idle(WAIT).unwrap();
        (engine, store)
    }

    #[test]
    fn first_fetch_populates_visual() {
        let (engine, _) = loaded_engine();
        assert_eq!(engine.current(), Some(&sample_board()));
        assert_eq!(engine.cached(), Some(&sample_board()));
    }

    #[test]
    fn mutate_applies_optimistically_before_remote() {
        let (mut engine, store) = loaded_engine();
        engine.mutate(Mutation::UpdateCard {
            card_id: "c1".into(),
            patch: CardPatch {
                title: Some("renamed".into()),
                ..Default::default()
            },
        });
        // visible immediately, without processing any completion
        assert_eq!(engine.current().unwrap().card("c1").unwrap().title, "renamed");
        engine.wait_idle(WAIT).unwrap();
        assert_eq!(store.board().unwrap().card("c1").unwrap().title, "renamed");
        assert_eq!(engine.current(), store.board().as_ref());
        assert!(engine.notices().is_empty());
    }

    #[test]
    fn failed_mutation_rolls_back_and_notifies() {
        let (mut engine, store) = loaded_engine();
        let before = engine.current().cloned();
        store.fail_next(RemoteError::Unavailable("offline".into()));
        engine.mutate(Mutation::DeleteCard {
            card_id: "c1".into(),
        });
        assert!(engine.current().unwrap().card("c1").is_none());

        engine.wait_idle(WAIT).unwrap();
        assert_eq!(engine.current().cloned(), before);
        let notices = engine.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].mutation, "delete-card");
        assert_eq!(notices[0].message, "unavailable: offline");
    }

    #[test]
    fn settle_adopts_server_truth() {
        let (mut engine, store) = loaded_engine();
        // another client changed the board meanwhile
        let mut remote = sample_board();
        remote.lists[1].title = "In progress".into();
        store.replace_board(remote);

        engine.mutate(Mutation::RenameList {
            list_id: "A".into(),
            title: "Backlog".into(),
        });
        engine.wait_idle(WAIT).unwrap();
        let current = engine.current().unwrap();
        assert_eq!(current.lists[0].title, "Backlog");
        assert_eq!(current.lists[1].title, "In progress");
    }

    #[test]
    fn pre_apply_cancels_in_flight_fetch() {
        let store = MemoryStore::new(sample_board());
        let mut engine = SyncEngine::new(store.clone(), CalendarConfig::default());
        engine.wait_idle(WAIT).unwrap();

        // a refetch is in flight when the optimistic write happens
        engine.invalidate();
        engine.mutate(Mutation::RenameList {
            list_id: "B".into(),
            title: "Doing now".into(),
        });
        assert_eq!(engine.current().unwrap().lists[1].title, "Doing now");
        engine.wait_idle(WAIT).unwrap();
        assert_eq!(engine.current().unwrap().lists[1].title, "Doing now");
    }

    #[test]
    fn rejected_mutation_is_rolled_back() {
        let (mut engine, _) = loaded_engine();
        engine.mutate(Mutation::AddCard {
            list_id: "B".into(),
            card_id: "c1".into(),
            title: "dup".into(),
        });
        engine.wait_idle(WAIT).unwrap();
        assert_eq!(engine.current(), Some(&sample_board()));
        // the local apply failed too, so there was nothing to undo, but the
        // server rejection is still reported
        assert_eq!(engine.notices().len(), 1);
    }
}
