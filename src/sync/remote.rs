use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::model::board::Board;
use crate::model::mutation::Mutation;
use crate::ops::apply::apply_mutation;
use crate::ops::board_ops::BoardError;

/// Error type for calls against the authoritative store
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
    #[error("store has no board yet")]
    Empty,
}

impl From<BoardError> for RemoteError {
    fn from(e: BoardError) -> Self {
        RemoteError::Rejected(e.to_string())
    }
}

/// The authoritative board owner.
///
/// Implementations run on the mutation worker thread, one call at a time,
/// in issue order.
pub trait RemoteStore: Send + 'static {
    fn fetch_board(&mut self) -> Result<Board, RemoteError>;
    fn apply(&mut self, mutation: &Mutation) -> Result<(), RemoteError>;
}

#[derive(Debug, Default)]
struct MemoryInner {
    board: Option<Board>,
    failures: VecDeque<RemoteError>,
    applied: Vec<Mutation>,
}

/// In-memory store shared between the worker and its creator.
///
/// Clones share state, so a test can keep a handle to inspect the
/// authoritative board or inject failures.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new(board: Board) -> Self {
        MemoryStore {
            inner: Arc::new(Mutex::new(MemoryInner {
                board: Some(board),
                ..Default::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        // a panic while holding the lock leaves plain data behind; keep going
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the authoritative board
    pub fn board(&self) -> Option<Board> {
        self.lock().board.clone()
    }

    /// Replace the authoritative board, as another client would.
    pub fn replace_board(&self, board: Board) {
        self.lock().board = Some(board);
    }

    /// Make the next mutation call fail with `error`. Queued failures are
    /// consumed in order.
    pub fn fail_next(&self, error: RemoteError) {
        self.lock().failures.push_back(error);
    }

    /// Mutations accepted so far, in the order they were applied
    pub fn applied(&self) -> Vec<Mutation> {
        self.lock().applied.clone()
    }
}

impl RemoteStore for MemoryStore {
    fn fetch_board(&mut self) -> Result<Board, RemoteError> {
        self.lock().board.clone().ok_or(RemoteError::Empty)
    }

    fn apply(&mut self, mutation: &Mutation) -> Result<(), RemoteError> {
        let mut inner = self.lock();
        if let Some(error) = inner.failures.pop_front() {
            return Err(error);
        }
        let board = inner.board.as_mut().ok_or(RemoteError::Empty)?;
        apply_mutation(board, mutation)?;
        inner.applied.push(mutation.clone());
        Ok(())
    }
}
