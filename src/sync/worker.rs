use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::model::board::Board;
use crate::model::mutation::Mutation;

use super::remote::{RemoteError, RemoteStore};

/// Identifier of one dispatched mutation
pub type MutationId = u64;

/// Work sent to the worker thread.
#[derive(Debug)]
pub enum Request {
    Fetch { generation: u64 },
    Mutate { id: MutationId, mutation: Mutation },
    Shutdown,
}

/// Completion messages posted back by the worker thread.
#[derive(Debug)]
pub enum Completion {
    Fetched {
        generation: u64,
        result: Result<Board, RemoteError>,
    },
    Mutated {
        id: MutationId,
        result: Result<(), RemoteError>,
    },
}

/// Background thread owning the remote store.
///
/// Requests are served strictly in issue order. Completions are queued on a
/// channel; `poll()` should be called each tick.
pub struct MutationWorker {
    tx: Sender<Request>,
    rx: Receiver<Completion>,
    handle: Option<JoinHandle<()>>,
}

impl MutationWorker {
    pub fn spawn<S: RemoteStore>(mut store: S) -> Self {
        let (tx, request_rx) = mpsc::channel::<Request>();
        let (completion_tx, rx) = mpsc::channel::<Completion>();

        let handle = thread::Builder::new()
            .name("boardsync-remote".to_string())
            .spawn(move || {
                for request in request_rx {
                    let completion = match request {
                        Request::Fetch { generation } => {
                            trace!(generation, "fetching board");
                            Completion::Fetched {
                                generation,
                                result: store.fetch_board(),
                            }
                        }
                        Request::Mutate { id, mutation } => {
                            debug!(id, mutation = mutation.name(), "applying mutation remotely");
                            Completion::Mutated {
                                id,
                                result: store.apply(&mutation),
                            }
                        }
                        Request::Shutdown => break,
                    };
                    if completion_tx.send(completion).is_err() {
                        // engine dropped; nobody is listening
                        break;
                    }
                }
            })
            .ok();
        if handle.is_none() {
            warn!("could not spawn remote worker thread");
        }

        MutationWorker { tx, rx, handle }
    }

    /// Queue a request. Returns false if the worker is gone.
    pub fn submit(&self, request: Request) -> bool {
        self.tx.send(request).is_ok()
    }

    /// Non-blocking poll for completions.
    /// Returns all queued completions (may be empty).
    pub fn poll(&self) -> Vec<Completion> {
        let mut out = Vec::new();
        while let Ok(c) = self.rx.try_recv() {
            out.push(c);
        }
        out
    }

    /// Block for the next completion, up to `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Completion> {
        match self.rx.recv_timeout(timeout) {
            Ok(c) => Some(c),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for MutationWorker {
    fn drop(&mut self) {
        let _ = self.tx.send(Request::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
