pub mod coordinator;
pub mod drop_target;
pub mod engine;
pub mod optimistic;
pub mod reconcile;
pub mod remote;
pub mod selection;
pub mod worker;

pub use coordinator::DragOutcome;
pub use drop_target::{DragEvent, DragKind, DragStart, DropLocation, Droppable};
pub use engine::{EngineError, SyncEngine};
pub use remote::{MemoryStore, RemoteError, RemoteStore};
pub use selection::Selection;
