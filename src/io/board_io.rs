use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::io::lock::{FileLock, LockError};
use crate::model::board::Board;
use crate::model::mutation::Mutation;
use crate::ops::apply::apply_mutation;
use crate::ops::check::{check_board, CheckError};
use crate::sync::remote::{RemoteError, RemoteStore};

/// Error type for board file I/O
#[derive(Debug, thiserror::Error)]
pub enum BoardFileError {
    #[error("could not read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("could not parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("could not write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("refusing to write invalid board ({} structural issue(s))", .0.len())]
    Invalid(Vec<CheckError>),
    #[error("could not serialize board: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error(transparent)]
    Lock(#[from] LockError),
}

impl From<BoardFileError> for RemoteError {
    fn from(e: BoardFileError) -> Self {
        match e {
            BoardFileError::Invalid(_) => RemoteError::Rejected(e.to_string()),
            other => RemoteError::Unavailable(other.to_string()),
        }
    }
}

pub fn read_board(path: &Path) -> Result<Board, BoardFileError> {
    let text = std::fs::read_to_string(path).map_err(|source| BoardFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| BoardFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Validate and atomically replace the board file. The caller holds the lock.
pub fn write_board(path: &Path, board: &Board) -> Result<(), BoardFileError> {
    let errors = check_board(board);
    if !errors.is_empty() {
        return Err(BoardFileError::Invalid(errors));
    }
    let mut json = serde_json::to_string_pretty(board)?;
    json.push('\n');
    atomic_write(path, json.as_bytes()).map_err(|source| BoardFileError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `content` to `path` via a temp file in the same directory + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Authoritative store backed by a JSON board file.
///
/// Every mutation is a locked read-modify-write, so several processes can
/// share one board file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    lock_timeout: Duration,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileStore {
            path: path.into(),
            lock_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    /// Apply `mutation` to the file under the lock.
    pub fn commit(&self, mutation: &Mutation) -> Result<Board, CommitError> {
        let _lock = FileLock::acquire(self.lock_dir(), self.lock_timeout).map_err(BoardFileError::from)?;
        let mut board = read_board(&self.path)?;
        apply_mutation(&mut board, mutation)?;
        write_board(&self.path, &board)?;
        info!(mutation = mutation.name(), path = %self.path.display(), "board file updated");
        Ok(board)
    }
}

/// Why a commit to the board file failed
#[derive(Debug, thiserror::Error)]
pub enum CommitError {
    #[error(transparent)]
    File(#[from] BoardFileError),
    #[error(transparent)]
    Board(#[from] crate::ops::BoardError),
}

impl From<CommitError> for RemoteError {
    fn from(e: CommitError) -> Self {
        match e {
            CommitError::File(e) => e.into(),
            CommitError::Board(e) => e.into(),
        }
    }
}

impl RemoteStore for FileStore {
    fn fetch_board(&mut self) -> Result<Board, RemoteError> {
        debug!(path = %self.path.display(), "reading board file");
        Ok(read_board(&self.path)?)
    }

    fn apply(&mut self, mutation: &Mutation) -> Result<(), RemoteError> {
        self.commit(mutation)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::card::Card;
    use crate::model::list::List;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_board() -> Board {
        Board::new("b", "Sprint").with_lists(vec![
            List::new("A", "Todo").with_cards(vec![Card::new("c1", "one"), Card::new("c2", "two")]),
            List::new("B", "Doing"),
        ])
    }

    fn store_in(tmp: &TempDir) -> FileStore {
        let path = tmp.path().join("board.json");
        write_board(&path, &sample_board()).unwrap();
        FileStore::new(path)
    }

    #[test]
    fn fetch_reads_the_file() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        assert_eq!(store.fetch_board().unwrap(), sample_board());
    }

    #[test]
    fn apply_persists_and_releases_lock() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        store
            .apply(&Mutation::MoveCard {
                card_id: "c1".into(),
                list_id: "B".into(),
                new_index: 0,
            })
            .unwrap();
        let on_disk = read_board(store.path()).unwrap();
        assert_eq!(on_disk.locate_card("c1").unwrap().list_id, "B");
        assert_eq!(on_disk.lists[0].cards[0].id, "c2");
        assert_eq!(on_disk.lists[0].cards[0].index, 0);
        assert!(!tmp.path().join(crate::io::lock::LOCK_FILE).exists());
    }

    #[test]
    fn invalid_mutation_leaves_file_untouched() {
        let tmp = TempDir::new().unwrap();
        let mut store = store_in(&tmp);
        let before = std::fs::read_to_string(store.path()).unwrap();
        let err = store
            .apply(&Mutation::DeleteList {
                list_id: "missing".into(),
            })
            .unwrap_err();
        assert_eq!(err, RemoteError::Rejected("list not found: missing".into()));
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn broken_board_is_never_written() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("board.json");
        let mut board = sample_board();
        board.lists[0].cards[1].index = 5;
        let err = write_board(&path, &board).unwrap_err();
        assert!(matches!(err, BoardFileError::Invalid(ref errors) if errors.len() == 1));
        assert!(!path.exists());
    }

    #[test]
    fn missing_file_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let mut store = FileStore::new(tmp.path().join("nope.json"));
        assert!(matches!(store.fetch_board(), Err(RemoteError::Unavailable(_))));
    }
}
