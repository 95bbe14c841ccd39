use std::path::{Path, PathBuf};
use std::sync::mpsc;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Board file changed on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardChanged(pub PathBuf);

/// Watches one board file. Changes should be fed to
/// `SyncEngine::invalidate` so the engine refetches and reconciles.
pub struct BoardWatcher {
    _watcher: RecommendedWatcher,
    rx: mpsc::Receiver<BoardChanged>,
}

impl BoardWatcher {
    /// Start watching `board_file`. The parent directory is watched because
    /// atomic writes replace the file rather than modify it.
    pub fn start(board_file: &Path) -> Result<Self, notify::Error> {
        let (tx, rx) = mpsc::channel();
        let dir = match board_file.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name = board_file.file_name().map(|n| n.to_os_string());

        let mut watcher = RecommendedWatcher::new(
            move |result: Result<Event, notify::Error>| {
                let Ok(event) = result else {
                    return;
                };
                if !matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                ) {
                    return;
                }
                for path in event.paths {
                    if path.file_name().map(|n| n.to_os_string()) == file_name {
                        let _ = tx.send(BoardChanged(path));
                        break;
                    }
                }
            },
            Config::default(),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        Ok(BoardWatcher {
            _watcher: watcher,
            rx,
        })
    }

    /// Non-blocking poll. Returns all queued changes (may be empty).
    pub fn poll(&self) -> Vec<BoardChanged> {
        let mut events = Vec::new();
        while let Ok(evt) = self.rx.try_recv() {
            events.push(evt);
        }
        events
    }
}
