use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::SyncConfig;

/// File name marking a board directory
pub const CONFIG_FILE: &str = "boardsync.toml";

/// Error type for config discovery and I/O
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("not a board directory: no boardsync.toml found")]
    NotABoard,
    #[error("boardsync.toml already exists in {0}")]
    AlreadyInitialized(PathBuf),
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse boardsync.toml: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("could not serialize boardsync.toml: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid boardsync.toml: {0}")]
    Invalid(&'static str),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Walk up from `start` to the first directory holding `boardsync.toml`.
pub fn discover_root(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).is_file() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(ConfigError::NotABoard);
        }
    }
}

/// Read `boardsync.toml` from `root`. Missing sections take their defaults.
pub fn load_config(root: &Path) -> Result<SyncConfig, ConfigError> {
    let path = root.join(CONFIG_FILE);
    let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read { path, source })?;
    let config: SyncConfig = toml::from_str(&text)?;
    if let Some(reason) = config.calendar.invalid_reason() {
        return Err(ConfigError::Invalid(reason));
    }
    Ok(config)
}

pub fn write_config(root: &Path, config: &SyncConfig) -> Result<(), ConfigError> {
    let text = toml::to_string_pretty(config)?;
    fs::write(root.join(CONFIG_FILE), text)?;
    Ok(())
}

/// Path of the board file named by the config
pub fn board_path(root: &Path, config: &SyncConfig) -> PathBuf {
    root.join(&config.board.file)
}
