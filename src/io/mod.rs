pub mod board_io;
pub mod config_io;
pub mod lock;
pub mod notice_log;
pub mod watcher;
