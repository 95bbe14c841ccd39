use serde::{Deserialize, Serialize};

/// Configuration from boardsync.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub sync: EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Board file, relative to the directory holding boardsync.toml
    #[serde(default = "default_board_file")]
    pub file: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        BoardConfig {
            file: default_board_file(),
        }
    }
}

fn default_board_file() -> String {
    "board.json".to_string()
}

/// Fractional calendar key placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Distance to a missing neighbour when placing at a bucket edge
    #[serde(default = "default_step")]
    pub step: f64,
    /// Key given to the first card placed into an empty bucket
    #[serde(default)]
    pub origin: f64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            step: default_step(),
            origin: 0.0,
        }
    }
}

impl CalendarConfig {
    /// Why these settings cannot produce strictly increasing keys, if they can't.
    pub fn invalid_reason(&self) -> Option<&'static str> {
        if !self.step.is_finite() || self.step <= 0.0 {
            Some("calendar.step must be a positive finite number")
        } else if !self.origin.is_finite() {
            Some("calendar.origin must be a finite number")
        } else {
            None
        }
    }
}

fn default_step() -> f64 {
    1024.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long write commands wait for the remote to settle
    #[serde(default = "default_settle_timeout_ms")]
    pub settle_timeout_ms: u64,
    /// Append failure notices to `.notices.log`
    #[serde(default = "default_true")]
    pub log_notices: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            settle_timeout_ms: default_settle_timeout_ms(),
            log_notices: true,
        }
    }
}

fn default_settle_timeout_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config: SyncConfig = toml::from_str("").unwrap();
        assert_eq!(config, SyncConfig::default());
        assert_eq!(config.board.file, "board.json");
        assert_eq!(config.calendar.step, 1024.0);
        assert_eq!(config.calendar.origin, 0.0);
        assert!(config.sync.log_notices);
    }

    #[test]
    fn partial_sections_fill_missing_fields() {
        let config: SyncConfig = toml::from_str(
            r#"
[calendar]
step = 10.0

[sync]
log_notices = false
"#,
        )
        .unwrap();
        assert_eq!(config.calendar.step, 10.0);
        assert_eq!(config.calendar.origin, 0.0);
        assert!(!config.sync.log_notices);
        assert_eq!(config.sync.settle_timeout_ms, 5000);
    }

    #[test]
    fn calendar_step_must_be_positive_and_finite() {
        assert_eq!(CalendarConfig::default().invalid_reason(), None);
        for step in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = CalendarConfig { step, origin: 0.0 };
            assert!(config.invalid_reason().is_some(), "step {step} accepted");
        }
        let config = CalendarConfig {
            step: 1.0,
            origin: f64::NAN,
        };
        assert_eq!(config.invalid_reason(), Some("calendar.origin must be a finite number"));
    }
}
