//! Append-only log of failure notices, kept next to `boardsync.toml`.
//!
//! Each entry is a markdown block. The message is indented four spaces so
//! that lines inside it can never be read as a header or a separator:
//!
//! ```text
//! ## 2024-05-01T10:00:00Z move-card
//!
//!     rejected: card not found: c9
//!
//! ---
//! ```

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::sync::optimistic::Notice;

const FILE_HEADER: &str = "\
<!-- bsync notice log: remote failures that were rolled back locally.
     View with: bsync notices
     Safe to delete. -->

---
";

pub fn notice_log_path(root: &Path) -> PathBuf {
    root.join(".notices.log")
}

const BODY_INDENT: &str = "    ";

fn to_markdown(notice: &Notice) -> String {
    let body: Vec<String> = notice
        .message
        .trim_end()
        .lines()
        .map(|line| format!("{}{}", BODY_INDENT, line))
        .collect();
    format!(
        "## {} {}\n\n{}\n\n---\n",
        notice.at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        notice.mutation,
        body.join("\n"),
    )
}

/// Append notices to the log. Failures are logged and otherwise ignored.
pub fn log_notices(root: &Path, notices: &[Notice]) {
    if notices.is_empty() {
        return;
    }
    if let Err(e) = append(root, notices) {
        warn!(error = %e, "could not write to notice log");
    }
}

fn append(root: &Path, notices: &[Notice]) -> io::Result<()> {
    let path = notice_log_path(root);
    let needs_header = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);
    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    for notice in notices {
        file.write_all(to_markdown(notice).as_bytes())?;
    }
    Ok(())
}

/// Read logged notices, most recent first, keeping at most `limit`.
pub fn read_notices(root: &Path, limit: Option<usize>) -> Vec<Notice> {
    let Ok(content) = std::fs::read_to_string(notice_log_path(root)) else {
        return Vec::new();
    };
    let mut notices = parse_notices(&content);
    if let Some(n) = limit {
        let skip = notices.len().saturating_sub(n);
        notices.drain(..skip);
    }
    notices.reverse();
    notices
}

fn parse_notices(content: &str) -> Vec<Notice> {
    fn finish(entry: Option<(Notice, Vec<&str>)>) -> Option<Notice> {
        entry.map(|(mut notice, body)| {
            notice.message = body.join("\n");
            notice
        })
    }

    let mut notices = Vec::new();
    let mut current: Option<(Notice, Vec<&str>)> = None;

    for line in content.lines() {
        if let Some(header) = line.strip_prefix("## ") {
            notices.extend(finish(current.take()));
            current = parse_header(header).map(|notice| (notice, Vec::new()));
        } else if line == "---" {
            notices.extend(finish(current.take()));
        } else if let Some((_, body)) = current.as_mut()
            && let Some(text) = line.strip_prefix(BODY_INDENT)
        {
            body.push(text);
        }
    }
    notices.extend(finish(current));
    notices
}

fn parse_header(header: &str) -> Option<Notice> {
    let (at, mutation) = header.split_once(' ')?;
    let at = DateTime::parse_from_rfc3339(at).ok()?.with_timezone(&Utc);
    Some(Notice {
        at,
        mutation: mutation.trim().to_string(),
        message: String::new(),
    })
}
