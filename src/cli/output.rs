use chrono::NaiveDate;
use serde::Serialize;

use crate::model::board::Board;
use crate::model::card::Card;
use crate::ops::check::{CheckError, CheckWarning};
use crate::sync::optimistic::Notice;
use crate::sync::DragOutcome;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

/// Result of a write command
#[derive(Serialize)]
pub struct WriteJson<'a> {
    pub board: Option<&'a Board>,
    #[serde(skip_serializing_if = "no_notices")]
    pub notices: &'a [Notice],
}

fn no_notices(notices: &&[Notice]) -> bool {
    notices.is_empty()
}

#[derive(Serialize)]
pub struct DragJson<'a> {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mutation_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'a str>,
    #[serde(flatten)]
    pub result: WriteJson<'a>,
}

#[derive(Serialize)]
pub struct BucketJson<'a> {
    /// `None` for the unscheduled lane
    pub date: Option<NaiveDate>,
    pub cards: Vec<&'a Card>,
}

pub fn outcome_name(outcome: &DragOutcome) -> &'static str {
    match outcome {
        DragOutcome::Cancelled => "cancelled",
        DragOutcome::Unchanged => "unchanged",
        DragOutcome::Ignored(_) => "ignored",
        DragOutcome::Dispatched(_) => "dispatched",
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

fn format_schedule(card: &Card) -> String {
    match (card.calendar_date, card.calendar_order) {
        (Some(date), Some(order)) => format!(" @{} ({})", date, order),
        (Some(date), None) => format!(" @{}", date),
        (None, _) => String::new(),
    }
}

/// One line per card: position, id, title and schedule
pub fn format_card_line(card: &Card) -> String {
    format!("{:>3}. {}  {}{}", card.index, card.id, card.title, format_schedule(card))
}

pub fn format_board(board: &Board) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", board.title, board.id)];
    for list in &board.lists {
        lines.push(format!("[{}] {} ({})", list.index, list.title, list.id));
        if list.cards.is_empty() {
            lines.push("     (empty)".to_string());
        }
        for card in &list.cards {
            lines.push(format!("  {}", format_card_line(card)));
        }
    }
    lines
}

/// A calendar bucket in key order. Positions are bucket positions, not list
/// indices.
pub fn format_bucket(date: Option<NaiveDate>, cards: &[&Card]) -> Vec<String> {
    let header = match date {
        Some(d) => d.to_string(),
        None => "unscheduled".to_string(),
    };
    let mut lines = vec![header];
    for (pos, card) in cards.iter().enumerate() {
        let key = card
            .calendar_order
            .map(|k| k.to_string())
            .unwrap_or_else(|| "-".to_string());
        lines.push(format!("{:>5}. {}  {}  [{}]", pos, card.id, card.title, key));
    }
    lines
}

pub fn format_check_error(err: &CheckError) -> String {
    match err {
        CheckError::ListIndex {
            list_id,
            expected,
            found,
        } => format!("list {} has index {}, expected {}", list_id, found, expected),
        CheckError::CardIndex {
            list_id,
            card_id,
            expected,
            found,
        } => format!(
            "[{}] card {} has index {}, expected {}",
            list_id, card_id, found, expected
        ),
        CheckError::DuplicateCard { card_id, list_ids } => {
            format!("card {} appears in lists: {}", card_id, list_ids.join(", "))
        }
        CheckError::DuplicateList { list_id } => format!("list id {} is duplicated", list_id),
    }
}

pub fn format_check_warning(warn: &CheckWarning) -> String {
    match warn {
        CheckWarning::MissingCalendarOrder { card_id } => {
            format!("card {} is scheduled without a calendar key", card_id)
        }
        CheckWarning::TiedCalendarOrder { bucket, card_ids } => {
            format!("{}: cards share a calendar key: {}", bucket, card_ids.join(", "))
        }
    }
}

pub fn format_notice(notice: &Notice) -> String {
    format!(
        "{}  {}",
        notice.at.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        notice
    )
}
