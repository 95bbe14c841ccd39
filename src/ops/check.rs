use std::collections::HashMap;

use serde::Serialize;

use crate::model::board::Board;

/// Structured result from `bsync check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// A structural invariant violation. A board carrying one of these must never
/// be persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// List indices are not exactly 0..n-1 in board order
    #[serde(rename = "list_index")]
    ListIndex {
        list_id: String,
        expected: usize,
        found: usize,
    },
    /// Card indices are not exactly 0..n-1 in list order
    #[serde(rename = "card_index")]
    CardIndex {
        list_id: String,
        card_id: String,
        expected: usize,
        found: usize,
    },
    /// The same card id appears more than once
    #[serde(rename = "duplicate_card")]
    DuplicateCard { card_id: String, list_ids: Vec<String> },
    /// The same list id appears more than once
    #[serde(rename = "duplicate_list")]
    DuplicateList { list_id: String },
}

/// A non-critical issue.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// Scheduled card with no calendar key sorts after its bucket neighbours
    #[serde(rename = "missing_calendar_order")]
    MissingCalendarOrder { card_id: String },
    /// Two cards in the same bucket share a calendar key
    #[serde(rename = "tied_calendar_order")]
    TiedCalendarOrder {
        bucket: String,
        card_ids: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Validate a board and return structured results. Read-only.
pub fn check(board: &Board) -> CheckResult {
    let errors = check_board(board);
    let warnings = calendar_warnings(board);
    CheckResult {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}

/// Structural invariants only: contiguous indices and unique ids.
pub fn check_board(board: &Board) -> Vec<CheckError> {
    let mut errors = Vec::new();

    let mut list_seen: HashMap<&str, usize> = HashMap::new();
    for (i, list) in board.lists.iter().enumerate() {
        if list.index != i {
            errors.push(CheckError::ListIndex {
                list_id: list.id.clone(),
                expected: i,
                found: list.index,
            });
        }
        let count = list_seen.entry(list.id.as_str()).or_insert(0);
        *count += 1;
        if *count == 2 {
            errors.push(CheckError::DuplicateList {
                list_id: list.id.clone(),
            });
        }
    }

    // card id -> lists it appears in (in board order)
    let mut card_homes: Vec<(&str, Vec<String>)> = Vec::new();
    let mut card_slot: HashMap<&str, usize> = HashMap::new();
    for list in &board.lists {
        for (i, card) in list.cards.iter().enumerate() {
            if card.index != i {
                errors.push(CheckError::CardIndex {
                    list_id: list.id.clone(),
                    card_id: card.id.clone(),
                    expected: i,
                    found: card.index,
                });
            }
            match card_slot.get(card.id.as_str()) {
                Some(&slot) => card_homes[slot].1.push(list.id.clone()),
                None => {
                    card_slot.insert(card.id.as_str(), card_homes.len());
                    card_homes.push((card.id.as_str(), vec![list.id.clone()]));
                }
            }
        }
    }
    for (card_id, list_ids) in card_homes {
        if list_ids.len() > 1 {
            errors.push(CheckError::DuplicateCard {
                card_id: card_id.to_string(),
                list_ids,
            });
        }
    }

    errors
}

fn calendar_warnings(board: &Board) -> Vec<CheckWarning> {
    let mut warnings = Vec::new();
    let mut by_key: Vec<((String, u64), Vec<String>)> = Vec::new();

    for card in board.flat_cards() {
        let Some(date) = card.calendar_date else {
            continue;
        };
        let Some(order) = card.calendar_order else {
            warnings.push(CheckWarning::MissingCalendarOrder {
                card_id: card.id.clone(),
            });
            continue;
        };
        let key = (date.to_string(), order.to_bits());
        match by_key.iter_mut().find(|(k, _)| *k == key) {
            Some((_, ids)) => ids.push(card.id.clone()),
            None => by_key.push((key, vec![card.id.clone()])),
        }
    }

    for ((bucket, _), card_ids) in by_key {
        if card_ids.len() > 1 {
            warnings.push(CheckWarning::TiedCalendarOrder { bucket, card_ids });
        }
    }
    warnings
}
