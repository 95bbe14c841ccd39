use std::collections::{HashMap, HashSet};

use crate::model::board::Board;
use crate::model::card::Card;

/// Error type for board transforms
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("list not found: {0}")]
    ListNotFound(String),
    #[error("card not found: {0}")]
    CardNotFound(String),
    #[error("duplicate id: {0}")]
    DuplicateId(String),
    #[error("nothing to move")]
    EmptyBatch,
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

// ---------------------------------------------------------------------------
// List moves
// ---------------------------------------------------------------------------

/// Remove the list at `from` and reinsert it at `to`, then re-index all lists.
///
/// `to` past the end places the list last. `from == to` yields an equal board.
pub fn move_list(board: &Board, from: usize, to: usize) -> Result<Board, BoardError> {
    let len = board.lists.len();
    if from >= len {
        return Err(BoardError::IndexOutOfRange { index: from, len });
    }
    let mut next = board.clone();
    if from == to {
        return Ok(next);
    }
    let list = next.lists.remove(from);
    let to = to.min(next.lists.len());
    next.lists.insert(to, list);
    next.reindex_lists();
    Ok(next)
}

// ---------------------------------------------------------------------------
// Card moves
// ---------------------------------------------------------------------------

/// Move `card_ids` as one contiguous block to `dest_index` of `dest_list`.
///
/// Cards are pulled from wherever they live (possibly several lists), laid out
/// in the order of `card_ids` and spliced in. `dest_index` counts positions in
/// the destination list after the moved cards are removed; past the end means
/// append. Every list is re-indexed afterwards.
pub fn move_cards(
    board: &Board,
    card_ids: &[String],
    dest_list: &str,
    dest_index: usize,
) -> Result<Board, BoardError> {
    if card_ids.is_empty() {
        return Err(BoardError::EmptyBatch);
    }
    let mut seen = HashSet::new();
    for id in card_ids {
        if !seen.insert(id.as_str()) {
            return Err(BoardError::DuplicateId(id.clone()));
        }
        if board.card(id).is_none() {
            return Err(BoardError::CardNotFound(id.clone()));
        }
    }
    if board.list(dest_list).is_none() {
        return Err(BoardError::ListNotFound(dest_list.to_string()));
    }

    if let [only] = card_ids
        && let Some(loc) = board.locate_card(only)
        && loc.list_id == dest_list
        && loc.index == dest_index
    {
        return Ok(board.clone());
    }

    let mut next = board.clone();
    let mut removed: HashMap<String, Card> = HashMap::with_capacity(card_ids.len());
    for list in &mut next.lists {
        let (moving, staying): (Vec<Card>, Vec<Card>) = list
            .cards
            .drain(..)
            .partition(|c| seen.contains(c.id.as_str()));
        list.cards = staying;
        for card in moving {
            removed.insert(card.id.clone(), card);
        }
    }

    let block: Vec<Card> = card_ids
        .iter()
        .filter_map(|id| removed.remove(id))
        .collect();

    let dest = next
        .list_mut(dest_list)
        .ok_or_else(|| BoardError::ListNotFound(dest_list.to_string()))?;
    let at = dest_index.min(dest.cards.len());
    dest.cards.splice(at..at, block);

    for list in &mut next.lists {
        list.reindex();
    }
    Ok(next)
}

/// Convenience wrapper for a single card.
pub fn move_card(
    board: &Board,
    card_id: &str,
    dest_list: &str,
    dest_index: usize,
) -> Result<Board, BoardError> {
    move_cards(board, &[card_id.to_string()], dest_list, dest_index)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
