use crate::model::board::Board;
use crate::model::card::{Card, CardPatch};
use crate::model::list::List;

use super::board_ops::BoardError;

// ---------------------------------------------------------------------------
// Card CRUD
// ---------------------------------------------------------------------------

/// Apply a sparse field update to one card.
pub fn update_card(board: &mut Board, card_id: &str, patch: &CardPatch) -> Result<(), BoardError> {
    let card = board
        .card_mut(card_id)
        .ok_or_else(|| BoardError::CardNotFound(card_id.to_string()))?;
    card.apply_patch(patch);
    Ok(())
}

/// Remove a card and close the gap it leaves.
pub fn delete_card(board: &mut Board, card_id: &str) -> Result<Card, BoardError> {
    let loc = board
        .locate_card(card_id)
        .ok_or_else(|| BoardError::CardNotFound(card_id.to_string()))?;
    let list = &mut board.lists[loc.list_position];
    let card = list.cards.remove(loc.index);
    list.reindex();
    Ok(card)
}

/// Append a new card to the bottom of a list.
pub fn add_card(
    board: &mut Board,
    list_id: &str,
    card_id: &str,
    title: &str,
) -> Result<(), BoardError> {
    if board.card(card_id).is_some() {
        return Err(BoardError::DuplicateId(card_id.to_string()));
    }
    let list = board
        .list_mut(list_id)
        .ok_or_else(|| BoardError::ListNotFound(list_id.to_string()))?;
    let mut card = Card::new(card_id, title);
    card.index = list.cards.len();
    list.cards.push(card);
    Ok(())
}

// ---------------------------------------------------------------------------
// List CRUD
// ---------------------------------------------------------------------------

/// Append a new empty list to the right of the board.
pub fn add_list(board: &mut Board, list_id: &str, title: &str) -> Result<(), BoardError> {
    if board.list(list_id).is_some() {
        return Err(BoardError::DuplicateId(list_id.to_string()));
    }
    let mut list = List::new(list_id, title);
    list.index = board.lists.len();
    board.lists.push(list);
    Ok(())
}

pub fn rename_list(board: &mut Board, list_id: &str, title: &str) -> Result<(), BoardError> {
    let list = board
        .list_mut(list_id)
        .ok_or_else(|| BoardError::ListNotFound(list_id.to_string()))?;
    list.title = title.to_string();
    Ok(())
}

/// Remove a list together with its cards.
pub fn delete_list(board: &mut Board, list_id: &str) -> Result<List, BoardError> {
    let pos = board
        .list_position(list_id)
        .ok_or_else(|| BoardError::ListNotFound(list_id.to_string()))?;
    let list = board.lists.remove(pos);
    board.reindex_lists();
    Ok(list)
}
