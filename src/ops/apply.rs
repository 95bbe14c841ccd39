use crate::model::board::Board;
use crate::model::mutation::Mutation;

use super::board_ops::{self, BoardError};
use super::card_ops;

/// Interpret a mutation against a board.
///
/// This is the single meaning of every `Mutation`: the optimistic pre-apply
/// runs it on the cached board, and stores run it on the authoritative one.
/// On error the board is left untouched.
pub fn apply_mutation(board: &mut Board, mutation: &Mutation) -> Result<(), BoardError> {
    match mutation {
        Mutation::MoveList { list_id, new_index } => {
            let from = board
                .list_position(list_id)
                .ok_or_else(|| BoardError::ListNotFound(list_id.clone()))?;
            *board = board_ops::move_list(board, from, *new_index)?;
        }
        Mutation::MoveCard {
            card_id,
            list_id,
            new_index,
        } => {
            *board = board_ops::move_card(board, card_id, list_id, *new_index)?;
        }
        Mutation::BulkMoveCards {
            card_ids,
            list_id,
            start_index,
        } => {
            *board = board_ops::move_cards(board, card_ids, list_id, *start_index)?;
        }
        Mutation::BulkUpdateCards { updates } => {
            // validate first so a bad id leaves the board untouched
            if let Some(missing) = updates.iter().find(|u| board.card(&u.card_id).is_none()) {
                return Err(BoardError::CardNotFound(missing.card_id.clone()));
            }
            for update in updates {
                card_ops::update_card(board, &update.card_id, &update.patch)?;
            }
        }
        Mutation::UpdateCard { card_id, patch } => {
            card_ops::update_card(board, card_id, patch)?;
        }
        Mutation::DeleteCard { card_id } => {
            card_ops::delete_card(board, card_id)?;
        }
        Mutation::AddCard {
            list_id,
            card_id,
            title,
        } => {
            card_ops::add_card(board, list_id, card_id, title)?;
        }
        Mutation::AddList { list_id, title } => {
            card_ops::add_list(board, list_id, title)?;
        }
        Mutation::RenameList { list_id, title } => {
            card_ops::rename_list(board, list_id, title)?;
        }
        Mutation::DeleteList { list_id } => {
            card_ops::delete_list(board, list_id)?;
        }
    }
    Ok(())
}

/// Pure form of [`apply_mutation`]: returns the updated copy.
pub fn applied(board: &Board, mutation: &Mutation) -> Result<Board, BoardError> {
    let mut next = board.clone();
    apply_mutation(&mut next, mutation)?;
    Ok(next)
}
