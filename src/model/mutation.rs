use serde::{Deserialize, Serialize};

use super::card::{CardPatch, CardUpdate};

/// A remote-mutating operation.
///
/// The same value is interpreted locally for the optimistic pre-apply and by
/// the store that owns the authoritative board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Mutation {
    /// Reposition a list on the board
    MoveList { list_id: String, new_index: usize },
    /// Move one card to `new_index` in `list_id` (same or other list)
    MoveCard {
        card_id: String,
        list_id: String,
        new_index: usize,
    },
    /// Move several cards, in the given order, as a contiguous block
    BulkMoveCards {
        card_ids: Vec<String>,
        list_id: String,
        start_index: usize,
    },
    /// Patch several cards in one call
    BulkUpdateCards { updates: Vec<CardUpdate> },
    UpdateCard { card_id: String, patch: CardPatch },
    DeleteCard { card_id: String },
    /// Append a new card to the bottom of a list
    AddCard {
        list_id: String,
        card_id: String,
        title: String,
    },
    /// Append a new list to the right of the board
    AddList { list_id: String, title: String },
    RenameList { list_id: String, title: String },
    DeleteList { list_id: String },
}

impl Mutation {
    /// Stable name used in logs and failure notices
    pub fn name(&self) -> &'static str {
        match self {
            Mutation::MoveList { .. } => "move-list",
            Mutation::MoveCard { .. } => "move-card",
            Mutation::BulkMoveCards { .. } => "bulk-move-cards",
            Mutation::BulkUpdateCards { .. } => "bulk-update-cards",
            Mutation::UpdateCard { .. } => "update-card",
            Mutation::DeleteCard { .. } => "delete-card",
            Mutation::AddCard { .. } => "add-card",
            Mutation::AddList { .. } => "add-list",
            Mutation::RenameList { .. } => "rename-list",
            Mutation::DeleteList { .. } => "delete-list",
        }
    }
}
