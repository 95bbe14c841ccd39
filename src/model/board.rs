use serde::{Deserialize, Serialize};

use super::card::Card;
use super::list::List;

/// The full entity tree: an ordered sequence of lists holding ordered cards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub lists: Vec<List>,
}

/// Where a card currently lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardLocation {
    pub list_id: String,
    /// Position of the owning list in `Board::lists`
    pub list_position: usize,
    /// Position of the card inside the list
    pub index: usize,
}

impl Board {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Board {
            id: id.into(),
            title: title.into(),
            lists: Vec::new(),
        }
    }

    /// Builder-style helper: append lists and re-index everything.
    pub fn with_lists(mut self, lists: Vec<List>) -> Self {
        self.lists.extend(lists);
        self.reindex_lists();
        for list in &mut self.lists {
            list.reindex();
        }
        self
    }

    /// Rewrite list indices to match sequence order.
    pub fn reindex_lists(&mut self) {
        for (i, list) in self.lists.iter_mut().enumerate() {
            list.index = i;
        }
    }

    pub fn list(&self, list_id: &str) -> Option<&List> {
        self.lists.iter().find(|l| l.id == list_id)
    }

    pub fn list_mut(&mut self, list_id: &str) -> Option<&mut List> {
        self.lists.iter_mut().find(|l| l.id == list_id)
    }

    pub fn list_position(&self, list_id: &str) -> Option<usize> {
        self.lists.iter().position(|l| l.id == list_id)
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.lists
            .iter()
            .flat_map(|l| l.cards.iter())
            .find(|c| c.id == card_id)
    }

    pub fn card_mut(&mut self, card_id: &str) -> Option<&mut Card> {
        self.lists
            .iter_mut()
            .flat_map(|l| l.cards.iter_mut())
            .find(|c| c.id == card_id)
    }

    /// Find which list holds a card and at what position.
    pub fn locate_card(&self, card_id: &str) -> Option<CardLocation> {
        self.lists.iter().enumerate().find_map(|(lp, list)| {
            list.position_of(card_id).map(|index| CardLocation {
                list_id: list.id.clone(),
                list_position: lp,
                index,
            })
        })
    }

    /// All cards across all lists in visual order (lists left to right,
    /// cards top to bottom).
    pub fn flat_cards(&self) -> impl Iterator<Item = &Card> {
        self.lists.iter().flat_map(|l| l.cards.iter())
    }

    pub fn card_ids(&self) -> Vec<String> {
        self.flat_cards().map(|c| c.id.clone()).collect()
    }

    pub fn card_count(&self) -> usize {
        self.lists.iter().map(|l| l.cards.len()).sum()
    }
}
