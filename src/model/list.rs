use serde::{Deserialize, Serialize};

use super::card::Card;

/// An ordered list of cards (a board column)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct List {
    pub id: String,
    /// Position on the board (0-based, contiguous)
    pub index: usize,
    pub title: String,
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl List {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        List {
            id: id.into(),
            index: 0,
            title: title.into(),
            cards: Vec::new(),
        }
    }

    /// Builder-style helper: append cards and re-index them.
    pub fn with_cards(mut self, cards: Vec<Card>) -> Self {
        self.cards.extend(cards);
        self.reindex();
        self
    }

    /// Rewrite card indices to match sequence order.
    pub fn reindex(&mut self) {
        for (i, card) in self.cards.iter_mut().enumerate() {
            card.index = i;
        }
    }

    /// Position of a card in this list's sequence
    pub fn position_of(&self, card_id: &str) -> Option<usize> {
        self.cards.iter().position(|c| c.id == card_id)
    }
}
