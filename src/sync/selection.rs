use indexmap::IndexSet;

use crate::model::board::Board;

/// Multi-selection of cards, with an anchor for range extension.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: IndexSet<String>,
    anchor: Option<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, card_id: &str) -> bool {
        self.ids.contains(card_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in the order they were selected
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(|s| s.as_str())
    }

    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    /// Flip membership. Returns true when the card is now selected.
    pub fn toggle(&mut self, card_id: &str) -> bool {
        if self.ids.shift_remove(card_id) {
            false
        } else {
            self.ids.insert(card_id.to_string());
            self.anchor = Some(card_id.to_string());
            true
        }
    }

    /// Select exactly the cards between `from` and `to` (inclusive) in the
    /// board's flattened visual order. Either id missing: no change.
    ///
    /// `from` becomes the anchor so repeated extensions pivot around it.
    pub fn select_range(&mut self, board: &Board, from: &str, to: &str) {
        let flat: Vec<&str> = board.flat_cards().map(|c| c.id.as_str()).collect();
        let (Some(a), Some(b)) = (
            flat.iter().position(|id| *id == from),
            flat.iter().position(|id| *id == to),
        ) else {
            return;
        };
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        self.ids = flat[start..=end].iter().map(|s| s.to_string()).collect();
        self.anchor = Some(from.to_string());
    }

    /// Range from the current anchor to `card_id`; with no anchor this is a
    /// plain toggle.
    pub fn extend_to(&mut self, board: &Board, card_id: &str) {
        match self.anchor.clone() {
            Some(anchor) => self.select_range(board, &anchor, card_id),
            None => {
                self.toggle(card_id);
            }
        }
    }

    /// Collapse the selection to a single card.
    pub fn select_only(&mut self, card_id: &str) {
        self.ids.clear();
        self.ids.insert(card_id.to_string());
        self.anchor = Some(card_id.to_string());
    }

    /// Batch order for dragging `dragged`: the dragged card first, then the
    /// rest of the selection by their index within their list (board order
    /// breaks ties).
    ///
    /// Dragging an unselected card selects it exclusively first. Selected ids
    /// no longer on the board are left out.
    pub fn ordered_for_drag(&mut self, board: &Board, dragged: &str) -> Vec<String> {
        if !self.contains(dragged) {
            self.select_only(dragged);
        }
        let mut rest: Vec<(usize, usize, &str)> = board
            .flat_cards()
            .enumerate()
            .filter(|(_, c)| c.id != dragged && self.ids.contains(c.id.as_str()))
            .map(|(flat, c)| (c.index, flat, c.id.as_str()))
            .collect();
        rest.sort();

        let mut ordered = Vec::with_capacity(rest.len() + 1);
        ordered.push(dragged.to_string());
        ordered.extend(rest.into_iter().map(|(_, _, id)| id.to_string()));
        ordered
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.anchor = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::card::Card;
    use crate::model::list::List;
    use pretty_assertions::assert_eq;

    fn sample_board() -> Board {
        Board::new("b", "Sprint").with_lists(vec![
            List::new("A", "Todo").with_cards(vec![Card::new("c1", "1"), Card::new("c2", "2")]),
            List::new("B", "Doing").with_cards(vec![Card::new("c4", "4"), Card::new("c3", "3")]),
            List::new("C", "Done").with_cards(vec![Card::new("c5", "5")]),
        ])
    }

    fn selected(sel: &Selection) -> Vec<&str> {
        sel.iter().collect()
    }

    #[test]
    fn toggle_flips_membership_and_sets_anchor() {
        let mut sel = Selection::new();
        assert!(sel.toggle("c1"));
        assert_eq!(sel.anchor(), Some("c1"));
        assert!(sel.toggle("c3"));
        assert_eq!(sel.anchor(), Some("c3"));
        assert!(!sel.toggle("c1"));
        assert_eq!(selected(&sel), vec!["c3"]);
        // removing does not move the anchor
        assert_eq!(sel.anchor(), Some("c3"));
    }

    #[test]
    fn range_spans_lists_in_visual_order() {
        let mut sel = Selection::new();
        sel.select_range(&sample_board(), "c2", "c3");
        assert_eq!(selected(&sel), vec!["c2", "c4", "c3"]);
    }

    #[test]
    fn range_is_direction_independent() {
        let board = sample_board();
        let mut forward = Selection::new();
        forward.select_range(&board, "c1", "c4");
        let mut backward = Selection::new();
        backward.select_range(&board, "c4", "c1");
        assert_eq!(selected(&forward), selected(&backward));
    }

    #[test]
    fn range_with_unknown_id_is_noop() {
        let mut sel = Selection::new();
        sel.toggle("c5");
        sel.select_range(&sample_board(), "c1", "ghost");
        assert_eq!(selected(&sel), vec!["c5"]);
    }

    #[test]
    fn extend_from_anchor() {
        let board = sample_board();
        let mut sel = Selection::new();
        sel.toggle("c4");
        sel.extend_to(&board, "c5");
        assert_eq!(selected(&sel), vec!["c4", "c3", "c5"]);
        sel.extend_to(&board, "c2");
        assert_eq!(selected(&sel), vec!["c2", "c4"]);
    }

    #[test]
    fn drag_order_puts_dragged_first_then_by_index() {
        let board = sample_board();
        let mut sel = Selection::new();
        sel.toggle("c1");
        sel.toggle("c3");
        assert_eq!(sel.ordered_for_drag(&board, "c3"), vec!["c3", "c1"]);
    }

    #[test]
    fn drag_order_breaks_index_ties_by_board_order() {
        let board = sample_board();
        let mut sel = Selection::new();
        sel.toggle("c5");
        sel.toggle("c4");
        sel.toggle("c2");
        sel.toggle("c1");
        // c1, c4, c5 all sit at index 0; c2 at index 1
        assert_eq!(
            sel.ordered_for_drag(&board, "c2"),
            vec!["c2", "c1", "c4", "c5"]
        );
    }

    #[test]
    fn dragging_unselected_card_collapses_selection() {
        let board = sample_board();
        let mut sel = Selection::new();
        sel.toggle("c1");
        sel.toggle("c2");
        assert_eq!(sel.ordered_for_drag(&board, "c5"), vec!["c5"]);
        assert_eq!(selected(&sel), vec!["c5"]);
    }

    #[test]
    fn stale_ids_are_skipped() {
        let board = sample_board();
        let mut sel = Selection::new();
        sel.toggle("gone");
        sel.toggle("c1");
        assert_eq!(sel.ordered_for_drag(&board, "c1"), vec!["c1"]);
    }

    #[test]
    fn clear_drops_anchor() {
        let mut sel = Selection::new();
        sel.toggle("c1");
        sel.clear();
        assert!(sel.is_empty());
        assert_eq!(sel.anchor(), None);
    }
}
