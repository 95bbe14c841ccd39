use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::NaiveDate;

use crate::model::board::Board;
use crate::model::card::{Card, CardPatch, CardUpdate};
use crate::model::config::CalendarConfig;

use super::board_ops::BoardError;

/// Cards scheduled on `bucket` (`None` = unscheduled), sorted by calendar key.
///
/// Cards without a key sort after keyed ones; ties fall back to board order.
pub fn bucket_view<'a>(board: &'a Board, bucket: Option<NaiveDate>) -> Vec<&'a Card> {
    let mut view: Vec<(usize, &Card)> = board
        .flat_cards()
        .enumerate()
        .filter(|(_, c)| c.calendar_date == bucket)
        .collect();
    view.sort_by(|(pa, a), (pb, b)| compare_keys(a.calendar_order, b.calendar_order).then(pa.cmp(pb)));
    view.into_iter().map(|(_, c)| c).collect()
}

fn compare_keys(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Compute `count` strictly increasing keys to sit between `pred` and `succ`.
///
/// The gap is split into `count + 1` equal steps. A missing neighbour is
/// replaced by a virtual one so that a single card lands at `succ - step`,
/// `pred + step`, or `origin` for an empty bucket.
pub fn fractional_keys(
    pred: Option<f64>,
    succ: Option<f64>,
    count: usize,
    config: &CalendarConfig,
) -> Vec<f64> {
    let step = config.step;
    let slots = (count + 1) as f64;
    let (lo, hi) = match (pred, succ) {
        (Some(p), Some(s)) if p < s => (p, s),
        // Tied or inverted neighbours: keep the block ordered after `pred`.
        (Some(p), Some(_)) => (p, p + step * slots),
        (None, Some(s)) => (s - step * slots, s),
        (Some(p), None) => (p, p + step * slots),
        (None, None) => (config.origin - step, config.origin + step * count as f64),
    };
    let gap = (hi - lo) / slots;
    (1..=count).map(|i| lo + gap * i as f64).collect()
}

/// Place `card_ids`, in order, as a contiguous block at `position` of the
/// bucket's sorted view.
///
/// `position` counts cards already in the bucket, not counting the ones being
/// placed. Each card's bucket becomes `bucket`. Returns the new board and the
/// per-card field updates that produce it.
pub fn place_on_calendar(
    board: &Board,
    card_ids: &[String],
    bucket: Option<NaiveDate>,
    position: usize,
    config: &CalendarConfig,
) -> Result<(Board, Vec<CardUpdate>), BoardError> {
    if card_ids.is_empty() {
        return Err(BoardError::EmptyBatch);
    }
    let mut moving = HashSet::new();
    for id in card_ids {
        if !moving.insert(id.as_str()) {
            return Err(BoardError::DuplicateId(id.clone()));
        }
        if board.card(id).is_none() {
            return Err(BoardError::CardNotFound(id.clone()));
        }
    }

    let view: Vec<&Card> = bucket_view(board, bucket)
        .into_iter()
        .filter(|c| !moving.contains(c.id.as_str()))
        .collect();
    let at = position.min(view.len());
    // unkeyed cards sort last, so a drop among them lands after the last keyed card
    let pred = view[..at].iter().rev().find_map(|c| c.calendar_order);
    let succ = view.get(at).and_then(|c| c.calendar_order);

    let keys = fractional_keys(pred, succ, card_ids.len(), config);
    let updates: Vec<CardUpdate> = card_ids
        .iter()
        .zip(keys)
        .map(|(id, key)| CardUpdate {
            card_id: id.clone(),
            patch: CardPatch::schedule(bucket, key),
        })
        .collect();

    let mut next = board.clone();
    for update in &updates {
        let card = next
            .card_mut(&update.card_id)
            .ok_or_else(|| BoardError::CardNotFound(update.card_id.clone()))?;
        card.apply_patch(&update.patch);
    }
    Ok((next, updates))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::list::List;
    use pretty_assertions::assert_eq;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn owned(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn calendar_board() -> Board {
        let may1 = day("2024-05-01");
        Board::new("b", "Sprint").with_lists(vec![
            List::new("A", "Todo").with_cards(vec![
                Card::new("late", "late").scheduled(may1, 200.0),
                Card::new("new", "new"),
            ]),
            List::new("B", "Doing").with_cards(vec![
                Card::new("early", "early").scheduled(may1, 100.0),
                Card::new("other", "other").scheduled(day("2024-05-02"), 5.0),
            ]),
        ])
    }

    fn cfg() -> CalendarConfig {
        CalendarConfig {
            step: 1024.0,
            origin: 0.0,
        }
    }

    #[test]
    fn test_bucket_view_sorts_by_key() {
        let board = calendar_board();
        let view: Vec<&str> = bucket_view(&board, Some(day("2024-05-01")))
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(view, vec!["early", "late"]);

        let unscheduled: Vec<&str> = bucket_view(&board, None)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(unscheduled, vec!["new"]);
    }

    #[test]
    fn test_drop_between_neighbours_takes_midpoint() {
        let board = calendar_board();
        let (next, updates) =
            place_on_calendar(&board, &owned(&["new"]), Some(day("2024-05-01")), 1, &cfg())
                .unwrap();
        assert_eq!(updates.len(), 1);
        let card = next.card("new").unwrap();
        assert_eq!(card.calendar_order, Some(150.0));
        assert_eq!(card.calendar_date, Some(day("2024-05-01")));
        // list membership is untouched
        assert_eq!(next.locate_card("new").unwrap().list_id, "A");
    }

    #[test]
    fn test_multi_drop_splits_gap_evenly() {
        let keys = fractional_keys(Some(100.0), Some(200.0), 3, &cfg());
        assert_eq!(keys, vec![125.0, 150.0, 175.0]);
    }

    #[test]
    fn test_edge_positions_use_step() {
        assert_eq!(fractional_keys(None, Some(100.0), 1, &cfg()), vec![100.0 - 1024.0]);
        assert_eq!(fractional_keys(Some(100.0), None, 1, &cfg()), vec![100.0 + 1024.0]);
        assert_eq!(fractional_keys(None, None, 1, &cfg()), vec![0.0]);
        assert_eq!(fractional_keys(None, None, 2, &cfg()), vec![0.0, 1024.0]);
        assert_eq!(
            fractional_keys(Some(0.0), None, 2, &cfg()),
            vec![1024.0, 2048.0]
        );
    }

    #[test]
    fn test_tied_neighbours_still_increase() {
        let keys = fractional_keys(Some(10.0), Some(10.0), 2, &cfg());
        assert!(keys[0] > 10.0);
        assert!(keys[1] > keys[0]);
    }

    #[test]
    fn test_drop_at_top_of_bucket() {
        let board = calendar_board();
        let (next, _) =
            place_on_calendar(&board, &owned(&["new"]), Some(day("2024-05-01")), 0, &cfg())
                .unwrap();
        assert_eq!(next.card("new").unwrap().calendar_order, Some(100.0 - 1024.0));
    }

    #[test]
    fn test_reorder_within_bucket_excludes_moving_card() {
        let board = calendar_board();
        // move "early" after "late": view without "early" is ["late"]
        let (next, _) =
            place_on_calendar(&board, &owned(&["early"]), Some(day("2024-05-01")), 1, &cfg())
                .unwrap();
        let order: Vec<&str> = bucket_view(&next, Some(day("2024-05-01")))
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(order, vec!["late", "early"]);
    }

    #[test]
    fn test_drop_after_unkeyed_card_stays_after_keyed_ones() {
        let may1 = day("2024-05-01");
        let mut unkeyed = Card::new("u", "u");
        unkeyed.calendar_date = Some(may1);
        let board = Board::new("b", "Sprint").with_lists(vec![List::new("A", "Todo").with_cards(vec![
            Card::new("k", "k").scheduled(may1, 5000.0),
            unkeyed,
            Card::new("new", "new"),
        ])]);

        let (next, _) = place_on_calendar(&board, &owned(&["new"]), Some(may1), 2, &cfg()).unwrap();
        assert_eq!(next.card("new").unwrap().calendar_order, Some(5000.0 + 1024.0));
        let view: Vec<&str> = bucket_view(&next, Some(may1))
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(view, vec!["k", "new", "u"]);
    }

    #[test]
    fn test_unschedule() {
        let board = calendar_board();
        let (next, updates) =
            place_on_calendar(&board, &owned(&["late", "early"]), None, 0, &cfg()).unwrap();
        assert_eq!(updates[0].patch.calendar_date, Some(None));
        let view: Vec<&str> = bucket_view(&next, None)
            .iter()
            .map(|c| c.id.as_str())
            .collect();
        // keyed cards sort ahead of the unkeyed "new"
        assert_eq!(view, vec!["late", "early", "new"]);
    }

    #[test]
    fn test_place_errors() {
        let board = calendar_board();
        assert_eq!(
            place_on_calendar(&board, &[], None, 0, &cfg()).unwrap_err(),
            BoardError::EmptyBatch
        );
        assert_eq!(
            place_on_calendar(&board, &owned(&["ghost"]), None, 0, &cfg()).unwrap_err(),
            BoardError::CardNotFound("ghost".into())
        );
    }
}
