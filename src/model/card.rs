use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// A card inside a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Stable public identifier
    pub id: String,
    /// Position within the owning list (0-based, contiguous)
    pub index: usize,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Calendar day the card is scheduled on (`None` = unscheduled)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_date: Option<NaiveDate>,
    /// Sparse ordering key among cards sharing `calendar_date`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_order: Option<f64>,
}

impl Card {
    /// Create an unscheduled card. The index is assigned when the card is
    /// placed into a list.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Card {
            id: id.into(),
            index: 0,
            title: title.into(),
            description: None,
            calendar_date: None,
            calendar_order: None,
        }
    }

    /// Builder-style helper for scheduling a card.
    pub fn scheduled(mut self, date: NaiveDate, order: f64) -> Self {
        self.calendar_date = Some(date);
        self.calendar_order = Some(order);
        self
    }

    /// Apply a sparse field update.
    pub fn apply_patch(&mut self, patch: &CardPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(date) = patch.calendar_date {
            self.calendar_date = date;
        }
        if let Some(order) = patch.calendar_order {
            self.calendar_order = order;
        }
    }
}

/// Sparse update of card fields.
///
/// Outer `None` leaves a field alone; for nullable fields `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub calendar_date: Option<Option<NaiveDate>>,
    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub calendar_order: Option<Option<f64>>,
}

/// Present field (even `null`) becomes `Some`, absent stays `None` via `default`
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl CardPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.calendar_date.is_none()
            && self.calendar_order.is_none()
    }

    /// Patch that moves a card onto a calendar bucket at the given key.
    pub fn schedule(date: Option<NaiveDate>, order: f64) -> Self {
        CardPatch {
            calendar_date: Some(date),
            calendar_order: Some(Some(order)),
            ..Default::default()
        }
    }
}

/// One entry of a bulk field update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardUpdate {
    pub card_id: String,
    pub patch: CardPatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn apply_patch_touches_only_present_fields() {
        let mut card = Card::new("c1", "Write docs").scheduled(day("2024-05-01"), 100.0);
        card.apply_patch(&CardPatch {
            title: Some("Write more docs".into()),
            ..Default::default()
        });
        assert_eq!(card.title, "Write more docs");
        assert_eq!(card.calendar_date, Some(day("2024-05-01")));
        assert_eq!(card.calendar_order, Some(100.0));
    }

    #[test]
    fn apply_patch_can_clear_nullable_fields() {
        let mut card = Card::new("c1", "Write docs").scheduled(day("2024-05-01"), 100.0);
        card.apply_patch(&CardPatch {
            calendar_date: Some(None),
            calendar_order: Some(None),
            ..Default::default()
        });
        assert_eq!(card.calendar_date, None);
        assert_eq!(card.calendar_order, None);
    }

    #[test]
    fn patch_serde_distinguishes_absent_from_null() {
        let patch: CardPatch = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(patch.calendar_date, None);
        assert!(!patch.is_empty());

        let empty: CardPatch = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());

        let clear: CardPatch = serde_json::from_str(r#"{"calendar_date":null}"#).unwrap();
        assert_eq!(clear.calendar_date, Some(None));
    }
}
