//! Drag events as delivered by the drag-and-drop layer, and their
//! classification into typed drop targets.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Droppable id of the board-level area where lists are reordered
pub const BOARD_DROPPABLE: &str = "board";
/// Prefix of calendar bucket droppable ids
pub const CALENDAR_PREFIX: &str = "calendar:";
/// Calendar bucket holding unscheduled cards
pub const UNSCHEDULED: &str = "unscheduled";

/// What is being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DragKind {
    List,
    Card,
}

/// A droppable region, classified once at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Droppable {
    /// The board itself (list reordering)
    Board,
    /// A list's card slots
    List(String),
    /// A calendar day
    DateBucket(NaiveDate),
    /// The calendar's unscheduled lane
    Unscheduled,
}

impl Droppable {
    /// Calendar bucket key, if this is a calendar droppable
    /// (`Some(None)` for unscheduled).
    pub fn calendar_bucket(&self) -> Option<Option<NaiveDate>> {
        match self {
            Droppable::DateBucket(date) => Some(Some(*date)),
            Droppable::Unscheduled => Some(None),
            _ => None,
        }
    }
}

/// Error type for droppable id parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DroppableError {
    #[error("empty droppable id")]
    Empty,
    #[error("invalid calendar date in droppable id: {0}")]
    BadDate(String),
}

impl FromStr for Droppable {
    type Err = DroppableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(DroppableError::Empty);
        }
        if s == BOARD_DROPPABLE {
            return Ok(Droppable::Board);
        }
        match s.strip_prefix(CALENDAR_PREFIX) {
            Some(UNSCHEDULED) => Ok(Droppable::Unscheduled),
            Some(day) => NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map(Droppable::DateBucket)
                .map_err(|_| DroppableError::BadDate(day.to_string())),
            None => Ok(Droppable::List(s.to_string())),
        }
    }
}

impl TryFrom<String> for Droppable {
    type Error = DroppableError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Droppable> for String {
    fn from(value: Droppable) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Droppable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Droppable::Board => write!(f, "{}", BOARD_DROPPABLE),
            Droppable::List(id) => write!(f, "{}", id),
            Droppable::DateBucket(date) => write!(f, "{}{}", CALENDAR_PREFIX, date.format("%Y-%m-%d")),
            Droppable::Unscheduled => write!(f, "{}{}", CALENDAR_PREFIX, UNSCHEDULED),
        }
    }
}

/// A position inside a droppable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropLocation {
    pub droppable: Droppable,
    pub index: usize,
}

impl DropLocation {
    pub fn new(droppable: Droppable, index: usize) -> Self {
        DropLocation { droppable, index }
    }
}

/// Start of a drag gesture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragStart {
    pub dragged_id: String,
    pub kind: DragKind,
}

/// End of a drag gesture. `destination` is `None` when dropped outside any
/// droppable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragEvent {
    pub dragged_id: String,
    pub kind: DragKind,
    pub source: DropLocation,
    pub destination: Option<DropLocation>,
}

impl DragEvent {
    /// Same droppable and same index
    pub fn is_in_place(&self) -> bool {
        self.destination.as_ref() == Some(&self.source)
    }
}

/// What a drop means, once kind and destination are known
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Reorder a list on the board
    ListSlot { index: usize },
    /// Put cards into a list
    CardSlot { list_id: String, index: usize },
    /// Schedule cards on a calendar day
    DateBucket { date: NaiveDate, index: usize },
    /// Move cards to the unscheduled lane
    Unscheduled { index: usize },
}

/// Classify a destination for the dragged kind. Combinations that make no
/// sense (a list dropped on a calendar, a card dropped on the board) yield
/// `None`.
pub fn classify(kind: DragKind, destination: &DropLocation) -> Option<DropTarget> {
    let index = destination.index;
    match (kind, &destination.droppable) {
        (DragKind::List, Droppable::Board) => Some(DropTarget::ListSlot { index }),
        (DragKind::Card, Droppable::List(list_id)) => Some(DropTarget::CardSlot {
            list_id: list_id.clone(),
            index,
        }),
        (DragKind::Card, Droppable::DateBucket(date)) => Some(DropTarget::DateBucket {
            date: *date,
            index,
        }),
        (DragKind::Card, Droppable::Unscheduled) => Some(DropTarget::Unscheduled { index }),
        _ => None,
    }
}
