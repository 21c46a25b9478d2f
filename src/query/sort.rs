use super::Timestamp;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "ascending",
            Direction::Descending => "descending",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortKey {
    Property(String),
    Timestamp(Timestamp),
}

/// One entry of a sort chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortCriterion {
    pub key: SortKey,
    pub direction: Direction,
}

impl SortCriterion {
    pub fn ascending(property: impl Into<String>) -> Self {
        Self {
            key: SortKey::Property(property.into()),
            direction: Direction::Ascending,
        }
    }

    pub fn descending(property: impl Into<String>) -> Self {
        Self {
            key: SortKey::Property(property.into()),
            direction: Direction::Descending,
        }
    }

    pub fn created_time_ascending() -> Self {
        Self::timestamp(Timestamp::CreatedTime, Direction::Ascending)
    }

    pub fn created_time_descending() -> Self {
        Self::timestamp(Timestamp::CreatedTime, Direction::Descending)
    }

    pub fn last_edited_time_ascending() -> Self {
        Self::timestamp(Timestamp::LastEditedTime, Direction::Ascending)
    }

    pub fn last_edited_time_descending() -> Self {
        Self::timestamp(Timestamp::LastEditedTime, Direction::Descending)
    }

    pub fn timestamp(timestamp: Timestamp, direction: Direction) -> Self {
        Self {
            key: SortKey::Timestamp(timestamp),
            direction,
        }
    }

    pub fn serialize(&self) -> Value {
        match &self.key {
            SortKey::Property(name) => json!({
                "property": name,
                "direction": self.direction.as_str(),
            }),
            SortKey::Timestamp(timestamp) => json!({
                "timestamp": timestamp.as_str(),
                "direction": self.direction.as_str(),
            }),
        }
    }
}

/// An ordered sort chain. Earlier criteria win ties.
///
/// Entries are kept exactly as pushed: no reordering, no deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortSpec {
    criteria: Vec<SortCriterion>,
}

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, criterion: SortCriterion) -> Self {
        self.criteria.push(criterion);
        self
    }

    pub fn push(&mut self, criterion: SortCriterion) {
        self.criteria.push(criterion);
    }

    pub fn criteria(&self) -> &[SortCriterion] {
        &self.criteria
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn serialize(&self) -> Value {
        Value::Array(self.criteria.iter().map(SortCriterion::serialize).collect())
    }
}

impl From<Vec<SortCriterion>> for SortSpec {
    fn from(criteria: Vec<SortCriterion>) -> Self {
        Self { criteria }
    }
}

impl FromIterator<SortCriterion> for SortSpec {
    fn from_iter<I: IntoIterator<Item = SortCriterion>>(iter: I) -> Self {
        Self {
            criteria: iter.into_iter().collect(),
        }
    }
}
