//! Query construction: filter trees and sort chains.
//!
//! Everything here is an immutable value with no I/O. Execution lives in
//! [`crate::api::QueryPager`].

pub mod conditions;
pub mod filter;
pub mod sort;

pub use conditions::{Condition, ConditionFamily, Operand, Operator};
pub use filter::{
    Combinator, CompoundFilter, FilterNode, FormulaResultType, PropertyFilter, RollupAggregate,
    TimestampFilter,
};
pub use sort::{Direction, SortCriterion, SortKey, SortSpec};

/// Page timestamps that can be filtered and sorted on without being
/// database properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Timestamp {
    CreatedTime,
    LastEditedTime,
}

impl Timestamp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timestamp::CreatedTime => "created_time",
            Timestamp::LastEditedTime => "last_edited_time",
        }
    }
}

impl std::str::FromStr for Timestamp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created_time" => Ok(Timestamp::CreatedTime),
            "last_edited_time" => Ok(Timestamp::LastEditedTime),
            other => Err(format!("unknown timestamp '{}'", other)),
        }
    }
}
