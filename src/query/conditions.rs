//! Filter operators, the per-type operator tables, and operands.

use crate::error::FilterError;
use crate::model::PropertyType;
use crate::types::{PageId, UserId};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use serde_json::{json, Map, Value};
use std::fmt;

/// A filter condition operator, named by its wire string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Equals,
    DoesNotEqual,
    Contains,
    DoesNotContain,
    StartsWith,
    EndsWith,
    IsEmpty,
    IsNotEmpty,
    GreaterThan,
    LessThan,
    GreaterThanOrEqualTo,
    LessThanOrEqualTo,
    Before,
    After,
    OnOrBefore,
    OnOrAfter,
    PastWeek,
    PastMonth,
    PastYear,
    ThisWeek,
    NextWeek,
    NextMonth,
    NextYear,
}

impl Operator {
    const ALL: [Operator; 23] = [
        Operator::Equals,
        Operator::DoesNotEqual,
        Operator::Contains,
        Operator::DoesNotContain,
        Operator::StartsWith,
        Operator::EndsWith,
        Operator::IsEmpty,
        Operator::IsNotEmpty,
        Operator::GreaterThan,
        Operator::LessThan,
        Operator::GreaterThanOrEqualTo,
        Operator::LessThanOrEqualTo,
        Operator::Before,
        Operator::After,
        Operator::OnOrBefore,
        Operator::OnOrAfter,
        Operator::PastWeek,
        Operator::PastMonth,
        Operator::PastYear,
        Operator::ThisWeek,
        Operator::NextWeek,
        Operator::NextMonth,
        Operator::NextYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Equals => "equals",
            Operator::DoesNotEqual => "does_not_equal",
            Operator::Contains => "contains",
            Operator::DoesNotContain => "does_not_contain",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::IsEmpty => "is_empty",
            Operator::IsNotEmpty => "is_not_empty",
            Operator::GreaterThan => "greater_than",
            Operator::LessThan => "less_than",
            Operator::GreaterThanOrEqualTo => "greater_than_or_equal_to",
            Operator::LessThanOrEqualTo => "less_than_or_equal_to",
            Operator::Before => "before",
            Operator::After => "after",
            Operator::OnOrBefore => "on_or_before",
            Operator::OnOrAfter => "on_or_after",
            Operator::PastWeek => "past_week",
            Operator::PastMonth => "past_month",
            Operator::PastYear => "past_year",
            Operator::ThisWeek => "this_week",
            Operator::NextWeek => "next_week",
            Operator::NextMonth => "next_month",
            Operator::NextYear => "next_year",
        }
    }

    /// `is_empty` / `is_not_empty`: no operand, serialized as `true`.
    pub fn is_emptiness_check(&self) -> bool {
        matches!(self, Operator::IsEmpty | Operator::IsNotEmpty)
    }

    /// Relative date ranges: no operand, serialized as `{}`.
    pub fn is_relative_date(&self) -> bool {
        matches!(
            self,
            Operator::PastWeek
                | Operator::PastMonth
                | Operator::PastYear
                | Operator::ThisWeek
                | Operator::NextWeek
                | Operator::NextMonth
                | Operator::NextYear
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Operator {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| FilterError::UnknownOperator(s.to_string()))
    }
}

use Operator::*;

const TEXT_OPERATORS: &[Operator] = &[
    Equals,
    DoesNotEqual,
    Contains,
    DoesNotContain,
    StartsWith,
    EndsWith,
    IsEmpty,
    IsNotEmpty,
];
const NUMBER_OPERATORS: &[Operator] = &[
    Equals,
    DoesNotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqualTo,
    LessThanOrEqualTo,
    IsEmpty,
    IsNotEmpty,
];
const UNIQUE_ID_OPERATORS: &[Operator] = &[
    Equals,
    DoesNotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqualTo,
    LessThanOrEqualTo,
];
const CHECKBOX_OPERATORS: &[Operator] = &[Equals, DoesNotEqual];
const SELECT_OPERATORS: &[Operator] = &[Equals, DoesNotEqual, IsEmpty, IsNotEmpty];
const CONTAINS_OPERATORS: &[Operator] = &[Contains, DoesNotContain, IsEmpty, IsNotEmpty];
const DATE_OPERATORS: &[Operator] = &[
    Equals, Before, After, OnOrBefore, OnOrAfter, IsEmpty, IsNotEmpty, PastWeek, PastMonth,
    PastYear, ThisWeek, NextWeek, NextMonth, NextYear,
];
const FILES_OPERATORS: &[Operator] = &[IsEmpty, IsNotEmpty];

/// Groups of property types that share one operator table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionFamily {
    Text,
    Number,
    UniqueId,
    Checkbox,
    Select,
    MultiSelect,
    People,
    Relation,
    Date,
    Files,
}

impl ConditionFamily {
    /// The family a property type filters with, if it has one of its own.
    ///
    /// Formula and rollup properties filter through their result type and
    /// have no family of their own.
    pub fn for_property_type(ty: PropertyType) -> Option<Self> {
        let family = match ty {
            PropertyType::Title
            | PropertyType::RichText
            | PropertyType::Url
            | PropertyType::Email
            | PropertyType::PhoneNumber => ConditionFamily::Text,
            PropertyType::Number => ConditionFamily::Number,
            PropertyType::UniqueId => ConditionFamily::UniqueId,
            PropertyType::Checkbox => ConditionFamily::Checkbox,
            PropertyType::Select | PropertyType::Status => ConditionFamily::Select,
            PropertyType::MultiSelect => ConditionFamily::MultiSelect,
            PropertyType::People | PropertyType::CreatedBy | PropertyType::LastEditedBy => {
                ConditionFamily::People
            }
            PropertyType::Relation => ConditionFamily::Relation,
            PropertyType::Date | PropertyType::CreatedTime | PropertyType::LastEditedTime => {
                ConditionFamily::Date
            }
            PropertyType::Files => ConditionFamily::Files,
            PropertyType::Formula | PropertyType::Rollup => return None,
        };
        Some(family)
    }

    pub fn operators(&self) -> &'static [Operator] {
        match self {
            ConditionFamily::Text => TEXT_OPERATORS,
            ConditionFamily::Number => NUMBER_OPERATORS,
            ConditionFamily::UniqueId => UNIQUE_ID_OPERATORS,
            ConditionFamily::Checkbox => CHECKBOX_OPERATORS,
            ConditionFamily::Select => SELECT_OPERATORS,
            ConditionFamily::MultiSelect | ConditionFamily::People | ConditionFamily::Relation => {
                CONTAINS_OPERATORS
            }
            ConditionFamily::Date => DATE_OPERATORS,
            ConditionFamily::Files => FILES_OPERATORS,
        }
    }

    pub fn allows(&self, operator: Operator) -> bool {
        self.operators().contains(&operator)
    }

    /// Interprets command-line text as an operand for this family.
    ///
    /// Text that does not parse as the family's scalar type stays text, so
    /// the mismatch is reported by [`Condition::new`].
    pub fn parse_operand(&self, raw: &str) -> Operand {
        match self {
            ConditionFamily::Number | ConditionFamily::UniqueId => raw
                .parse::<f64>()
                .map(Operand::Number)
                .unwrap_or_else(|_| Operand::Text(raw.to_string())),
            ConditionFamily::Checkbox => raw
                .parse::<bool>()
                .map(Operand::Bool)
                .unwrap_or_else(|_| Operand::Text(raw.to_string())),
            _ => Operand::Text(raw.to_string()),
        }
    }
}

/// The right-hand side of a condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// For operators that take no value.
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Operand {
    fn describe(&self) -> String {
        match self {
            Operand::Empty => "no operand".to_string(),
            Operand::Text(s) => format!("text {:?}", s),
            Operand::Number(n) => format!("number {}", n),
            Operand::Bool(b) => format!("boolean {}", b),
        }
    }
}

impl From<&str> for Operand {
    fn from(s: &str) -> Self {
        Operand::Text(s.to_string())
    }
}

impl From<String> for Operand {
    fn from(s: String) -> Self {
        Operand::Text(s)
    }
}

impl From<f64> for Operand {
    fn from(n: f64) -> Self {
        Operand::Number(n)
    }
}

impl From<i64> for Operand {
    fn from(n: i64) -> Self {
        Operand::Number(n as f64)
    }
}

impl From<i32> for Operand {
    fn from(n: i32) -> Self {
        Operand::Number(f64::from(n))
    }
}

impl From<bool> for Operand {
    fn from(b: bool) -> Self {
        Operand::Bool(b)
    }
}

impl From<NaiveDate> for Operand {
    fn from(date: NaiveDate) -> Self {
        Operand::Text(date.format("%Y-%m-%d").to_string())
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for Operand
where
    Tz::Offset: fmt::Display,
{
    fn from(ts: DateTime<Tz>) -> Self {
        Operand::Text(ts.to_rfc3339())
    }
}

impl From<&PageId> for Operand {
    fn from(id: &PageId) -> Self {
        Operand::Text(id.to_dashed())
    }
}

impl From<&UserId> for Operand {
    fn from(id: &UserId) -> Self {
        Operand::Text(id.to_dashed())
    }
}

impl From<()> for Operand {
    fn from(_: ()) -> Self {
        Operand::Empty
    }
}

/// A validated `{operator: operand}` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    family: ConditionFamily,
    operator: Operator,
    operand: Operand,
}

impl Condition {
    /// Validates `operator` against the family's table and `operand`
    /// against what the operator expects.
    ///
    /// `property` and `property_type` only label the error.
    pub fn new(
        property: &str,
        property_type: &str,
        family: ConditionFamily,
        operator: Operator,
        operand: Operand,
    ) -> Result<Self, FilterError> {
        if !family.allows(operator) {
            return Err(FilterError::OperatorNotAllowed {
                property: property.to_string(),
                property_type: property_type.to_string(),
                operator,
            });
        }

        let mismatch = |expected: &'static str, operand: &Operand| FilterError::OperandMismatch {
            property: property.to_string(),
            operator,
            expected,
            found: operand.describe(),
        };

        let operand = if operator.is_emptiness_check() {
            match operand {
                Operand::Empty | Operand::Bool(true) => Operand::Empty,
                other => return Err(mismatch("no operand", &other)),
            }
        } else if operator.is_relative_date() {
            match operand {
                Operand::Empty => Operand::Empty,
                other => return Err(mismatch("no operand", &other)),
            }
        } else {
            match (family, operand) {
                (ConditionFamily::Number | ConditionFamily::UniqueId, Operand::Number(n))
                    if n.is_finite() =>
                {
                    Operand::Number(n)
                }
                (ConditionFamily::Number | ConditionFamily::UniqueId, other) => {
                    return Err(mismatch("a finite number", &other))
                }
                (ConditionFamily::Checkbox, Operand::Bool(b)) => Operand::Bool(b),
                (ConditionFamily::Checkbox, other) => return Err(mismatch("a boolean", &other)),
                (ConditionFamily::People, Operand::Text(raw)) => match UserId::parse(&raw) {
                    Ok(id) => Operand::Text(id.to_dashed()),
                    Err(_) => return Err(mismatch("a user id", &Operand::Text(raw))),
                },
                (ConditionFamily::Relation, Operand::Text(raw)) => match PageId::parse(&raw) {
                    Ok(id) => Operand::Text(id.to_dashed()),
                    Err(_) => return Err(mismatch("a page id", &Operand::Text(raw))),
                },
                (ConditionFamily::People | ConditionFamily::Relation, other) => {
                    return Err(mismatch("an id", &other))
                }
                (ConditionFamily::Date, Operand::Text(raw)) if is_iso_date(&raw) => {
                    Operand::Text(raw)
                }
                (ConditionFamily::Date, other) => {
                    return Err(mismatch("an ISO 8601 date or date-time", &other))
                }
                (_, Operand::Text(text)) => Operand::Text(text),
                (_, other) => return Err(mismatch("text", &other)),
            }
        };

        Ok(Self {
            family,
            operator,
            operand,
        })
    }

    pub fn family(&self) -> ConditionFamily {
        self.family
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    /// `{operator: operand}` as sent on the wire.
    pub fn to_json(&self) -> Value {
        let operand = if self.operator.is_emptiness_check() {
            json!(true)
        } else if self.operator.is_relative_date() {
            json!({})
        } else {
            match &self.operand {
                Operand::Empty => json!(true),
                Operand::Text(s) => json!(s),
                Operand::Number(n) => json!(n),
                Operand::Bool(b) => json!(b),
            }
        };
        let mut condition = Map::new();
        condition.insert(self.operator.as_str().to_string(), operand);
        Value::Object(condition)
    }
}

fn is_iso_date(raw: &str) -> bool {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(raw).is_ok()
        || NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M").is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition(
        family: ConditionFamily,
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> Result<Condition, FilterError> {
        Condition::new("prop", "test", family, operator, operand.into())
    }

    #[test]
    fn operators_parse_from_wire_names() {
        assert_eq!("contains".parse::<Operator>().unwrap(), Operator::Contains);
        assert_eq!(
            "greater_than_or_equal_to".parse::<Operator>().unwrap(),
            Operator::GreaterThanOrEqualTo
        );
        assert_eq!(
            "resembles".parse::<Operator>().unwrap_err(),
            FilterError::UnknownOperator("resembles".into())
        );
    }

    #[test]
    fn checkbox_table_is_equality_only() {
        let err = condition(ConditionFamily::Checkbox, Operator::Contains, true).unwrap_err();
        assert!(matches!(err, FilterError::OperatorNotAllowed { .. }));
        assert!(condition(ConditionFamily::Checkbox, Operator::DoesNotEqual, false).is_ok());
    }

    #[test]
    fn emptiness_checks_take_no_operand() {
        let c = condition(ConditionFamily::Files, Operator::IsEmpty, ()).unwrap();
        assert_eq!(c.to_json(), json!({"is_empty": true}));
        assert!(condition(ConditionFamily::Text, Operator::IsNotEmpty, "x").is_err());
    }

    #[test]
    fn relative_dates_serialize_as_empty_object() {
        let c = condition(ConditionFamily::Date, Operator::PastWeek, ()).unwrap();
        assert_eq!(c.to_json(), json!({"past_week": {}}));
    }

    #[test]
    fn date_comparisons_need_iso_operands() {
        assert!(condition(ConditionFamily::Date, Operator::After, "2023-04-01").is_ok());
        assert!(
            condition(ConditionFamily::Date, Operator::Before, "2023-04-01T10:00:00Z").is_ok()
        );
        let err = condition(ConditionFamily::Date, Operator::After, "last tuesday").unwrap_err();
        assert!(matches!(err, FilterError::OperandMismatch { .. }));
    }

    #[test]
    fn people_ids_are_normalized() {
        let c = condition(
            ConditionFamily::People,
            Operator::Contains,
            "550E8400E29B41D4A716446655440000",
        )
        .unwrap();
        assert_eq!(
            c.to_json(),
            json!({"contains": "550e8400-e29b-41d4-a716-446655440000"})
        );
        assert!(condition(ConditionFamily::Relation, Operator::Contains, "bob").is_err());
    }

    #[test]
    fn unique_id_has_no_emptiness_checks() {
        assert!(condition(ConditionFamily::UniqueId, Operator::IsEmpty, ()).is_err());
        assert!(condition(ConditionFamily::UniqueId, Operator::GreaterThan, 10).is_ok());
    }

    #[test]
    fn phone_number_uses_text_table() {
        assert_eq!(
            ConditionFamily::for_property_type(PropertyType::PhoneNumber),
            Some(ConditionFamily::Text)
        );
        assert_eq!(ConditionFamily::for_property_type(PropertyType::Rollup), None);
    }

    #[test]
    fn cli_operands_parse_by_family() {
        assert_eq!(ConditionFamily::Number.parse_operand("4.5"), Operand::Number(4.5));
        assert_eq!(ConditionFamily::Checkbox.parse_operand("true"), Operand::Bool(true));
        assert_eq!(
            ConditionFamily::Number.parse_operand("many"),
            Operand::Text("many".into())
        );
    }
}
