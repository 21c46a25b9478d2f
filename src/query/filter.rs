//! The filter expression tree.
//!
//! Leaves are validated when they are built, so a [`FilterNode`] that
//! exists is always serializable. Serialization is a pure structural
//! transform and can be repeated any number of times.

use super::conditions::{Condition, ConditionFamily, Operand, Operator};
use super::Timestamp;
use crate::error::FilterError;
use crate::model::PropertyType;
use serde_json::{json, Map, Value};

/// A node of a filter tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Property(PropertyFilter),
    Timestamp(TimestampFilter),
    Compound(CompoundFilter),
}

impl FilterNode {
    /// The wire form of this node, as the value of a query's `filter` key.
    pub fn serialize(&self) -> Value {
        match self {
            FilterNode::Property(filter) => filter.serialize(),
            FilterNode::Timestamp(filter) => filter.serialize(),
            FilterNode::Compound(filter) => filter.serialize(),
        }
    }

    /// Number of leaves in the tree.
    pub fn leaf_count(&self) -> usize {
        match self {
            FilterNode::Compound(compound) => {
                compound.children.iter().map(FilterNode::leaf_count).sum()
            }
            _ => 1,
        }
    }
}

impl From<PropertyFilter> for FilterNode {
    fn from(filter: PropertyFilter) -> Self {
        FilterNode::Property(filter)
    }
}

impl From<TimestampFilter> for FilterNode {
    fn from(filter: TimestampFilter) -> Self {
        FilterNode::Timestamp(filter)
    }
}

impl From<CompoundFilter> for FilterNode {
    fn from(filter: CompoundFilter) -> Self {
        FilterNode::Compound(filter)
    }
}

/// How a rollup filter applies its inner condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollupAggregate {
    /// At least one related value matches.
    Any,
    /// Every related value matches.
    Every,
    /// No related value matches.
    None,
    /// The rollup's numeric result matches.
    Number,
    /// The rollup's date result matches.
    Date,
}

impl RollupAggregate {
    pub fn as_str(&self) -> &'static str {
        match self {
            RollupAggregate::Any => "any",
            RollupAggregate::Every => "every",
            RollupAggregate::None => "none",
            RollupAggregate::Number => "number",
            RollupAggregate::Date => "date",
        }
    }
}

/// The result type a formula filter compares against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormulaResultType {
    String,
    Checkbox,
    Number,
    Date,
}

impl FormulaResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormulaResultType::String => "string",
            FormulaResultType::Checkbox => "checkbox",
            FormulaResultType::Number => "number",
            FormulaResultType::Date => "date",
        }
    }

    fn family(&self) -> ConditionFamily {
        match self {
            FormulaResultType::String => ConditionFamily::Text,
            FormulaResultType::Checkbox => ConditionFamily::Checkbox,
            FormulaResultType::Number => ConditionFamily::Number,
            FormulaResultType::Date => ConditionFamily::Date,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum PropertyCondition {
    Typed {
        property_type: PropertyType,
        condition: Condition,
    },
    Rollup {
        aggregate: RollupAggregate,
        /// The related property's type for `any`/`every`/`none`.
        element_type: Option<PropertyType>,
        condition: Condition,
    },
    Formula {
        result_type: FormulaResultType,
        condition: Condition,
    },
}

/// A leaf filter on one database property.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyFilter {
    property: String,
    condition: PropertyCondition,
}

impl PropertyFilter {
    /// Builds a leaf for any directly filterable property type.
    ///
    /// Fails if the operator is not in the type's table or the operand
    /// does not fit the operator. Formula and rollup properties go through
    /// [`PropertyFilter::formula`] and [`PropertyFilter::rollup`].
    pub fn new(
        property: impl Into<String>,
        property_type: PropertyType,
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> Result<FilterNode, FilterError> {
        let property = property.into();
        let family = ConditionFamily::for_property_type(property_type).ok_or_else(|| {
            FilterError::NotFilterable {
                property: property.clone(),
                property_type: property_type.as_str().to_string(),
            }
        })?;
        let condition = Condition::new(
            &property,
            property_type.as_str(),
            family,
            operator,
            operand.into(),
        )?;
        Ok(FilterNode::Property(PropertyFilter {
            property,
            condition: PropertyCondition::Typed {
                property_type,
                condition,
            },
        }))
    }

    /// Text filter on a `title`, `rich_text`, `url`, `email` or `phone_number` property.
    pub fn text(
        property: impl Into<String>,
        property_type: PropertyType,
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> Result<FilterNode, FilterError> {
        Self::restricted(property, property_type, ConditionFamily::Text, operator, operand)
    }

    pub fn number(
        property: impl Into<String>,
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> Result<FilterNode, FilterError> {
        Self::new(property, PropertyType::Number, operator, operand)
    }

    pub fn checkbox(
        property: impl Into<String>,
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> Result<FilterNode, FilterError> {
        Self::new(property, PropertyType::Checkbox, operator, operand)
    }

    pub fn select(
        property: impl Into<String>,
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> Result<FilterNode, FilterError> {
        Self::new(property, PropertyType::Select, operator, operand)
    }

    pub fn multi_select(
        property: impl Into<String>,
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> Result<FilterNode, FilterError> {
        Self::new(property, PropertyType::MultiSelect, operator, operand)
    }

    pub fn status(
        property: impl Into<String>,
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> Result<FilterNode, FilterError> {
        Self::new(property, PropertyType::Status, operator, operand)
    }

    /// Date filter on a `date`, `created_time` or `last_edited_time` property.
    pub fn date(
        property: impl Into<String>,
        property_type: PropertyType,
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> Result<FilterNode, FilterError> {
        Self::restricted(property, property_type, ConditionFamily::Date, operator, operand)
    }

    /// People filter on a `people`, `created_by` or `last_edited_by` property.
    pub fn people(
        property: impl Into<String>,
        property_type: PropertyType,
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> Result<FilterNode, FilterError> {
        Self::restricted(property, property_type, ConditionFamily::People, operator, operand)
    }

    pub fn files(
        property: impl Into<String>,
        operator: Operator,
    ) -> Result<FilterNode, FilterError> {
        Self::new(property, PropertyType::Files, operator, Operand::Empty)
    }

    pub fn relation(
        property: impl Into<String>,
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> Result<FilterNode, FilterError> {
        Self::new(property, PropertyType::Relation, operator, operand)
    }

    pub fn unique_id(
        property: impl Into<String>,
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> Result<FilterNode, FilterError> {
        Self::new(property, PropertyType::UniqueId, operator, operand)
    }

    /// Filter on a formula's result.
    pub fn formula(
        property: impl Into<String>,
        result_type: FormulaResultType,
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> Result<FilterNode, FilterError> {
        let property = property.into();
        let condition = Condition::new(
            &property,
            "formula",
            result_type.family(),
            operator,
            operand.into(),
        )?;
        Ok(FilterNode::Property(PropertyFilter {
            property,
            condition: PropertyCondition::Formula {
                result_type,
                condition,
            },
        }))
    }

    /// Filter on a rollup.
    ///
    /// `any`, `every` and `none` test each related value with a condition
    /// for `element_type`; `number` and `date` test the aggregate result and
    /// validate against the number and date tables respectively.
    pub fn rollup(
        property: impl Into<String>,
        aggregate: RollupAggregate,
        element_type: PropertyType,
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> Result<FilterNode, FilterError> {
        let property = property.into();
        let (family, element_type) = match aggregate {
            RollupAggregate::Number => (ConditionFamily::Number, None),
            RollupAggregate::Date => (ConditionFamily::Date, None),
            RollupAggregate::Any | RollupAggregate::Every | RollupAggregate::None => {
                let family = ConditionFamily::for_property_type(element_type).ok_or_else(|| {
                    FilterError::NotFilterable {
                        property: property.clone(),
                        property_type: format!("rollup of {}", element_type),
                    }
                })?;
                (family, Some(element_type))
            }
        };
        let condition = Condition::new(&property, "rollup", family, operator, operand.into())?;
        Ok(FilterNode::Property(PropertyFilter {
            property,
            condition: PropertyCondition::Rollup {
                aggregate,
                element_type,
                condition,
            },
        }))
    }

    fn restricted(
        property: impl Into<String>,
        property_type: PropertyType,
        family: ConditionFamily,
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> Result<FilterNode, FilterError> {
        let property = property.into();
        if ConditionFamily::for_property_type(property_type) != Some(family) {
            return Err(FilterError::NotFilterable {
                property,
                property_type: property_type.as_str().to_string(),
            });
        }
        Self::new(property, property_type, operator, operand)
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn operator(&self) -> Operator {
        match &self.condition {
            PropertyCondition::Typed { condition, .. }
            | PropertyCondition::Rollup { condition, .. }
            | PropertyCondition::Formula { condition, .. } => condition.operator(),
        }
    }

    pub fn serialize(&self) -> Value {
        let mut filter = Map::new();
        filter.insert("property".to_string(), json!(self.property));
        match &self.condition {
            PropertyCondition::Typed {
                property_type,
                condition,
            } => {
                filter.insert(property_type.as_str().to_string(), condition.to_json());
            }
            PropertyCondition::Rollup {
                aggregate,
                element_type,
                condition,
            } => {
                let inner = match element_type {
                    Some(ty) => nest(ty.as_str(), condition.to_json()),
                    None => condition.to_json(),
                };
                filter.insert("rollup".to_string(), nest(aggregate.as_str(), inner));
            }
            PropertyCondition::Formula {
                result_type,
                condition,
            } => {
                filter.insert(
                    "formula".to_string(),
                    nest(result_type.as_str(), condition.to_json()),
                );
            }
        }
        Value::Object(filter)
    }
}

/// A filter on a page's creation or last-edit timestamp.
///
/// Works whether or not the database exposes the timestamp as a property.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampFilter {
    timestamp: Timestamp,
    condition: Condition,
}

impl TimestampFilter {
    pub fn new(
        timestamp: Timestamp,
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> Result<FilterNode, FilterError> {
        let condition = Condition::new(
            timestamp.as_str(),
            "timestamp",
            ConditionFamily::Date,
            operator,
            operand.into(),
        )?;
        Ok(FilterNode::Timestamp(TimestampFilter {
            timestamp,
            condition,
        }))
    }

    pub fn created_time(
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> Result<FilterNode, FilterError> {
        Self::new(Timestamp::CreatedTime, operator, operand)
    }

    pub fn last_edited_time(
        operator: Operator,
        operand: impl Into<Operand>,
    ) -> Result<FilterNode, FilterError> {
        Self::new(Timestamp::LastEditedTime, operator, operand)
    }

    pub fn serialize(&self) -> Value {
        let mut filter = Map::new();
        filter.insert("timestamp".to_string(), json!(self.timestamp.as_str()));
        filter.insert(
            self.timestamp.as_str().to_string(),
            self.condition.to_json(),
        );
        Value::Object(filter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Combinator::And => "and",
            Combinator::Or => "or",
        }
    }
}

/// An `and` / `or` over an ordered, non-empty list of children.
///
/// Nesting depth is not checked locally; the server rejects trees deeper
/// than it supports.
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundFilter {
    combinator: Combinator,
    children: Vec<FilterNode>,
}

impl CompoundFilter {
    pub fn new(
        combinator: Combinator,
        children: Vec<FilterNode>,
    ) -> Result<FilterNode, FilterError> {
        if children.is_empty() {
            return Err(FilterError::EmptyCompound {
                combinator: combinator.as_str(),
            });
        }
        Ok(FilterNode::Compound(CompoundFilter {
            combinator,
            children,
        }))
    }

    pub fn and(children: Vec<FilterNode>) -> Result<FilterNode, FilterError> {
        Self::new(Combinator::And, children)
    }

    pub fn or(children: Vec<FilterNode>) -> Result<FilterNode, FilterError> {
        Self::new(Combinator::Or, children)
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn children(&self) -> &[FilterNode] {
        &self.children
    }

    pub fn serialize(&self) -> Value {
        nest(
            self.combinator.as_str(),
            Value::Array(self.children.iter().map(FilterNode::serialize).collect()),
        )
    }
}

fn nest(key: &str, value: Value) -> Value {
    let mut object = Map::new();
    object.insert(key.to_string(), value);
    Value::Object(object)
}
