//! Typed property values, as produced by the codec.

pub mod common;
mod property_type;
mod property_value;
pub mod rich_text;

pub use common::*;
pub use property_type::PropertyType;
pub use property_value::{
    BoundFormat, DateSpan, FormulaValue, NotionDate, PropertyValue, RollupFunction, RollupResult,
    RollupValue,
};
pub use rich_text::{Annotations, RichText, RichTextKind, RichTextRun};
