// src/api/responses.rs
//! Envelopes returned by the Notion API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Generic paginated response wrapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default)]
    pub object: String,
    pub results: Vec<T>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// A property item listing: a paginated response whose `property_item`
/// describes the property the results belong to.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PropertyItemListing {
    pub results: Vec<Value>,
    #[serde(default)]
    pub next_cursor: Option<String>,
    pub has_more: bool,
    pub property_item: PropertyItemHeader,
}

/// The `property_item` object of a listing. `body` keeps the whole object
/// so type-specific fields (a rollup's function and aggregate) survive.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PropertyItemHeader {
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(flatten)]
    pub body: serde_json::Map<String, Value>,
}

impl PropertyItemHeader {
    /// The header as a property value object (`{"type": T, T: ...}`).
    pub fn as_property_value(&self) -> Value {
        let mut object = self.body.clone();
        object.insert("type".to_string(), Value::String(self.type_tag.clone()));
        Value::Object(object)
    }
}

/// Whether a property item response is a paginated listing rather than a
/// single value.
pub fn is_listing(body: &Value) -> bool {
    body.get("object").and_then(Value::as_str) == Some("list")
}
