//! Database schemas and the per-session name → id cache.

use crate::error::AppError;
use crate::model::PropertyType;
use crate::types::{DatabaseId, PropertyId};
use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// One column of a database schema.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaEntry {
    pub id: PropertyId,
    /// `None` for column types this client does not model (buttons etc.);
    /// their ids still resolve.
    pub property_type: Option<PropertyType>,
    pub type_tag: String,
}

/// A database's columns, keyed by property name.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySchema {
    database: DatabaseId,
    properties: IndexMap<String, SchemaEntry>,
}

impl PropertySchema {
    /// Builds the schema from a retrieved database object.
    pub fn from_database(database: DatabaseId, body: &Value) -> Result<Self, AppError> {
        let properties = body
            .get("properties")
            .and_then(Value::as_object)
            .ok_or_else(|| {
                AppError::MalformedResponse(format!(
                    "Database {} response has no properties object",
                    database
                ))
            })?;

        let mut entries = IndexMap::with_capacity(properties.len());
        for (name, definition) in properties {
            let id = definition
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    AppError::MalformedResponse(format!("Property '{}' has no id", name))
                })?;
            let type_tag = definition
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            entries.insert(
                name.clone(),
                SchemaEntry {
                    id: PropertyId::new(id)?,
                    property_type: PropertyType::from_tag(&type_tag),
                    type_tag,
                },
            );
        }

        Ok(Self {
            database,
            properties: entries,
        })
    }

    pub fn database(&self) -> &DatabaseId {
        &self.database
    }

    pub fn get(&self, name: &str) -> Option<&SchemaEntry> {
        self.properties.get(name)
    }

    /// Resolves a property name to its id.
    pub fn id_of(&self, name: &str) -> Result<&PropertyId, AppError> {
        self.get(name)
            .map(|entry| &entry.id)
            .ok_or_else(|| AppError::PropertyNotFound {
                database: self.database.to_dashed(),
                property: name.to_string(),
            })
    }

    /// The name of the property with this id, if any.
    pub fn name_of(&self, id: &PropertyId) -> Option<&str> {
        self.properties
            .iter()
            .find(|(_, entry)| &entry.id == id)
            .map(|(name, _)| name.as_str())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Read-mostly cache of database schemas.
///
/// Entries are immutable once built. A schema change is handled by
/// invalidating the entry and building a new one; nothing is patched in place.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entries: RwLock<HashMap<DatabaseId, Arc<PropertySchema>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, database: &DatabaseId) -> Option<Arc<PropertySchema>> {
        self.entries.read().get(database).cloned()
    }

    /// Stores a freshly built schema, replacing any previous one.
    pub fn insert(&self, schema: PropertySchema) -> Arc<PropertySchema> {
        let schema = Arc::new(schema);
        self.entries
            .write()
            .insert(schema.database().clone(), Arc::clone(&schema));
        schema
    }

    /// Drops the cached schema. Returns whether one was cached.
    pub fn invalidate(&self, database: &DatabaseId) -> bool {
        self.entries.write().remove(database).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
