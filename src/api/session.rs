//! A client session: one transport, one codec and the schema cache.

use super::property_items::materialize;
use super::query::{PageRow, QueryPager};
use super::schema::{PropertySchema, SchemaCache};
use super::{send, NotionTransport};
use crate::codec::PropertyCodec;
use crate::error::AppError;
use crate::model::PropertyValue;
use crate::query::{FilterNode, SortSpec};
use crate::types::{DatabaseId, PageId, PropertyId};
use reqwest::Method;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct NotionSession<T: NotionTransport> {
    transport: T,
    codec: PropertyCodec,
    schemas: SchemaCache,
}

impl<T: NotionTransport> NotionSession<T> {
    pub fn new(transport: T, codec: PropertyCodec) -> Self {
        Self {
            transport,
            codec,
            schemas: SchemaCache::new(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn codec(&self) -> &PropertyCodec {
        &self.codec
    }

    pub fn schemas(&self) -> &SchemaCache {
        &self.schemas
    }

    /// Returns the database's schema, fetching it on first use.
    pub async fn database_schema(
        &self,
        database: &DatabaseId,
    ) -> Result<Arc<PropertySchema>, AppError> {
        if let Some(schema) = self.schemas.get(database) {
            return Ok(schema);
        }

        let path = format!("databases/{}", database.to_dashed());
        let body = send(&self.transport, Method::GET, &path, None).await?;
        let schema = PropertySchema::from_database(database.clone(), &body)?;
        log::info!(
            "Loaded schema for database {} ({} properties)",
            database,
            schema.len()
        );
        Ok(self.schemas.insert(schema))
    }

    /// Drops the cached schema so the next lookup refetches it. Call this
    /// when a property is renamed, added or removed.
    pub fn invalidate_schema(&self, database: &DatabaseId) -> bool {
        self.schemas.invalidate(database)
    }

    pub async fn resolve_property_id(
        &self,
        database: &DatabaseId,
        name: &str,
    ) -> Result<PropertyId, AppError> {
        let schema = self.database_schema(database).await?;
        schema.id_of(name).cloned()
    }

    /// Starts a query on `database`.
    pub fn query(&self, database: DatabaseId) -> SessionQuery<'_, T> {
        SessionQuery {
            session: self,
            database,
            filter: None,
            sorts: None,
            limit: None,
            select: Vec::new(),
        }
    }

    /// Retrieves one property of a page in full, following the property
    /// item pagination to the end.
    pub async fn retrieve_property(
        &self,
        page: &PageId,
        property_id: &PropertyId,
    ) -> Result<PropertyValue, AppError> {
        let path = format!("pages/{}/properties/{}", page.to_dashed(), property_id);
        let first = send(&self.transport, Method::GET, &path, None).await?;

        let transport = &self.transport;
        let path = path.as_str();
        materialize(&self.codec, property_id, first, |cursor| {
            let next = format!("{}?start_cursor={}", path, encode_query_value(&cursor));
            async move { send(transport, Method::GET, &next, None).await }
        })
        .await
    }

    pub async fn retrieve_property_by_name(
        &self,
        page: &PageId,
        database: &DatabaseId,
        name: &str,
    ) -> Result<PropertyValue, AppError> {
        let property_id = self.resolve_property_id(database, name).await?;
        self.retrieve_property(page, &property_id).await
    }

    /// Completes a value decoded from a page if the server truncated it.
    ///
    /// Values that are already complete are returned unchanged without a
    /// request.
    pub async fn resolve_partial_property(
        &self,
        page: &PageId,
        database: &DatabaseId,
        name: &str,
        value: PropertyValue,
    ) -> Result<PropertyValue, AppError> {
        if !value.is_partial() {
            return Ok(value);
        }
        log::debug!("Property '{}' on page {} is partial; fetching all items", name, page);
        self.retrieve_property_by_name(page, database, name).await
    }

    /// Writes property values to a page.
    ///
    /// Every value is encoded before anything is sent, so a read-only value
    /// fails the whole update without a request.
    pub async fn update_properties(
        &self,
        page: &PageId,
        updates: &[(&str, PropertyValue)],
    ) -> Result<Value, AppError> {
        let properties = self
            .codec
            .encode_properties(updates.iter().map(|(name, value)| (*name, value)))?;
        let body = json!({ "properties": properties });
        let path = format!("pages/{}", page.to_dashed());
        let updated = send(&self.transport, Method::PATCH, &path, Some(&body)).await?;
        log::info!("Updated {} properties on page {}", updates.len(), page);
        Ok(updated)
    }
}

fn encode_query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// A query built against a session. The filter and sorts are borrowed from
/// the caller, so one tree can back any number of queries. Property names
/// given to [`select_properties`](Self::select_properties) are resolved
/// through the session's schema cache when the query runs.
pub struct SessionQuery<'s, T: NotionTransport> {
    session: &'s NotionSession<T>,
    database: DatabaseId,
    filter: Option<&'s FilterNode>,
    sorts: Option<&'s SortSpec>,
    limit: Option<usize>,
    select: Vec<String>,
}

impl<'s, T: NotionTransport> SessionQuery<'s, T> {
    pub fn filter(mut self, filter: &'s FilterNode) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sorts(mut self, sorts: &'s SortSpec) -> Self {
        self.sorts = Some(sorts);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn select_properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select.extend(names.into_iter().map(Into::into));
        self
    }

    async fn pager(&self) -> Result<QueryPager<'s, T>, AppError> {
        let mut pager = QueryPager::new(&self.session.transport, self.database.clone());
        if let Some(filter) = self.filter {
            pager = pager.filter(filter);
        }
        if let Some(sorts) = self.sorts {
            pager = pager.sorts(sorts);
        }
        if let Some(limit) = self.limit {
            pager = pager.limit(limit);
        }
        if !self.select.is_empty() {
            let schema = self.session.database_schema(&self.database).await?;
            let ids = self
                .select
                .iter()
                .map(|name| schema.id_of(name).cloned())
                .collect::<Result<Vec<_>, _>>()?;
            pager = pager.filter_properties(ids);
        }
        Ok(pager)
    }

    /// Raw row objects.
    pub async fn rows(&self) -> Result<Vec<Value>, AppError> {
        self.pager().await?.run().await
    }

    pub async fn page_ids(&self) -> Result<Vec<PageId>, AppError> {
        self.pager().await?.page_ids().await
    }

    /// Rows whose properties decode on demand with the session's codec.
    pub async fn pages(&self) -> Result<Vec<PageRow>, AppError> {
        let codec = self.session.codec;
        self.pager()
            .await?
            .run_with(|row| PageRow::from_raw(row, codec))
            .await
    }

    pub async fn collect_with<U, F>(&self, projector: F) -> Result<Vec<U>, AppError>
    where
        F: FnMut(Value) -> Result<U, AppError>,
    {
        self.pager().await?.run_with(projector).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursors_are_query_encoded() {
        assert_eq!(encode_query_value("a+b/c=="), "a%2Bb%2Fc%3D%3D");
    }
}
