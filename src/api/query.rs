//! Database queries: request building, pagination and row projection.

use super::pagination::fetch_all_pages;
use super::responses::PaginatedResponse;
use super::{send, NotionTransport};
use crate::codec::PropertyCodec;
use crate::error::{AppError, DecodeError};
use crate::model::PropertyValue;
use crate::query::{FilterNode, SortSpec};
use crate::types::{DatabaseId, PageId, PropertyId};
use indexmap::IndexMap;
use reqwest::Method;
use serde_json::{Map, Value};

/// Runs one database query to completion.
///
/// The filter and sorts stay owned by the caller and are borrowed for the
/// pager's lifetime. They are serialized once per [`run`](Self::run); every
/// page request reuses that body with its own `page_size` and `start_cursor`.
/// Rows come back in server order, unfiltered and undeduplicated.
pub struct QueryPager<'a, T: NotionTransport + ?Sized> {
    transport: &'a T,
    database: DatabaseId,
    filter: Option<&'a FilterNode>,
    sorts: Option<&'a SortSpec>,
    limit: Option<usize>,
    filter_properties: Vec<PropertyId>,
}

impl<'a, T: NotionTransport + ?Sized> QueryPager<'a, T> {
    pub fn new(transport: &'a T, database: DatabaseId) -> Self {
        Self {
            transport,
            database,
            filter: None,
            sorts: None,
            limit: None,
            filter_properties: Vec::new(),
        }
    }

    pub fn filter(mut self, filter: &'a FilterNode) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sorts(mut self, sorts: &'a SortSpec) -> Self {
        self.sorts = Some(sorts);
        self
    }

    /// Caps the number of rows returned. The last page request asks only
    /// for what is left under the cap.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Restricts the properties returned on each row to these ids.
    pub fn filter_properties(mut self, ids: impl IntoIterator<Item = PropertyId>) -> Self {
        self.filter_properties.extend(ids);
        self
    }

    pub fn database(&self) -> &DatabaseId {
        &self.database
    }

    /// The request body without pagination fields.
    pub fn request_body(&self) -> Map<String, Value> {
        let mut body = Map::new();
        if let Some(filter) = self.filter {
            body.insert("filter".to_string(), filter.serialize());
        }
        if let Some(sorts) = self.sorts.filter(|s| !s.is_empty()) {
            body.insert("sorts".to_string(), sorts.serialize());
        }
        body
    }

    /// The endpoint path, with one `filter_properties` parameter per id.
    /// Property ids arrive URL-encoded and are appended unchanged.
    pub fn path(&self) -> String {
        let mut path = format!("databases/{}/query", self.database.to_dashed());
        for (i, id) in self.filter_properties.iter().enumerate() {
            path.push(if i == 0 { '?' } else { '&' });
            path.push_str("filter_properties=");
            path.push_str(id.as_str());
        }
        path
    }

    /// Returns every row as raw JSON.
    pub async fn run(&self) -> Result<Vec<Value>, AppError> {
        let base = self.request_body();
        let path = self.path();
        let path = path.as_str();
        let transport = self.transport;

        let rows = fetch_all_pages(
            |cursor, page_size| {
                let mut body = base.clone();
                body.insert("page_size".to_string(), Value::from(page_size));
                if let Some(cursor) = cursor {
                    body.insert("start_cursor".to_string(), Value::String(cursor));
                }
                async move {
                    let body = Value::Object(body);
                    let response = send(transport, Method::POST, path, Some(&body)).await?;
                    let page: PaginatedResponse<Value> = serde_json::from_value(response)?;
                    Ok(page)
                }
            },
            self.limit,
        )
        .await?;

        log::info!(
            "Query on database {} returned {} rows",
            self.database,
            rows.len()
        );
        Ok(rows)
    }

    /// Returns every row passed through `projector`. The first projection
    /// error fails the whole query.
    pub async fn run_with<U, F>(&self, projector: F) -> Result<Vec<U>, AppError>
    where
        F: FnMut(Value) -> Result<U, AppError>,
    {
        self.run().await?.into_iter().map(projector).collect()
    }

    /// Returns only the ids of the matching pages.
    pub async fn page_ids(&self) -> Result<Vec<PageId>, AppError> {
        self.run_with(|row| row_id(&row)).await
    }
}

fn row_id(row: &Value) -> Result<PageId, AppError> {
    let raw = row
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::MalformedResponse("Query result row has no id".to_string()))?;
    Ok(PageId::parse(raw)?)
}

/// One query result row. Property values stay raw until asked for.
#[derive(Debug, Clone)]
pub struct PageRow {
    pub id: PageId,
    pub url: Option<String>,
    properties: Map<String, Value>,
    codec: PropertyCodec,
}

impl PageRow {
    pub fn from_raw(row: Value, codec: PropertyCodec) -> Result<Self, AppError> {
        let id = row_id(&row)?;
        let Value::Object(mut row) = row else {
            return Err(AppError::MalformedResponse(
                "Query result row is not an object".to_string(),
            ));
        };
        let url = row.get("url").and_then(Value::as_str).map(str::to_string);
        let properties = match row.remove("properties") {
            Some(Value::Object(properties)) => properties,
            Some(_) => {
                return Err(DecodeError::WrongShape {
                    property_type: "page".to_string(),
                    field: "properties".to_string(),
                    expected: "object",
                }
                .into())
            }
            None => Map::new(),
        };
        Ok(Self {
            id,
            url,
            properties,
            codec,
        })
    }

    /// Decodes one property. `None` when the row does not carry it.
    pub fn property(&self, name: &str) -> Result<Option<PropertyValue>, DecodeError> {
        self.properties
            .get(name)
            .map(|raw| self.codec.decode(raw))
            .transpose()
    }

    /// The server id of a property as reported on this row.
    pub fn property_id(&self, name: &str) -> Option<PropertyId> {
        self.properties
            .get(name)
            .and_then(|raw| raw.get("id"))
            .and_then(Value::as_str)
            .and_then(|id| PropertyId::new(id).ok())
    }

    pub fn raw_property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn property_names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn decode_all(&self) -> Result<IndexMap<String, PropertyValue>, DecodeError> {
        self.properties
            .iter()
            .map(|(name, raw)| Ok((name.clone(), self.codec.decode(raw)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::ApiResponse;
    use crate::query::{Operator, PropertyFilter, SortCriterion};
    use serde_json::json;

    struct Unreachable;

    #[async_trait::async_trait]
    impl NotionTransport for Unreachable {
        async fn request(
            &self,
            _method: Method,
            _path: &str,
            _body: Option<&Value>,
        ) -> Result<ApiResponse<Value>, AppError> {
            Err(AppError::MalformedResponse("no requests expected".into()))
        }
    }

    fn db() -> DatabaseId {
        DatabaseId::parse("0123456789abcdef0123456789abcdef").unwrap()
    }

    #[test]
    fn body_omits_absent_parts() {
        let pager = QueryPager::new(&Unreachable, db());
        assert!(pager.request_body().is_empty());

        let no_sorts = SortSpec::new();
        let pager = pager.sorts(&no_sorts);
        assert!(pager.request_body().is_empty());
    }

    #[test]
    fn body_carries_filter_and_sorts() {
        let filter = PropertyFilter::checkbox("Done", Operator::Equals, true).unwrap();
        let sorts = SortSpec::new().then(SortCriterion::ascending("Name"));
        let pager = QueryPager::new(&Unreachable, db())
            .filter(&filter)
            .sorts(&sorts);
        let body = Value::Object(pager.request_body());
        assert_eq!(
            body,
            json!({
                "filter": {"property": "Done", "checkbox": {"equals": true}},
                "sorts": [{"property": "Name", "direction": "ascending"}]
            })
        );
    }

    #[test]
    fn path_lists_selected_property_ids() {
        let pager = QueryPager::new(&Unreachable, db()).filter_properties([
            PropertyId::new("title").unwrap(),
            PropertyId::new("%3AUPp").unwrap(),
        ]);
        assert_eq!(
            pager.path(),
            "databases/01234567-89ab-cdef-0123-456789abcdef/query\
             ?filter_properties=title&filter_properties=%3AUPp"
        );
    }

    #[tokio::test]
    async fn zero_limit_sends_nothing() {
        let rows = QueryPager::new(&Unreachable, db()).limit(0).run().await.unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn rows_decode_on_demand() {
        let row = PageRow::from_raw(
            json!({
                "object": "page",
                "id": "11111111-2222-3333-4444-555555555555",
                "url": "https://www.notion.so/Task-11111111222233334444555555555555",
                "properties": {
                    "Done": {"id": "a%3Bc", "type": "checkbox", "checkbox": true},
                    "Bad": {"id": "zz", "type": "number", "number": "seven"}
                }
            }),
            PropertyCodec::default(),
        )
        .unwrap();

        assert_eq!(row.id.as_str(), "11111111222233334444555555555555");
        assert_eq!(row.property("Done").unwrap(), Some(PropertyValue::Checkbox(true)));
        assert_eq!(row.property("Missing").unwrap(), None);
        assert_eq!(row.property_id("Done").unwrap().as_str(), "a%3Bc");
        assert!(row.property("Bad").is_err());
        assert!(row.decode_all().is_err());
    }

    #[test]
    fn row_without_id_is_malformed() {
        let err = PageRow::from_raw(json!({"properties": {}}), PropertyCodec::default())
            .unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }
}
