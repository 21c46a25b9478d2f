// tests/common/mod.rs
//! A scripted in-memory transport and response builders shared by the
//! integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use notion_dbkit::{ApiResponse, AppError, NotionTransport};
use parking_lot::Mutex;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::collections::VecDeque;

/// One request as the transport saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Answers requests from a queue of canned responses, in order, and
/// records every request it receives.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<(u16, Value)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, status: u16, body: Value) -> Self {
        self.responses.lock().push_back((status, body));
        self
    }

    pub fn ok(self, body: Value) -> Self {
        self.respond(200, body)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn pending(&self) -> usize {
        self.responses.lock().len()
    }
}

#[async_trait]
impl NotionTransport for ScriptedTransport {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse<Value>, AppError> {
        self.requests.lock().push(RecordedRequest {
            method: method.clone(),
            path: path.to_string(),
            body: body.cloned(),
        });
        let (status, data) = self.responses.lock().pop_front().ok_or_else(|| {
            AppError::MalformedResponse(format!("unscripted request: {} {}", method, path))
        })?;
        Ok(ApiResponse {
            data,
            status: StatusCode::from_u16(status).expect("scripted status is valid"),
            url: format!("https://api.notion.com/v1/{}", path),
        })
    }
}

pub const DATABASE: &str = "d9824bdc84454327be8b5b47500af6ce";

/// A 32-hex-digit page id built from a small number.
pub fn page_id(n: u32) -> String {
    format!("{:032x}", n)
}

/// The dashed form the API sends back.
pub fn dashed(id: &str) -> String {
    format!(
        "{}-{}-{}-{}-{}",
        &id[0..8],
        &id[8..12],
        &id[12..16],
        &id[16..20],
        &id[20..32]
    )
}

pub fn page_row(n: u32) -> Value {
    let id = page_id(n);
    json!({
        "object": "page",
        "id": dashed(&id),
        "url": format!("https://www.notion.so/Row-{}", id),
        "properties": {
            "Name": {
                "id": "title",
                "type": "title",
                "title": [{
                    "type": "text",
                    "text": {"content": format!("Row {}", n), "link": null},
                    "annotations": {
                        "bold": false, "italic": false, "strikethrough": false,
                        "underline": false, "code": false, "color": "default"
                    },
                    "plain_text": format!("Row {}", n),
                    "href": null
                }]
            },
            "Done": {"id": "a%3Bc", "type": "checkbox", "checkbox": n % 2 == 0}
        }
    })
}

/// A query results page holding rows `range`.
pub fn query_page(rows: impl IntoIterator<Item = u32>, next_cursor: Option<&str>) -> Value {
    json!({
        "object": "list",
        "results": rows.into_iter().map(page_row).collect::<Vec<_>>(),
        "next_cursor": next_cursor,
        "has_more": next_cursor.is_some(),
        "type": "page_or_database",
        "page_or_database": {}
    })
}

pub fn error_body(status: u16, code: &str, message: &str) -> Value {
    json!({
        "object": "error",
        "status": status,
        "code": code,
        "message": message,
        "request_id": "5e9d3c52-7f3a-4c0a-9a8c-5a1fd0c1b0e2"
    })
}

pub fn database_schema() -> Value {
    json!({
        "object": "database",
        "id": dashed(DATABASE),
        "properties": {
            "Name": {"id": "title", "name": "Name", "type": "title", "title": {}},
            "Done": {"id": "a%3Bc", "name": "Done", "type": "checkbox", "checkbox": {}},
            "Tags": {"id": "t%5Dg", "name": "Tags", "type": "multi_select", "multi_select": {"options": []}},
            "Blocked by": {"id": "rel1", "name": "Blocked by", "type": "relation", "relation": {}}
        }
    })
}
