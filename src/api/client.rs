// src/api/client.rs
//! Pure HTTP client wrapper for Notion API.
//!
//! This module provides a thin wrapper around reqwest for making
//! HTTP requests to the Notion API. It handles authentication and
//! basic request/response operations without parsing or business logic.

use super::NotionTransport;
use crate::config::ClientConfig;
use crate::error::AppError;
use crate::types::ApiKey;
use reqwest::{header, Client, Method, StatusCode};
use serde_json::Value;

/// Result of an HTTP operation with response metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub data: T,
    pub status: StatusCode,
    pub url: String,
}

/// A thin wrapper around reqwest Client for Notion API requests.
#[derive(Clone)]
pub struct NotionHttpClient {
    client: Client,
    base_url: String,
}

impl NotionHttpClient {
    /// Creates a new HTTP client with Notion API authentication.
    pub fn new(config: &ClientConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .default_headers(Self::create_headers(&config.api_key, &config.notion_version)?)
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Creates the default headers for Notion API requests.
    fn create_headers(api_key: &ApiKey, version: &str) -> Result<header::HeaderMap, AppError> {
        let mut headers = header::HeaderMap::new();

        let auth_header = format!("Bearer {}", api_key.as_str());
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&auth_header).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid API token format: {}", e))
            })?,
        );

        headers.insert(
            "Notion-Version",
            header::HeaderValue::from_str(version).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid Notion-Version value: {}", e))
            })?,
        );

        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        Ok(headers)
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait::async_trait]
impl NotionTransport for NotionHttpClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse<Value>, AppError> {
        let url = self.url_for(path);
        log::debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await?;

        let status = response.status();
        let url = response.url().to_string();
        let text = response.text().await?;
        log::debug!("{} -> {} ({} bytes)", url, status, text.len());

        let data = parse_body(status, &text)?;
        Ok(ApiResponse { data, status, url })
    }
}

/// Parses a response body as JSON.
///
/// Error bodies that aren't JSON (a proxy's HTML page) are kept as a string
/// so classification can fall back to the status code; a success body that
/// isn't JSON is a malformed response.
fn parse_body(status: StatusCode, text: &str) -> Result<Value, AppError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(_) if !status.is_success() => Ok(Value::String(text.to_string())),
        Err(e) => Err(AppError::MalformedResponse(format!(
            "Response body is not JSON: {}",
            e
        ))),
    }
}
