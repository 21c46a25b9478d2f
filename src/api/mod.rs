//! Notion API interaction: the transport seam and everything driven through it.
//!
//! Every operation here is generic over [`NotionTransport`], the single
//! "send a request, get JSON back" capability. Business logic depends on the
//! trait, never on HTTP details.

pub mod client;
pub mod pagination;
pub mod property_items;
pub mod query;
pub mod responses;
pub mod schema;
pub mod session;

use crate::error::{classify_response, AppError};
use client::ApiResponse;
use reqwest::Method;
use serde_json::Value;

/// One HTTP round trip to the Notion API.
///
/// Implementations perform exactly one request per call. They report the
/// status and parsed body of every response, successful or not; turning
/// failures into typed errors is [`send`]'s job.
#[async_trait::async_trait]
pub trait NotionTransport: Send + Sync {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse<Value>, AppError>;
}

/// Sends a request and classifies any non-2xx response.
///
/// No retries: a rate-limited response comes back as an error whose
/// `is_retryable()` is true, and the caller decides.
pub async fn send<T: NotionTransport + ?Sized>(
    transport: &T,
    method: Method,
    path: &str,
    body: Option<&Value>,
) -> Result<Value, AppError> {
    let response = transport.request(method, path, body).await?;
    if response.status.is_success() {
        Ok(response.data)
    } else {
        let error = classify_response(response.status.as_u16(), &response.data);
        log::debug!("{} failed: {}", response.url, error);
        Err(error.into())
    }
}

pub use client::NotionHttpClient;
pub use pagination::fetch_all_pages;
pub use property_items::materialize;
pub use query::{PageRow, QueryPager};
pub use responses::PaginatedResponse;
pub use schema::{PropertySchema, SchemaCache, SchemaEntry};
pub use session::{NotionSession, SessionQuery};
