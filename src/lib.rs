// src/lib.rs
//! notion-dbkit: typed Notion property values, database query filters and
//! cursor pagination.
//!
//! # Public API
//!
//! The library exposes types organized by concern:
//! - **Error handling**: `AppError`, `NotionApiError`, `ErrorKind`, `DecodeError`, `FilterError`
//! - **Configuration**: `ClientConfig`
//! - **Property values**: `PropertyValue`, `PropertyType`, `RichText`, `NotionDate`, etc.
//! - **Codec**: `PropertyCodec`
//! - **Queries**: `PropertyFilter`, `CompoundFilter`, `TimestampFilter`, `SortSpec`
//! - **API**: `NotionTransport`, `NotionHttpClient`, `NotionSession`, `QueryPager`

pub mod api;
pub mod codec;
pub mod config;
pub mod constants;
pub mod error;
pub mod model;
pub mod query;
pub mod types;

// --- Error Handling ---
pub use crate::error::{
    classify, classify_response, AppError, DecodeError, EncodeError, ErrorBody, ErrorKind,
    FilterError, NotionApiError, NotionErrorCode, Result,
};
pub use crate::types::ValidationError;

// --- Configuration ---
pub use crate::config::ClientConfig;

// --- Property Values ---
pub use crate::model::{
    Annotations, BoundFormat, DateSpan, FileObject, FileSource, FormulaValue, NotionDate,
    PropertyType, PropertyValue, RichText, RichTextKind, RichTextRun, RollupFunction,
    RollupResult, RollupValue, SelectOption, User, UserKind,
};

// --- Codec ---
pub use crate::codec::PropertyCodec;

// --- Queries ---
pub use crate::query::{
    Combinator, CompoundFilter, Condition, ConditionFamily, Direction, FilterNode,
    FormulaResultType, Operand, Operator, PropertyFilter, RollupAggregate, SortCriterion,
    SortKey, SortSpec, Timestamp, TimestampFilter,
};

// --- Domain Types ---
pub use crate::types::{ApiKey, Color, DatabaseId, PageId, PropertyId, UserId};

// --- API ---
pub use crate::api::{
    client::ApiResponse, fetch_all_pages, materialize, send, NotionHttpClient, NotionSession,
    NotionTransport, PageRow, PaginatedResponse, PropertySchema, QueryPager, SchemaCache,
    SchemaEntry, SessionQuery,
};
