//! Error types with structured error handling.
//!
//! Server failures are classified into a typed vocabulary
//! ([`NotionErrorCode`], [`ErrorKind`]) and carried by [`NotionApiError`].
//! Local failures (decoding, encoding, filter construction) have their own
//! types and are never conflated with server errors.

use crate::query::Operator;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Notion API error codes as a typed vocabulary.
///
/// Every documented `code` string maps to its own variant. Codes this
/// client has never seen are kept verbatim in `Unknown`, so a server that
/// introduces new codes still produces a usable error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NotionErrorCode {
    /// Request body could not be decoded as JSON
    InvalidJson,
    /// The request URL is not valid
    InvalidRequestUrl,
    /// This request is not supported
    InvalidRequest,
    /// Request body does not match the schema for the expected parameters
    ValidationFailed,
    /// The `Notion-Version` header is missing
    MissingVersion,
    /// API key is invalid or expired
    Unauthorized,
    /// API key lacks permission for this resource
    RestrictedResource,
    /// The requested object does not exist or is not shared with the integration
    ObjectNotFound,
    /// Transaction could not be completed, potentially a data collision
    Conflict,
    /// API rate limit exceeded
    RateLimited,
    /// Notion internal server error
    InternalError,
    /// Notion is temporarily unavailable
    ServiceUnavailable,
    /// Notion's database is unavailable or in an unqueryable state
    DatabaseConnectionUnavailable,
    /// Notion timed out while completing the request
    GatewayTimeout,
    /// OAuth grant or refresh token is invalid, expired or revoked
    InvalidGrant,
    /// HTTP status code fallback when the error body is unparseable
    HttpStatus(u16),
    /// An error code this client doesn't recognize yet
    Unknown(String),
}

impl NotionErrorCode {
    /// Parse a Notion API error code string into the typed vocabulary.
    pub fn from_api_response(code: &str) -> Self {
        match code {
            "invalid_json" => Self::InvalidJson,
            "invalid_request_url" => Self::InvalidRequestUrl,
            "invalid_request" => Self::InvalidRequest,
            "validation_error" => Self::ValidationFailed,
            "missing_version" => Self::MissingVersion,
            "unauthorized" => Self::Unauthorized,
            "restricted_resource" => Self::RestrictedResource,
            "object_not_found" => Self::ObjectNotFound,
            "conflict_error" => Self::Conflict,
            "rate_limited" => Self::RateLimited,
            "internal_server_error" => Self::InternalError,
            "service_unavailable" => Self::ServiceUnavailable,
            "database_connection_unavailable" => Self::DatabaseConnectionUnavailable,
            "gateway_timeout" => Self::GatewayTimeout,
            "invalid_grant" => Self::InvalidGrant,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Create from an HTTP status code when the error body is unparseable.
    pub fn from_http_status(status: u16) -> Self {
        Self::HttpStatus(status)
    }

    /// The coarse failure kind this code belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidJson | Self::InvalidRequestUrl | Self::InvalidRequest => {
                ErrorKind::MalformedRequest
            }
            Self::MissingVersion => ErrorKind::MalformedRequest,
            Self::ValidationFailed => ErrorKind::SchemaValidationFailed,
            Self::Unauthorized | Self::InvalidGrant => ErrorKind::Unauthorized,
            Self::RestrictedResource => ErrorKind::RestrictedResource,
            Self::ObjectNotFound => ErrorKind::NotFound,
            Self::Conflict => ErrorKind::Conflict,
            Self::RateLimited => ErrorKind::RateLimited,
            Self::InternalError => ErrorKind::ServerInternal,
            Self::ServiceUnavailable => ErrorKind::ServiceUnavailable,
            Self::DatabaseConnectionUnavailable | Self::GatewayTimeout => {
                ErrorKind::UpstreamDependencyUnavailable
            }
            Self::HttpStatus(status) => ErrorKind::from_http_status(*status),
            Self::Unknown(_) => ErrorKind::UnrecognizedErrorCode,
        }
    }

    /// Whether the server is hinting that the same request may succeed later.
    ///
    /// This is a hint for callers; nothing in this crate retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::ServiceUnavailable)
    }

    /// Whether this error means the resource simply doesn't exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ObjectNotFound)
    }
}

impl fmt::Display for NotionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson => write!(f, "invalid_json"),
            Self::InvalidRequestUrl => write!(f, "invalid_request_url"),
            Self::InvalidRequest => write!(f, "invalid_request"),
            Self::ValidationFailed => write!(f, "validation_error"),
            Self::MissingVersion => write!(f, "missing_version"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RestrictedResource => write!(f, "restricted_resource"),
            Self::ObjectNotFound => write!(f, "object_not_found"),
            Self::Conflict => write!(f, "conflict_error"),
            Self::RateLimited => write!(f, "rate_limited"),
            Self::InternalError => write!(f, "internal_server_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::DatabaseConnectionUnavailable => write!(f, "database_connection_unavailable"),
            Self::GatewayTimeout => write!(f, "gateway_timeout"),
            Self::InvalidGrant => write!(f, "invalid_grant"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// Coarse classification of server failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedRequest,
    Unauthorized,
    RestrictedResource,
    NotFound,
    Conflict,
    RateLimited,
    ServerInternal,
    ServiceUnavailable,
    UpstreamDependencyUnavailable,
    SchemaValidationFailed,
    UnrecognizedErrorCode,
}

impl ErrorKind {
    fn from_http_status(status: u16) -> Self {
        match status {
            400 => Self::MalformedRequest,
            401 => Self::Unauthorized,
            403 => Self::RestrictedResource,
            404 => Self::NotFound,
            409 => Self::Conflict,
            429 => Self::RateLimited,
            500 => Self::ServerInternal,
            503 => Self::ServiceUnavailable,
            502 | 504 => Self::UpstreamDependencyUnavailable,
            _ => Self::UnrecognizedErrorCode,
        }
    }
}

/// The JSON error envelope returned by the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub status: Option<u16>,
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// A classified server failure, carrying the server's message verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Notion API returned an error ({code}, HTTP {status}): {message}")]
pub struct NotionApiError {
    pub status: u16,
    pub code: NotionErrorCode,
    pub message: String,
    pub request_id: Option<String>,
}

impl NotionApiError {
    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

/// Classifies an error envelope into a typed failure.
///
/// The HTTP status of the response is authoritative; the envelope's own
/// `status` field is only informational.
pub fn classify(status: u16, body: &ErrorBody) -> NotionApiError {
    let code = NotionErrorCode::from_api_response(&body.code);
    if let NotionErrorCode::Unknown(raw) = &code {
        log::warn!("Unrecognized Notion error code '{}' (HTTP {})", raw, status);
    }
    NotionApiError {
        status,
        code,
        message: body.message.clone(),
        request_id: body.request_id.clone(),
    }
}

/// Classifies a raw non-2xx response body, falling back to the HTTP status
/// when the body is not an error envelope.
pub fn classify_response(status: u16, body: &serde_json::Value) -> NotionApiError {
    match ErrorBody::deserialize(body) {
        Ok(envelope) => classify(status, &envelope),
        Err(_) => NotionApiError {
            status,
            code: NotionErrorCode::from_http_status(status),
            message: format!("HTTP {} with unparseable error body", status),
            request_id: None,
        },
    }
}

/// A property payload that does not match the shape its type tag declares.
///
/// Decode failures mean the client and server schemas have diverged; they
/// always name the property type and the offending field.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("'{property_type}' value is missing field '{field}'")]
    MissingField {
        property_type: String,
        field: String,
    },

    #[error("'{property_type}' field '{field}' has the wrong shape: expected {expected}")]
    WrongShape {
        property_type: String,
        field: String,
        expected: &'static str,
    },

    #[error("Unknown property type '{type_tag}'")]
    UnknownType { type_tag: String },

    #[error("Expected a '{expected}' property item, got '{found}'")]
    TypeMismatch { expected: String, found: String },

    #[error("Invalid date '{value}' in field '{field}': {reason}")]
    InvalidDate {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unknown time zone '{value}' in field '{field}'")]
    InvalidTimeZone { field: String, value: String },

    #[error("Invalid id '{value}' in field '{field}'")]
    InvalidId { field: String, value: String },
}

/// Failure turning a value into a write payload.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    #[error("Property type '{property_type}' is read-only and cannot be written")]
    UnsupportedWrite { property_type: String },

    #[error("Cannot encode '{property_type}' value: {reason}")]
    InvalidValue {
        property_type: String,
        reason: String,
    },
}

/// Filter construction failures, raised before anything is serialized or sent.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Operator '{operator}' is not allowed for '{property}' ({property_type})")]
    OperatorNotAllowed {
        property: String,
        property_type: String,
        operator: Operator,
    },

    #[error("Operator '{operator}' on '{property}' expects {expected}, got {found}")]
    OperandMismatch {
        property: String,
        operator: Operator,
        expected: &'static str,
        found: String,
    },

    #[error("Unknown filter operator '{0}'")]
    UnknownOperator(String),

    #[error("Property '{property}' of type '{property_type}' cannot be filtered this way")]
    NotFilterable {
        property: String,
        property_type: String,
    },

    #[error("A compound '{combinator}' filter needs at least one child")]
    EmptyCompound { combinator: &'static str },
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error(transparent)]
    NotionService(#[from] NotionApiError),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Failed to decode property: {0}")]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    #[error("Property '{property}' not found in schema of database {database}")]
    PropertyNotFound { database: String, property: String },

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    ValidationError(#[from] crate::types::ValidationError),
}

impl AppError {
    /// The server failure behind this error, if it came from the API.
    pub fn as_api_error(&self) -> Option<&NotionApiError> {
        match self {
            AppError::NotionService(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;
