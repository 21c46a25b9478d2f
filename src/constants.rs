// src/constants.rs
//! Constants that define the operational boundaries of the client.
//!
//! Each constant is named for the protocol concept it constrains, not its
//! technical role.

// ---------------------------------------------------------------------------
// Notion API boundaries
// ---------------------------------------------------------------------------

/// How many objects the Notion API returns per page of results.
///
/// The Notion API maximum is 100. A smaller size is requested only when the
/// caller's result cap leaves less than a full page to fetch.
pub const NOTION_API_PAGE_SIZE: usize = 100;

/// The API version sent in the `Notion-Version` header unless overridden.
pub const NOTION_API_VERSION: &str = "2022-06-28";

/// Base URL of the public Notion API.
pub const NOTION_API_BASE_URL: &str = "https://api.notion.com/v1";

// ---------------------------------------------------------------------------
// Local defaults
// ---------------------------------------------------------------------------

/// Time zone used to interpret dates when neither the value nor the caller
/// names one.
pub const DEFAULT_TIME_ZONE: &str = "UTC";

/// Name of the log file written to the system temp directory.
pub const LOG_FILE_NAME: &str = "notion_dbkit.log";
