use crate::types::{Color, UserId};
use chrono::{DateTime, Utc};
use std::fmt;

/// A select, multi-select or status option.
///
/// `id` and `color` are server-assigned; an option built locally for a
/// write may carry only a name.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub id: Option<String>,
    pub name: String,
    pub color: Option<Color>,
}

impl SelectOption {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            color: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserKind {
    Person,
    Bot,
}

/// A workspace member or integration.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub kind: Option<UserKind>,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.name, &self.email) {
            (Some(name), _) => write!(f, "{}", name),
            (None, Some(email)) => write!(f, "{}", email),
            (None, None) => write!(f, "User {}", self.id),
        }
    }
}

/// Where a file's bytes live.
#[derive(Debug, Clone, PartialEq)]
pub enum FileSource {
    External {
        url: String,
    },
    /// Uploaded to Notion; the url is signed and stops working after `expiry_time`.
    Hosted {
        url: String,
        expiry_time: Option<DateTime<Utc>>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileObject {
    pub name: String,
    pub source: FileSource,
}

impl FileObject {
    pub fn external(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: FileSource::External { url: url.into() },
        }
    }

    pub fn url(&self) -> &str {
        match &self.source {
            FileSource::External { url } | FileSource::Hosted { url, .. } => url,
        }
    }
}
