use std::fmt;

/// The closed set of property types this client understands.
///
/// A type tag outside this set is not silently mapped to a catch-all:
/// [`PropertyType::from_tag`] returns `None` and decoding reports the raw tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyType {
    Title,
    RichText,
    Number,
    Checkbox,
    Select,
    MultiSelect,
    Status,
    Date,
    People,
    Files,
    Relation,
    Formula,
    Rollup,
    CreatedTime,
    CreatedBy,
    LastEditedTime,
    LastEditedBy,
    Url,
    Email,
    PhoneNumber,
    UniqueId,
}

impl PropertyType {
    /// Every known type, in wire-documentation order.
    pub const ALL: [PropertyType; 21] = [
        PropertyType::Title,
        PropertyType::RichText,
        PropertyType::Number,
        PropertyType::Checkbox,
        PropertyType::Select,
        PropertyType::MultiSelect,
        PropertyType::Status,
        PropertyType::Date,
        PropertyType::People,
        PropertyType::Files,
        PropertyType::Relation,
        PropertyType::Formula,
        PropertyType::Rollup,
        PropertyType::CreatedTime,
        PropertyType::CreatedBy,
        PropertyType::LastEditedTime,
        PropertyType::LastEditedBy,
        PropertyType::Url,
        PropertyType::Email,
        PropertyType::PhoneNumber,
        PropertyType::UniqueId,
    ];

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|ty| ty.as_str() == tag)
    }

    /// The wire tag, which is also the key holding the payload.
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Title => "title",
            PropertyType::RichText => "rich_text",
            PropertyType::Number => "number",
            PropertyType::Checkbox => "checkbox",
            PropertyType::Select => "select",
            PropertyType::MultiSelect => "multi_select",
            PropertyType::Status => "status",
            PropertyType::Date => "date",
            PropertyType::People => "people",
            PropertyType::Files => "files",
            PropertyType::Relation => "relation",
            PropertyType::Formula => "formula",
            PropertyType::Rollup => "rollup",
            PropertyType::CreatedTime => "created_time",
            PropertyType::CreatedBy => "created_by",
            PropertyType::LastEditedTime => "last_edited_time",
            PropertyType::LastEditedBy => "last_edited_by",
            PropertyType::Url => "url",
            PropertyType::Email => "email",
            PropertyType::PhoneNumber => "phone_number",
            PropertyType::UniqueId => "unique_id",
        }
    }

    /// Computed and server-maintained types cannot be written.
    pub fn is_writable(&self) -> bool {
        !matches!(
            self,
            PropertyType::Formula
                | PropertyType::Rollup
                | PropertyType::CreatedTime
                | PropertyType::CreatedBy
                | PropertyType::LastEditedTime
                | PropertyType::LastEditedBy
                | PropertyType::UniqueId
        )
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| s.to_string())
    }
}
