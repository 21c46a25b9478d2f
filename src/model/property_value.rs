use super::{FileObject, PropertyType, RichText, SelectOption, User};
use crate::types::PageId;
use chrono::{DateTime, FixedOffset, Offset, SecondsFormat, Utc};
use chrono_tz::Tz;
use std::fmt;

/// A decoded property value.
///
/// Each variant carries exactly the payload its type defines. `Formula`
/// and `Rollup` wrap other values; everything else is a leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Title(RichText),
    RichText(RichText),
    Number(Option<f64>),
    Checkbox(bool),
    /// `None` is an explicitly cleared select, not a missing property.
    Select(Option<SelectOption>),
    MultiSelect(Vec<SelectOption>),
    Status(Option<SelectOption>),
    Date(Option<NotionDate>),
    People(Vec<User>),
    Files(Vec<FileObject>),
    /// `has_more` is set when the page object carried only a prefix of the
    /// relation; the full list is available through the property item endpoint.
    Relation {
        pages: Vec<PageId>,
        has_more: bool,
    },
    Formula(FormulaValue),
    Rollup(RollupValue),
    CreatedTime(DateTime<Utc>),
    CreatedBy(User),
    LastEditedTime(DateTime<Utc>),
    LastEditedBy(User),
    Url(Option<String>),
    Email(Option<String>),
    PhoneNumber(Option<String>),
    UniqueId {
        prefix: Option<String>,
        number: u64,
    },
}

impl PropertyValue {
    pub fn property_type(&self) -> PropertyType {
        match self {
            PropertyValue::Title(_) => PropertyType::Title,
            PropertyValue::RichText(_) => PropertyType::RichText,
            PropertyValue::Number(_) => PropertyType::Number,
            PropertyValue::Checkbox(_) => PropertyType::Checkbox,
            PropertyValue::Select(_) => PropertyType::Select,
            PropertyValue::MultiSelect(_) => PropertyType::MultiSelect,
            PropertyValue::Status(_) => PropertyType::Status,
            PropertyValue::Date(_) => PropertyType::Date,
            PropertyValue::People(_) => PropertyType::People,
            PropertyValue::Files(_) => PropertyType::Files,
            PropertyValue::Relation { .. } => PropertyType::Relation,
            PropertyValue::Formula(_) => PropertyType::Formula,
            PropertyValue::Rollup(_) => PropertyType::Rollup,
            PropertyValue::CreatedTime(_) => PropertyType::CreatedTime,
            PropertyValue::CreatedBy(_) => PropertyType::CreatedBy,
            PropertyValue::LastEditedTime(_) => PropertyType::LastEditedTime,
            PropertyValue::LastEditedBy(_) => PropertyType::LastEditedBy,
            PropertyValue::Url(_) => PropertyType::Url,
            PropertyValue::Email(_) => PropertyType::Email,
            PropertyValue::PhoneNumber(_) => PropertyType::PhoneNumber,
            PropertyValue::UniqueId { .. } => PropertyType::UniqueId,
        }
    }

    /// Whether this value is only a prefix of the full server-side value.
    pub fn is_partial(&self) -> bool {
        matches!(self, PropertyValue::Relation { has_more: true, .. })
    }

    /// The text of a title or rich text value.
    pub fn as_rich_text(&self) -> Option<&RichText> {
        match self {
            PropertyValue::Title(text) | PropertyValue::RichText(text) => Some(text),
            _ => None,
        }
    }

    /// Renders the value as one flat line of text.
    ///
    /// Rich text is concatenated, lists are joined with `", "`, dates and
    /// timestamps are ISO 8601 and unset values render as the empty string.
    pub fn display_text(&self) -> String {
        match self {
            PropertyValue::Title(text) | PropertyValue::RichText(text) => text.plain_text(),
            PropertyValue::Number(number) => number.map(|n| n.to_string()).unwrap_or_default(),
            PropertyValue::Checkbox(checked) => checked.to_string(),
            PropertyValue::Select(option) | PropertyValue::Status(option) => option
                .as_ref()
                .map(|o| o.name.clone())
                .unwrap_or_default(),
            PropertyValue::MultiSelect(options) => join(options.iter().map(|o| o.name.clone())),
            PropertyValue::Date(date) => date.as_ref().map(|d| d.to_string()).unwrap_or_default(),
            PropertyValue::People(users) => join(users.iter().map(|u| u.to_string())),
            PropertyValue::Files(files) => join(files.iter().map(|f| f.name.clone())),
            PropertyValue::Relation { pages, .. } => join(pages.iter().map(|p| p.to_dashed())),
            PropertyValue::Formula(formula) => formula.display_text(),
            PropertyValue::Rollup(rollup) => rollup.display_text(),
            PropertyValue::CreatedTime(ts) | PropertyValue::LastEditedTime(ts) => {
                ts.to_rfc3339_opts(SecondsFormat::Millis, true)
            }
            PropertyValue::CreatedBy(user) | PropertyValue::LastEditedBy(user) => user.to_string(),
            PropertyValue::Url(s) | PropertyValue::Email(s) | PropertyValue::PhoneNumber(s) => {
                s.clone().unwrap_or_default()
            }
            PropertyValue::UniqueId { prefix, number } => match prefix {
                Some(prefix) => format!("{}-{}", prefix, number),
                None => number.to_string(),
            },
        }
    }
}

fn join(parts: impl Iterator<Item = String>) -> String {
    parts.collect::<Vec<_>>().join(", ")
}

/// A single instant or an interval between two instants.
#[derive(Debug, Clone, PartialEq)]
pub enum DateSpan {
    Instant(DateTime<Tz>),
    Interval { start: DateTime<Tz>, end: DateTime<Tz> },
}

/// How one date bound is spelled on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundFormat {
    /// `2023-04-01`
    DateOnly,
    /// `2023-04-03T09:30:00.000`, read in the value's zone.
    WallClock,
    /// `2023-04-01T12:00:00.000+00:00`; the offset the payload carried.
    Offset(FixedOffset),
}

impl BoundFormat {
    pub fn includes_time(&self) -> bool {
        !matches!(self, BoundFormat::DateOnly)
    }

    /// Renders `value` in this format.
    pub fn render(&self, value: &DateTime<Tz>) -> String {
        match self {
            BoundFormat::DateOnly => value.format("%Y-%m-%d").to_string(),
            BoundFormat::WallClock => value.format("%Y-%m-%dT%H:%M:%S%.3f").to_string(),
            BoundFormat::Offset(offset) => value
                .with_timezone(offset)
                .to_rfc3339_opts(SecondsFormat::Millis, false),
        }
    }
}

/// A date property payload, materialized in a concrete time zone.
///
/// Each bound remembers its own wire format, so a date-only start with a
/// timed end writes back exactly as it was read.
#[derive(Debug, Clone, PartialEq)]
pub struct NotionDate {
    pub span: DateSpan,
    /// The zone named by the payload itself, if any.
    pub time_zone: Option<Tz>,
    pub start_format: BoundFormat,
    /// Same as `start_format` for a single instant.
    pub end_format: BoundFormat,
}

impl NotionDate {
    /// Builds a date for writing. Timed bounds are spelled as wall-clock
    /// time when `time_zone` is set and with their own offset otherwise.
    pub fn new(span: DateSpan, time_zone: Option<Tz>, includes_time: bool) -> Self {
        let format_of = |value: &DateTime<Tz>| match (includes_time, time_zone) {
            (false, _) => BoundFormat::DateOnly,
            (true, Some(_)) => BoundFormat::WallClock,
            (true, None) => BoundFormat::Offset(value.offset().fix()),
        };
        let (start_format, end_format) = match &span {
            DateSpan::Instant(start) => (format_of(start), format_of(start)),
            DateSpan::Interval { start, end } => (format_of(start), format_of(end)),
        };
        Self {
            span,
            time_zone,
            start_format,
            end_format,
        }
    }

    pub fn start(&self) -> &DateTime<Tz> {
        match &self.span {
            DateSpan::Instant(start) | DateSpan::Interval { start, .. } => start,
        }
    }

    pub fn end(&self) -> Option<&DateTime<Tz>> {
        match &self.span {
            DateSpan::Instant(_) => None,
            DateSpan::Interval { end, .. } => Some(end),
        }
    }

    pub fn is_interval(&self) -> bool {
        matches!(self.span, DateSpan::Interval { .. })
    }

    /// Whether any bound carries a time of day.
    pub fn includes_time(&self) -> bool {
        self.start_format.includes_time()
            || (self.is_interval() && self.end_format.includes_time())
    }

    fn display_bound(value: &DateTime<Tz>, format: BoundFormat) -> String {
        if format.includes_time() {
            value.to_rfc3339_opts(SecondsFormat::Secs, true)
        } else {
            value.format("%Y-%m-%d").to_string()
        }
    }
}

impl fmt::Display for NotionDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            DateSpan::Instant(start) => {
                write!(f, "{}", Self::display_bound(start, self.start_format))
            }
            DateSpan::Interval { start, end } => write!(
                f,
                "{} → {}",
                Self::display_bound(start, self.start_format),
                Self::display_bound(end, self.end_format)
            ),
        }
    }
}

/// The result of a formula; `None` when the formula evaluated to nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum FormulaValue {
    String(Option<String>),
    Number(Option<f64>),
    Boolean(Option<bool>),
    Date(Option<NotionDate>),
}

impl FormulaValue {
    pub fn display_text(&self) -> String {
        match self {
            FormulaValue::String(s) => s.clone().unwrap_or_default(),
            FormulaValue::Number(n) => n.map(|n| n.to_string()).unwrap_or_default(),
            FormulaValue::Boolean(b) => b.map(|b| b.to_string()).unwrap_or_default(),
            FormulaValue::Date(d) => d.as_ref().map(|d| d.to_string()).unwrap_or_default(),
        }
    }
}

/// Aggregation applied by a rollup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RollupFunction {
    ShowOriginal,
    ShowUnique,
    Count,
    CountValues,
    Unique,
    Empty,
    NotEmpty,
    PercentEmpty,
    PercentNotEmpty,
    Checked,
    Unchecked,
    PercentChecked,
    PercentUnchecked,
    Sum,
    Average,
    Median,
    Min,
    Max,
    Range,
    EarliestDate,
    LatestDate,
    DateRange,
    CountPerGroup,
    PercentPerGroup,
    /// A function name this client does not know yet.
    Other(String),
}

impl RollupFunction {
    pub fn from_wire(name: &str) -> Self {
        match name {
            "show_original" => Self::ShowOriginal,
            "show_unique" => Self::ShowUnique,
            "count" => Self::Count,
            "count_values" => Self::CountValues,
            "unique" => Self::Unique,
            "empty" => Self::Empty,
            "not_empty" => Self::NotEmpty,
            "percent_empty" => Self::PercentEmpty,
            "percent_not_empty" => Self::PercentNotEmpty,
            "checked" => Self::Checked,
            "unchecked" => Self::Unchecked,
            "percent_checked" => Self::PercentChecked,
            "percent_unchecked" => Self::PercentUnchecked,
            "sum" => Self::Sum,
            "average" => Self::Average,
            "median" => Self::Median,
            "min" => Self::Min,
            "max" => Self::Max,
            "range" => Self::Range,
            "earliest_date" => Self::EarliestDate,
            "latest_date" => Self::LatestDate,
            "date_range" => Self::DateRange,
            "count_per_group" => Self::CountPerGroup,
            "percent_per_group" => Self::PercentPerGroup,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::ShowOriginal => "show_original",
            Self::ShowUnique => "show_unique",
            Self::Count => "count",
            Self::CountValues => "count_values",
            Self::Unique => "unique",
            Self::Empty => "empty",
            Self::NotEmpty => "not_empty",
            Self::PercentEmpty => "percent_empty",
            Self::PercentNotEmpty => "percent_not_empty",
            Self::Checked => "checked",
            Self::Unchecked => "unchecked",
            Self::PercentChecked => "percent_checked",
            Self::PercentUnchecked => "percent_unchecked",
            Self::Sum => "sum",
            Self::Average => "average",
            Self::Median => "median",
            Self::Min => "min",
            Self::Max => "max",
            Self::Range => "range",
            Self::EarliestDate => "earliest_date",
            Self::LatestDate => "latest_date",
            Self::DateRange => "date_range",
            Self::CountPerGroup => "count_per_group",
            Self::PercentPerGroup => "percent_per_group",
            Self::Other(name) => name,
        }
    }

    /// Group aggregates have no structural representation in the API.
    pub fn is_group_aggregate(&self) -> bool {
        matches!(self, Self::CountPerGroup | Self::PercentPerGroup)
    }
}

impl fmt::Display for RollupFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RollupResult {
    Number(Option<f64>),
    Date(Option<NotionDate>),
    /// Each element decoded by its own type tag, in delivered order.
    Array(Vec<PropertyValue>),
    /// The server has not finished computing the rollup.
    Incomplete,
    /// The aggregate exists but the API does not expose its result.
    Unsupported,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollupValue {
    pub function: RollupFunction,
    pub result: RollupResult,
}

impl RollupValue {
    pub fn is_unsupported(&self) -> bool {
        matches!(self.result, RollupResult::Unsupported)
    }

    pub fn display_text(&self) -> String {
        match &self.result {
            RollupResult::Number(n) => n.map(|n| n.to_string()).unwrap_or_default(),
            RollupResult::Date(d) => d.as_ref().map(|d| d.to_string()).unwrap_or_default(),
            RollupResult::Array(items) => join(items.iter().map(PropertyValue::display_text)),
            RollupResult::Incomplete => String::new(),
            RollupResult::Unsupported => format!("<unsupported rollup: {}>", self.function),
        }
    }
}
