// src/config.rs
use crate::constants::{DEFAULT_TIME_ZONE, NOTION_API_BASE_URL, NOTION_API_VERSION};
use crate::error::AppError;
use crate::model::PropertyType;
use crate::query::{
    CompoundFilter, ConditionFamily, Direction, FilterNode, Operand, Operator, PropertyFilter,
    SortCriterion, SortSpec, Timestamp, TimestampFilter,
};
use crate::types::{parse_time_zone, ApiKey, DatabaseId, ValidationError};
use chrono_tz::Tz;
use clap::Parser;

/// Parsed command-line input.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CommandLineInput {
    /// Notion database URL or ID
    pub database: String,

    /// Filter clause NAME:TYPE:OPERATOR[:VALUE] (repeatable), e.g. "Done:checkbox:equals:true"
    #[arg(short = 'w', long = "where")]
    pub clauses: Vec<String>,

    /// Match rows satisfying any clause instead of all of them
    #[arg(long, default_value_t = false)]
    pub any: bool,

    /// Only rows created on or after this ISO 8601 date
    #[arg(long)]
    pub created_since: Option<String>,

    /// Sort criterion NAME:asc|desc, or @created_time / @last_edited_time (repeatable)
    #[arg(short, long = "sort")]
    pub sorts: Vec<String>,

    /// Maximum number of rows to return
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Print page ids only
    #[arg(long, default_value_t = false)]
    pub ids_only: bool,

    /// Print these properties as one flattened line per row (repeatable)
    #[arg(long = "show")]
    pub show: Vec<String>,

    /// IANA time zone for dates without one
    #[arg(long, default_value = DEFAULT_TIME_ZONE)]
    pub timezone: String,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Everything a transport and codec need to talk to the API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: ApiKey,
    pub notion_version: String,
    pub base_url: String,
    pub time_zone: Tz,
}

impl ClientConfig {
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            notion_version: NOTION_API_VERSION.to_string(),
            base_url: NOTION_API_BASE_URL.to_string(),
            time_zone: Tz::UTC,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_notion_version(mut self, version: impl Into<String>) -> Self {
        self.notion_version = version.into();
        self
    }

    pub fn with_time_zone(mut self, zone: Tz) -> Self {
        self.time_zone = zone;
        self
    }
}

/// How query results are printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputMode {
    /// Raw rows as a JSON array.
    Rows,
    Ids,
    /// One line per row with these properties flattened.
    Show(Vec<String>),
}

/// Validated configuration for one CLI run.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub client: ClientConfig,
    pub database: DatabaseId,
    pub filter: Option<FilterNode>,
    pub sorts: SortSpec,
    pub limit: Option<usize>,
    pub output: OutputMode,
}

impl QueryConfig {
    /// Resolves the run configuration from CLI input and the environment.
    pub fn resolve(cli: CommandLineInput) -> Result<Self, AppError> {
        let api_key = std::env::var("NOTION_API_KEY").map_err(|_| {
            AppError::MissingConfiguration(
                "NOTION_API_KEY environment variable not set".to_string(),
            )
        })?;
        let version = std::env::var("NOTION_VERSION").ok();
        Self::from_parts(cli, &api_key, version)
    }

    /// Resolves with explicit credentials. Every clause is validated here,
    /// before any request is made.
    pub fn from_parts(
        cli: CommandLineInput,
        api_key: &str,
        notion_version: Option<String>,
    ) -> Result<Self, AppError> {
        let mut client = ClientConfig::new(ApiKey::new(api_key)?)
            .with_time_zone(parse_time_zone(&cli.timezone)?);
        if let Some(version) = notion_version.filter(|v| !v.trim().is_empty()) {
            client = client.with_notion_version(version);
        }

        let database = DatabaseId::parse(&cli.database)?;

        let mut leaves = cli
            .clauses
            .iter()
            .map(|clause| parse_clause(clause))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(since) = &cli.created_since {
            leaves.push(TimestampFilter::created_time(
                Operator::OnOrAfter,
                since.as_str(),
            )?);
        }
        let filter = combine(leaves, cli.any)?;

        let sorts = cli
            .sorts
            .iter()
            .map(|sort| parse_sort(sort))
            .collect::<Result<SortSpec, _>>()?;

        let output = if cli.ids_only {
            OutputMode::Ids
        } else if !cli.show.is_empty() {
            OutputMode::Show(cli.show)
        } else {
            OutputMode::Rows
        };

        Ok(Self {
            client,
            database,
            filter,
            sorts,
            limit: cli.limit,
            output,
        })
    }
}

fn combine(mut leaves: Vec<FilterNode>, any: bool) -> Result<Option<FilterNode>, AppError> {
    let combined = match leaves.len() {
        0 => None,
        1 => leaves.pop(),
        _ if any => Some(CompoundFilter::or(leaves)?),
        _ => Some(CompoundFilter::and(leaves)?),
    };
    Ok(combined)
}

fn invalid_clause(clause: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidClause {
        clause: clause.to_string(),
        reason: reason.into(),
    }
}

/// Parses `NAME:TYPE:OPERATOR[:VALUE]` into a property filter.
///
/// The value may itself contain colons (`2024-01-01T09:30`). A missing value
/// is an empty operand, which is what `is_empty` and the relative date
/// operators take.
pub fn parse_clause(clause: &str) -> Result<FilterNode, AppError> {
    let mut parts = clause.splitn(4, ':');
    let (Some(name), Some(type_tag), Some(operator)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(invalid_clause(clause, "expected NAME:TYPE:OPERATOR[:VALUE]").into());
    };
    if name.is_empty() {
        return Err(invalid_clause(clause, "property name is empty").into());
    }

    let property_type: PropertyType = type_tag
        .parse()
        .map_err(|tag| invalid_clause(clause, format!("unknown property type '{}'", tag)))?;
    let operator: Operator = operator.parse()?;

    let operand = match parts.next() {
        None => Operand::Empty,
        Some(raw) => match ConditionFamily::for_property_type(property_type) {
            Some(family) => family.parse_operand(raw),
            None => Operand::Text(raw.to_string()),
        },
    };

    Ok(PropertyFilter::new(name, property_type, operator, operand)?)
}

/// Parses `NAME:asc|desc` or `@created_time[:dir]` / `@last_edited_time[:dir]`.
/// The direction defaults to ascending.
pub fn parse_sort(spec: &str) -> Result<SortCriterion, AppError> {
    let (key, direction) = match spec.rsplit_once(':') {
        Some((key, "asc" | "ascending")) => (key, Direction::Ascending),
        Some((key, "desc" | "descending")) => (key, Direction::Descending),
        _ => (spec, Direction::Ascending),
    };
    if key.is_empty() {
        return Err(invalid_clause(spec, "sort key is empty").into());
    }

    if let Some(timestamp) = key.strip_prefix('@') {
        let timestamp: Timestamp = timestamp
            .parse()
            .map_err(|reason: String| invalid_clause(spec, reason))?;
        return Ok(SortCriterion::timestamp(timestamp, direction));
    }

    Ok(match direction {
        Direction::Ascending => SortCriterion::ascending(key),
        Direction::Descending => SortCriterion::descending(key),
    })
}
