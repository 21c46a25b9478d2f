// src/main.rs

use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use log4rs::{
    append::console::ConsoleAppender,
    append::file::FileAppender,
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
    Config,
};
use notion_dbkit::config::{CommandLineInput, OutputMode, QueryConfig};
use notion_dbkit::constants::LOG_FILE_NAME;
use notion_dbkit::{AppError, NotionHttpClient, NotionSession, PageRow, PropertyCodec};
use std::fs;

/// Sets up logging configuration.
fn setup_logging(verbose: bool) -> anyhow::Result<()> {
    let log_level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };

    let log_file_path = std::env::temp_dir().join(LOG_FILE_NAME);
    if let Some(parent) = log_file_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let pattern = if verbose {
        "{d(%Y-%m-%d %H:%M:%S)} [{l}] - {m}{n}"
    } else {
        "{m}{n}"
    };

    // Logs go to stderr so stdout stays parseable.
    let stderr_appender = ConsoleAppender::builder()
        .target(log4rs::append::console::Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(pattern)))
        .build();

    let file_appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} [{l}] {t} - {m}{n}",
        )))
        .build(&log_file_path)
        .with_context(|| format!("cannot open log file {}", log_file_path.display()))?;

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr_appender)))
        .appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(LevelFilter::Debug)))
                .build("file", Box::new(file_appender)),
        )
        .build(
            Root::builder()
                .appender("stderr")
                .appender("file")
                .build(log_level),
        )?;

    log4rs::init_config(config)?;
    log::info!("Logging initialized. Log file: {}", log_file_path.display());
    Ok(())
}

/// Runs the configured query and prints the result.
async fn run_query(config: QueryConfig) -> Result<(), AppError> {
    let transport = NotionHttpClient::new(&config.client)?;
    let session = NotionSession::new(transport, PropertyCodec::new(config.client.time_zone));

    let mut query = session.query(config.database.clone()).sorts(&config.sorts);
    if let Some(filter) = &config.filter {
        log::debug!("Filter with {} conditions", filter.leaf_count());
        query = query.filter(filter);
    }
    if let Some(limit) = config.limit {
        query = query.limit(limit);
    }

    match config.output {
        OutputMode::Rows => {
            let rows = query.rows().await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputMode::Ids => {
            for id in query.page_ids().await? {
                println!("{}", id.to_dashed());
            }
        }
        OutputMode::Show(names) => {
            let pages = query.select_properties(names.iter().cloned()).pages().await?;
            for page in &pages {
                println!("{}", show_line(page, &names)?);
            }
        }
    }
    Ok(())
}

/// One tab-separated line: the page id, then each named property flattened.
fn show_line(page: &PageRow, names: &[String]) -> Result<String, AppError> {
    let mut fields = vec![page.id.to_dashed()];
    for name in names {
        let text = page
            .property(name)?
            .map(|value| value.display_text())
            .unwrap_or_default();
        fields.push(text);
    }
    Ok(fields.join("\t"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLineInput::parse();

    setup_logging(cli.verbose)?;

    let config = QueryConfig::resolve(cli).context("invalid configuration")?;

    if let Err(err) = run_query(config).await {
        if let Some(api) = err.as_api_error() {
            log::debug!("Request id: {:?}", api.request_id);
            if api.is_retryable() {
                eprintln!("The Notion API asked to retry later; nothing was printed.");
            }
        }
        return Err(err.into());
    }
    Ok(())
}
