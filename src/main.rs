//! Sanctions Screen batch runner
//!
//! Loads the lists, screens every row of a delimited input file and writes
//! the responses as a JSON array. The background refresh loop keeps running
//! while the batch is screened.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use regex::Regex;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sanctions_screen::{
    batch::{parse_input_file, screen_rows},
    run_refresh_loop, DownloadStatsStore, EngineConfig, InMemoryDownloadStatsStore,
    RefreshPipeline, Searcher, SourcesConfig,
};

#[derive(Debug, Parser)]
#[command(name = "sanctions-screen", about = "Screen names against sanctions lists")]
struct Args {
    /// Input file of id, email, name rows (header first)
    #[arg(long, env = "SCREEN_INPUT_FILE", default_value = "./data/input.tsv")]
    file: PathBuf,

    /// Field delimiter, as a regular expression
    #[arg(long, env = "SCREEN_DELIMITER", default_value = "\t")]
    delimiter: String,

    /// Minimum match score to report [default: SEARCH_MIN_MATCH]
    #[arg(long)]
    threshold: Option<f64>,

    /// Maximum matches per list [default: SEARCH_LIMIT]
    #[arg(long)]
    limit: Option<usize>,

    /// List sources YAML
    #[arg(long, env = "SCREEN_SOURCES", default_value = "config/sources.yaml")]
    sources: PathBuf,

    /// Where to write the JSON results
    #[arg(long, env = "SCREEN_OUTPUT", default_value = "./data/output.json")]
    output: PathBuf,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Plain,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let logging = tracing_subscriber::registry().with(
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "sanctions_screen=info".into()),
    );
    match args.log_format {
        LogFormat::Plain => logging.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => logging
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }

    let delimiter = Regex::new(&args.delimiter)
        .with_context(|| format!("invalid delimiter pattern {:?}", args.delimiter))?;

    let config = EngineConfig::from_env()?.with_search_overrides(args.limit, args.threshold)?;
    tracing::info!(
        workers = config.workers,
        limit = config.search_limit,
        min_match = config.min_match,
        refresh_interval = ?config.refresh_interval,
        "Configuration loaded"
    );

    let sources = SourcesConfig::from_file(&args.sources)?;
    tracing::info!(path = %args.sources.display(), sources = sources.sources.len(), "List sources loaded");

    let searcher = Arc::new(Searcher::from_config(&config));
    let pipeline = Arc::new(RefreshPipeline::with_defaults(
        sources.sources,
        config.name_pipeline(),
    ));
    let stats_store = Arc::new(InMemoryDownloadStatsStore::new());

    // Nothing to screen against without an initial load
    let stats = pipeline
        .refresh(&searcher, config.initial_data_dir.as_deref())
        .await
        .context("initial data refresh failed")?;
    tracing::info!(
        sdns = stats.entities,
        alt_names = stats.alt_names,
        addresses = stats.addresses,
        denied_persons = stats.denied_persons,
        screening_list = stats.screening_list,
        "Initial data load complete"
    );
    if let Err(e) = stats_store.record(stats).await {
        tracing::warn!(error = %e, "failed to record download stats");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresh_handle = tokio::spawn(run_refresh_loop(
        Arc::clone(&pipeline),
        Arc::clone(&searcher),
        config.refresh_interval,
        stats_store.clone(),
        shutdown_rx,
    ));

    let rows = parse_input_file(&args.file, &delimiter)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    tracing::info!(rows = rows.len(), "Screening input");

    let results = screen_rows(
        Arc::clone(&searcher),
        rows,
        config.search_limit,
        config.min_match,
        config.workers,
    )
    .await;

    let json = serde_json::to_string_pretty(&results)?;
    if let Some(parent) = args.output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&args.output, json)
        .await
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    tracing::info!(path = %args.output.display(), results = results.len(), "Results written");

    shutdown_tx.send(true).ok();
    if let Err(e) = refresh_handle.await {
        tracing::warn!(error = %e, "refresh loop task failed");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_flags_default_to_config() {
        let args = Args::try_parse_from(["sanctions-screen"]).unwrap();
        assert_eq!(args.limit, None);
        assert_eq!(args.threshold, None);

        let config = EngineConfig::default()
            .with_search_overrides(args.limit, args.threshold)
            .unwrap();
        assert_eq!(config.search_limit, EngineConfig::default().search_limit);
    }

    #[test]
    fn test_search_flags_override_config() {
        let args =
            Args::try_parse_from(["sanctions-screen", "--limit", "1", "--threshold", "0.9"]).unwrap();
        let config = EngineConfig::default()
            .with_search_overrides(args.limit, args.threshold)
            .unwrap();
        assert_eq!(config.search_limit, 1);
        assert_eq!(config.min_match, 0.9);

        let args = Args::try_parse_from(["sanctions-screen", "--threshold", "2"]).unwrap();
        assert!(EngineConfig::default()
            .with_search_overrides(args.limit, args.threshold)
            .is_err());
    }

    #[test]
    fn test_log_format_flag() {
        let args = Args::try_parse_from(["sanctions-screen", "--log-format", "json"]).unwrap();
        assert_eq!(args.log_format, LogFormat::Json);
        assert!(Args::try_parse_from(["sanctions-screen", "--log-format", "xml"]).is_err());
    }
}
