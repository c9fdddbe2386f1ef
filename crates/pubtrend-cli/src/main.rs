//! pubtrend — ingest PubMed archives and compute topic trend series.
//!
//! Run with: cargo run -p pubtrend-cli -- ingest /path/to/archives
//!           cargo run -p pubtrend-cli -- trend

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use pubtrend_config::Config;
use pubtrend_ingestion::{discover_archives, run_ingestion, IngestionJob};
use pubtrend_search::HttpSearchEngine;
use pubtrend_trends::{TopicGroup, TrendAggregator};

#[derive(Parser)]
#[command(name = "pubtrend", about = "PubMed ingestion and topic trend analysis")]
struct Cli {
    /// Config file (default: PUBTREND_CONFIG or ./pubtrend.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract records from gzip XML archives and bulk-load the index.
    Ingest {
        /// Archive paths, in processing order. When omitted, the configured
        /// archive_dir is scanned for *.gz files.
        archives: Vec<PathBuf>,
    },
    /// Compute trend series for the configured topic groups and write them
    /// as a timestamped JSON artifact for plotting.
    Trend,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::discover()?,
    };

    let engine = HttpSearchEngine::new(&cfg.engine)?;

    match cli.command {
        Command::Ingest { archives } => {
            let archives = if archives.is_empty() {
                let dir = cfg
                    .ingestion
                    .archive_dir
                    .as_deref()
                    .context("no archives given and ingestion.archive_dir not configured")?;
                discover_archives(dir)?
            } else {
                archives
            };
            if archives.is_empty() {
                bail!("no .gz archives to ingest");
            }

            info!(archives = archives.len(), index = %cfg.index.name, "Starting ingestion");
            let report = run_ingestion(&engine, IngestionJob::from_config(&cfg, archives)).await?;
            info!(
                archives = report.archives_processed,
                records = report.records_indexed,
                skipped = report.records_skipped,
                duration_ms = report.duration_ms,
                "Ingestion finished"
            );
        }

        Command::Trend => {
            if cfg.trends.topics.is_empty() {
                bail!("no [[trends.topics]] configured");
            }
            let groups: Vec<TopicGroup> = cfg
                .trends
                .topics
                .iter()
                .cloned()
                .map(TopicGroup::from)
                .collect();

            let aggregator = TrendAggregator::new(&engine, cfg.index.name.clone(), &cfg.trends);
            let series = aggregator.series_for_all(&groups).await?;

            let timestamp = chrono::Utc::now().format("%m-%d-%Y-%H-%M-%S");
            let path = PathBuf::from(&cfg.trends.output_dir)
                .join(format!("trends_pubmed_{timestamp}.json"));
            std::fs::write(&path, serde_json::to_string_pretty(&series)?)
                .with_context(|| format!("cannot write {}", path.display()))?;
            info!(series = series.len(), path = %path.display(), "Trend series written");
        }
    }

    Ok(())
}
