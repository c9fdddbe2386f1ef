//! End-to-end ingestion pipeline.
//!
//! Orchestrates one ingestion run:
//!   1. Recreate the index schema (skippable when topping up an existing corpus)
//!   2. Per archive, strictly sequentially: extract → bulk load → refresh
//!   3. Report per-archive parse/index timings and a run summary
//!
//! Archive N is indexed and refreshed before archive N+1 begins, so when the
//! same PMID reappears across archives (the daily update files re-issue
//! records), the last-processed archive wins.

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument, warn};

use pubtrend_common::{PubtrendError, Result};
use pubtrend_config::{Config, IndexConfig, MalformedPolicy};
use pubtrend_search::SearchEngine;

use crate::extractor::RecordReader;
use crate::loader::BulkLoader;
use crate::models::PubmedPaper;
use crate::schema::SchemaManager;

// ── Job config ────────────────────────────────────────────────────────────────

/// Parameters for a single ingestion run.
#[derive(Debug, Clone)]
pub struct IngestionJob {
    /// Ordered archive paths; order determines which record wins on PMID reuse.
    pub archives: Vec<PathBuf>,
    pub index: IndexConfig,
    pub on_malformed: MalformedPolicy,
    pub batch_size: Option<usize>,
    pub recreate_index: bool,
}

impl IngestionJob {
    pub fn from_config(cfg: &Config, archives: Vec<PathBuf>) -> Self {
        Self {
            archives,
            index: cfg.index.clone(),
            on_malformed: cfg.ingestion.on_malformed,
            batch_size: cfg.ingestion.batch_size,
            recreate_index: cfg.ingestion.recreate_index,
        }
    }
}

// ── Result summary ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub archives_processed: usize,
    pub records_indexed: usize,
    /// Malformed articles passed over under the `skip` policy.
    pub records_skipped: usize,
    pub duration_ms: u64,
}

// ── Archive discovery ─────────────────────────────────────────────────────────

/// All `*.gz` files in a directory, sorted by name. PubMed baseline and
/// update files are numbered, so name order is processing order.
pub fn discover_archives(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut archives = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|e| e == "gz") {
            archives.push(path);
        }
    }
    archives.sort();
    Ok(archives)
}

// ── Pipeline orchestrator ─────────────────────────────────────────────────────

/// Runs the end-to-end ingestion pipeline for one job.
///
/// Schema recreation happens before any bulk load and never concurrently
/// with one. Extraction errors follow the job's malformed-article policy;
/// every other error halts the run with the failing archive in the message.
#[instrument(skip(engine, job), fields(archives = job.archives.len()))]
pub async fn run_ingestion(
    engine: &dyn SearchEngine,
    job: IngestionJob,
) -> Result<IngestionReport> {
    let t0 = Instant::now();

    if job.recreate_index {
        SchemaManager::new(engine, job.index.clone())
            .recreate_index()
            .await?;
    }

    let loader = BulkLoader::new(engine, job.index.name.clone()).with_batch_size(job.batch_size);

    let mut report = IngestionReport {
        archives_processed: 0,
        records_indexed: 0,
        records_skipped: 0,
        duration_ms: 0,
    };

    for path in &job.archives {
        let t_archive = Instant::now();

        let owned = path.clone();
        let policy = job.on_malformed;
        let (records, skipped) =
            tokio::task::spawn_blocking(move || parse_archive(&owned, policy))
                .await
                .map_err(|e| PubtrendError::Other(e.into()))??;
        let parse_ms = t_archive.elapsed().as_millis() as u64;

        let t_index = Instant::now();
        let indexed = loader.load(&records).await.map_err(|e| match e {
            PubtrendError::BulkSubmit {
                failed,
                total,
                reason,
            } => PubtrendError::BulkSubmit {
                failed,
                total,
                reason: format!("{}: {reason}", path.display()),
            },
            other => other,
        })?;
        let index_ms = t_index.elapsed().as_millis() as u64;

        report.archives_processed += 1;
        report.records_indexed += indexed;
        report.records_skipped += skipped;

        info!(
            archive = %path.display(),
            records = indexed,
            skipped,
            parse_ms,
            index_ms,
            "Archive ingested"
        );
    }

    report.duration_ms = t0.elapsed().as_millis() as u64;

    info!(
        archives = report.archives_processed,
        records = report.records_indexed,
        skipped = report.records_skipped,
        duration_ms = report.duration_ms,
        "Ingestion complete"
    );

    Ok(report)
}

/// Extract every record from one archive.
///
/// Under `abort` (the default) the first malformed article fails the whole
/// archive: with no per-article boundary, a partially loaded archive would
/// be indistinguishable from a complete one. Under `skip` the article is
/// logged and counted, and extraction continues.
fn parse_archive(path: &Path, policy: MalformedPolicy) -> Result<(Vec<PubmedPaper>, usize)> {
    let mut reader = RecordReader::from_gzip_path(path)?;
    let mut records = Vec::new();
    let mut skipped = 0usize;

    loop {
        match reader.next_record() {
            Ok(Some(paper)) => records.push(paper),
            Ok(None) => break,
            Err(e @ PubtrendError::Extraction { .. }) => match policy {
                MalformedPolicy::Abort => return Err(e),
                MalformedPolicy::Skip => {
                    warn!(error = %e, "Skipping malformed article");
                    skipped += 1;
                }
            },
            Err(e) => return Err(e),
        }
    }
    Ok((records, skipped))
}
