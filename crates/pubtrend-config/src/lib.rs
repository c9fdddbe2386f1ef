//! Configuration loading for pubtrend.
//! Reads pubtrend.toml from the current directory or path in PUBTREND_CONFIG env var.

use pubtrend_common::{PubtrendError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub ingestion: IngestionConfig,
    #[serde(default)]
    pub trends: TrendsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Base URL of the search engine HTTP API.
    #[serde(default = "default_engine_url")]
    pub url: String,
    /// Request budget for schema and search calls, seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    /// Request budget for bulk submissions, seconds.
    #[serde(default = "default_bulk_timeout")]
    pub bulk_timeout_secs: u64,
}

fn default_engine_url()      -> String { "http://localhost:9200".to_string() }
fn default_request_timeout() -> u64 { 30 }
fn default_bulk_timeout()    -> u64 { 300 }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: default_engine_url(),
            request_timeout_secs: default_request_timeout(),
            bulk_timeout_secs: default_bulk_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default = "default_index_name")]
    pub name: String,
    /// Shard count is immutable once the index exists; changing it requires
    /// a full recreate.
    #[serde(default = "default_shards")]
    pub shards: u32,
    #[serde(default = "default_replicas")]
    pub replicas: u32,
}

fn default_index_name() -> String { "pubmed-paper-index".to_string() }
fn default_shards()     -> u32 { 5 }
fn default_replicas()   -> u32 { 0 }

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            name: default_index_name(),
            shards: default_shards(),
            replicas: default_replicas(),
        }
    }
}

/// What to do with an article missing its PMID or creation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Abort the enclosing archive. Default: a silently partial archive
    /// risks unnoticed data loss.
    #[default]
    Abort,
    /// Log, count, and continue with the next article.
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IngestionConfig {
    /// Directory scanned for *.gz archives when no explicit paths are given.
    #[serde(default)]
    pub archive_dir: Option<String>,
    #[serde(default)]
    pub on_malformed: MalformedPolicy,
    /// Records per bulk batch. Absent = one batch per archive.
    #[serde(default)]
    pub batch_size: Option<usize>,
    /// Drop and recreate the index before loading. Disable to top up an
    /// existing corpus (upsert-by-id keeps re-runs idempotent).
    #[serde(default = "default_true")]
    pub recreate_index: bool,
}

fn default_true() -> bool { true }

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendsConfig {
    /// Bucket width in days.
    #[serde(default = "default_bucket_days")]
    pub bucket_days: i64,
    /// Lookback horizon in days (default 25 years).
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
    /// Safety margin before "now"; recently created documents may not have
    /// propagated through the daily update files yet.
    #[serde(default = "default_margin_days")]
    pub margin_days: i64,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub topics: Vec<TopicConfig>,
}

fn default_bucket_days()   -> i64 { 365 }
fn default_lookback_days() -> i64 { 365 * 25 }
fn default_margin_days()   -> i64 { 10 }
fn default_output_dir()    -> String { ".".to_string() }

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            bucket_days: default_bucket_days(),
            lookback_days: default_lookback_days(),
            margin_days: default_margin_days(),
            output_dir: default_output_dir(),
            topics: Vec::new(),
        }
    }
}

/// One topic group: a label for the plot legend and the phrase terms that
/// count a publication as matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicConfig {
    pub label: String,
    pub terms: Vec<String>,
}

impl Config {
    /// Load from an explicit path.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            PubtrendError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        toml::from_str(&raw)
            .map_err(|e| PubtrendError::Config(format!("invalid {}: {e}", path.display())))
    }

    /// Load from PUBTREND_CONFIG or ./pubtrend.toml; defaults if neither exists.
    pub fn discover() -> Result<Self> {
        if let Ok(path) = std::env::var("PUBTREND_CONFIG") {
            return Self::load(path);
        }
        let local = Path::new("pubtrend.toml");
        if local.exists() {
            return Self::load(local);
        }
        Ok(Self::default())
    }
}
