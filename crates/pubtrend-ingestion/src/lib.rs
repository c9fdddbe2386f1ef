//! pubtrend-ingestion — PubMed archive ingestion pipeline.
//!
//! - Streaming record extraction from gzip-compressed PubMed XML archives
//! - Index schema lifecycle (drop + create before a fresh corpus load)
//! - Batched bulk upserts keyed by PMID, refresh after each batch
//! - Sequential per-archive orchestration with parse/index timings

pub mod extractor;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod schema;

pub use extractor::RecordReader;
pub use loader::BulkLoader;
pub use models::PubmedPaper;
pub use pipeline::{discover_archives, run_ingestion, IngestionJob, IngestionReport};
pub use schema::SchemaManager;
