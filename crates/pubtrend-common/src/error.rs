//! Error types for the ingestion and trend subsystems.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PubtrendError>;

#[derive(Debug, Error)]
pub enum PubtrendError {
    /// Index create/delete failed for a reason other than "already absent".
    /// Fatal: the run must not proceed against an index in an unknown state.
    #[error("Schema error: {0}")]
    Schema(String),

    /// A required field was absent or malformed in one article. Scoped to
    /// that article; whether the enclosing archive aborts is a policy choice.
    #[error("Extraction error in {archive}, article #{article}: {reason}")]
    Extraction {
        archive: String,
        article: usize,
        reason: String,
    },

    /// One or more operations in a bulk batch were rejected by the engine.
    /// Safe to retry the whole batch: indexing is upsert-by-id.
    #[error("Bulk submit error: {failed} of {total} operations failed: {reason}")]
    BulkSubmit {
        failed: usize,
        total: usize,
        reason: String,
    },

    /// A search call failed. Always propagated; a recorded zero is reserved
    /// for the legitimate "no baseline documents" case.
    #[error("Query error: {0}")]
    Query(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
