//! Common interface to the document search engine.

use async_trait::async_trait;
use pubtrend_common::Result;
use serde_json::Value;

use crate::types::{BulkOperation, BulkReport, SearchResponse};

/// Everything pubtrend needs from the index engine. Ingestion is the sole
/// writer; trend aggregation is a read-only client of `search`.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Delete an index. "Not found" is success.
    async fn delete_index(&self, name: &str) -> Result<()>;

    /// Create an index from a settings+mappings body. Fails with a schema
    /// error if an index of that name already exists.
    async fn create_index(&self, name: &str, body: &Value) -> Result<()>;

    /// Submit an ordered batch of upsert operations. The engine may apply a
    /// batch partially; per-operation failures are reported, not retried.
    async fn bulk(&self, index: &str, ops: &[BulkOperation]) -> Result<BulkReport>;

    /// Make previously indexed documents visible to subsequent searches.
    async fn refresh(&self, name: &str) -> Result<()>;

    /// Run a query, returning the total hit count and up to `size` hits.
    /// `size = 0` is the count-only form used by the trend aggregator.
    async fn search(&self, index: &str, query: &Value, size: usize) -> Result<SearchResponse>;
}
