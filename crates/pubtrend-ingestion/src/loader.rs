//! Bulk loading of extracted records into the index.
//!
//! The default batch boundary is one whole archive, which bounds memory by
//! per-archive record count rather than file size; a `batch_size` cap splits
//! oversized archives into fixed-count batches. Either way a batch is not
//! atomic and the engine may apply it partially, but every operation is an
//! upsert keyed by PMID, so replaying a failed batch is safe.

use pubtrend_common::{PubtrendError, Result};
use pubtrend_search::{BulkOperation, SearchEngine};
use tracing::{debug, warn};

use crate::models::PubmedPaper;

pub struct BulkLoader<'a> {
    engine: &'a dyn SearchEngine,
    index: String,
    batch_size: Option<usize>,
}

impl<'a> BulkLoader<'a> {
    pub fn new(engine: &'a dyn SearchEngine, index: impl Into<String>) -> Self {
        Self {
            engine,
            index: index.into(),
            batch_size: None,
        }
    }

    /// Cap records per bulk submission. `None` keeps the whole-archive batch.
    pub fn with_batch_size(mut self, batch_size: Option<usize>) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Index all records, one refresh per submitted batch so subsequent
    /// queries observe the documents. Returns the number of records indexed.
    pub async fn load(&self, records: &[PubmedPaper]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }
        let batch_size = self.batch_size.unwrap_or(records.len()).max(1);

        let mut indexed = 0;
        for batch in records.chunks(batch_size) {
            let ops: Vec<BulkOperation> = batch
                .iter()
                .map(|paper| BulkOperation {
                    id: paper.pmid.clone(),
                    document: paper.document_body(),
                })
                .collect();

            let report = self.engine.bulk(&self.index, &ops).await?;
            if !report.is_ok() {
                for failure in report.failed.iter().take(5) {
                    warn!(id = %failure.id, reason = %failure.reason, "Bulk operation rejected");
                }
                return Err(PubtrendError::BulkSubmit {
                    failed: report.failed.len(),
                    total: report.total,
                    reason: report
                        .failed
                        .first()
                        .map(|f| format!("first failure (id {}): {}", f.id, f.reason))
                        .unwrap_or_default(),
                });
            }
            self.engine.refresh(&self.index).await?;
            indexed += batch.len();
            debug!(index = %self.index, n = batch.len(), "Batch indexed and refreshed");
        }
        Ok(indexed)
    }
}
