//! Index schema lifecycle.
//!
//! The shard count cannot change once an index exists, so schema changes
//! always go through a full drop + recreate before the corpus is reloaded.

use pubtrend_config::IndexConfig;
use pubtrend_search::SearchEngine;
use serde_json::{json, Value};
use tracing::info;

use pubtrend_common::Result;

pub struct SchemaManager<'a> {
    engine: &'a dyn SearchEngine,
    cfg: IndexConfig,
}

impl<'a> SchemaManager<'a> {
    pub fn new(engine: &'a dyn SearchEngine, cfg: IndexConfig) -> Self {
        Self { engine, cfg }
    }

    /// Settings and field mappings for the publication index.
    pub fn index_body(cfg: &IndexConfig) -> Value {
        json!({
            "settings": {
                "number_of_shards": cfg.shards,
                "number_of_replicas": cfg.replicas,
            },
            "mappings": {
                "properties": {
                    "title":    { "type": "text", "analyzer": "standard" },
                    "abstract": { "type": "text", "analyzer": "standard" },
                    "created_date": { "type": "date", "format": "yyyy-MM-dd" },
                }
            }
        })
    }

    /// Delete the index if present. Absence is not an error.
    pub async fn drop_index(&self) -> Result<()> {
        self.engine.delete_index(&self.cfg.name).await
    }

    /// Create the index. Fails with a schema error if it already exists;
    /// call [`Self::recreate_index`] for a fresh corpus load.
    pub async fn create_index(&self) -> Result<()> {
        self.engine
            .create_index(&self.cfg.name, &Self::index_body(&self.cfg))
            .await
    }

    /// Drop and recreate. Must run exactly once before the first bulk load
    /// of a fresh corpus, never concurrently with one.
    pub async fn recreate_index(&self) -> Result<()> {
        self.drop_index().await?;
        self.create_index().await?;
        info!(
            index = %self.cfg.name,
            shards = self.cfg.shards,
            replicas = self.cfg.replicas,
            "Index recreated"
        );
        Ok(())
    }
}
