//! HTTP implementation of the search engine boundary.
//!
//! Speaks the Elasticsearch REST API: `PUT /{index}`, `DELETE /{index}`,
//! `POST /{index}/_bulk` (NDJSON), `POST /{index}/_refresh`,
//! `POST /{index}/_search`.

use async_trait::async_trait;
use pubtrend_common::{PubtrendError, Result};
use pubtrend_config::EngineConfig;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::engine::SearchEngine;
use crate::types::{
    BulkFailure, BulkOperation, BulkReport, RawBulkResponse, RawSearchResponse, SearchResponse,
};

pub struct HttpSearchEngine {
    client: reqwest::Client,
    base_url: String,
    bulk_timeout: Duration,
}

impl HttpSearchEngine {
    pub fn new(cfg: &EngineConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .user_agent("pubtrend/0.1")
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.url.trim_end_matches('/').to_string(),
            bulk_timeout: Duration::from_secs(cfg.bulk_timeout_secs),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Render a bulk batch as NDJSON action/document line pairs.
    fn ndjson(index: &str, ops: &[BulkOperation]) -> Result<String> {
        let mut body = String::new();
        for op in ops {
            let action = json!({ "index": { "_index": index, "_id": op.id } });
            body.push_str(&serde_json::to_string(&action)?);
            body.push('\n');
            body.push_str(&serde_json::to_string(&op.document)?);
            body.push('\n');
        }
        Ok(body)
    }
}

#[async_trait]
impl SearchEngine for HttpSearchEngine {
    #[instrument(skip(self))]
    async fn delete_index(&self, name: &str) -> Result<()> {
        let resp = self.client.delete(self.url(name)).send().await?;
        let status = resp.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            debug!(index = name, %status, "Index deleted (or already absent)");
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(PubtrendError::Schema(format!(
            "delete of '{name}' failed: HTTP {status}: {body}"
        )))
    }

    #[instrument(skip(self, body))]
    async fn create_index(&self, name: &str, body: &Value) -> Result<()> {
        let resp = self.client.put(self.url(name)).json(body).send().await?;
        let status = resp.status();
        if status.is_success() {
            debug!(index = name, "Index created");
            return Ok(());
        }
        let text = resp.text().await.unwrap_or_default();
        Err(PubtrendError::Schema(format!(
            "create of '{name}' failed: HTTP {status}: {text}"
        )))
    }

    #[instrument(skip(self, ops), fields(n_ops = ops.len()))]
    async fn bulk(&self, index: &str, ops: &[BulkOperation]) -> Result<BulkReport> {
        if ops.is_empty() {
            return Ok(BulkReport::default());
        }
        let body = Self::ndjson(index, ops)?;
        let resp = self
            .client
            .post(self.url(&format!("{index}/_bulk")))
            .timeout(self.bulk_timeout)
            .header(reqwest::header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PubtrendError::BulkSubmit {
                failed: ops.len(),
                total: ops.len(),
                reason: format!("HTTP {status}: {text}"),
            });
        }

        let raw: RawBulkResponse = resp.json().await?;
        let mut report = BulkReport {
            total: ops.len(),
            failed: Vec::new(),
        };
        if raw.errors {
            for item in &raw.items {
                for op_status in item.actions.values() {
                    if let Some(err) = &op_status.error {
                        report.failed.push(BulkFailure {
                            id: op_status.id.clone(),
                            reason: format!("status {}: {err}", op_status.status),
                        });
                    }
                }
            }
        }
        debug!(
            index,
            total = report.total,
            failed = report.failed.len(),
            "Bulk batch submitted"
        );
        Ok(report)
    }

    #[instrument(skip(self))]
    async fn refresh(&self, name: &str) -> Result<()> {
        let resp = self
            .client
            .post(self.url(&format!("{name}/_refresh")))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PubtrendError::Schema(format!(
                "refresh of '{name}' failed: HTTP {status}: {body}"
            )));
        }
        Ok(())
    }

    #[instrument(skip(self, query))]
    async fn search(&self, index: &str, query: &Value, size: usize) -> Result<SearchResponse> {
        let body = json!({ "size": size, "query": query });
        let resp = self
            .client
            .post(self.url(&format!("{index}/_search")))
            .json(&body)
            .send()
            .await
            .map_err(|e| PubtrendError::Query(format!("search on '{index}' failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PubtrendError::Query(format!(
                "search on '{index}' failed: HTTP {status}: {text}"
            )));
        }
        let raw: RawSearchResponse = resp
            .json()
            .await
            .map_err(|e| PubtrendError::Query(format!("malformed search response: {e}")))?;
        Ok(SearchResponse {
            total: raw.hits.total.value(),
            hits: raw.hits.hits.into_iter().map(|h| h.source).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ndjson_pairs_action_and_document() {
        let ops = vec![
            BulkOperation {
                id: "101".to_string(),
                document: json!({"title": "a"}),
            },
            BulkOperation {
                id: "102".to_string(),
                document: json!({"title": "b"}),
            },
        ];
        let body = HttpSearchEngine::ndjson("papers", &ops).unwrap();
        let lines: Vec<&str> = body.lines().collect();
        assert_eq!(lines.len(), 4);

        let action: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(action["index"]["_index"], "papers");
        assert_eq!(action["index"]["_id"], "101");
        let doc: Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(doc["title"], "a");
        assert!(body.ends_with('\n'));
    }
}
