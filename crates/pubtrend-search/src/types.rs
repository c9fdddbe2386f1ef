//! Wire types for the search engine boundary.

use serde::Deserialize;
use serde_json::Value;

/// One upsert in a bulk batch: the document body indexed under `id`.
/// Re-submitting the same id overwrites the previous document, which is
/// what makes whole-batch retries safe.
#[derive(Debug, Clone)]
pub struct BulkOperation {
    pub id: String,
    pub document: Value,
}

/// Per-operation outcome of a bulk submission.
#[derive(Debug, Clone, Default)]
pub struct BulkReport {
    pub total: usize,
    pub failed: Vec<BulkFailure>,
}

impl BulkReport {
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct BulkFailure {
    pub id: String,
    pub reason: String,
}

/// Result of a search call.
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub total: u64,
    pub hits: Vec<Value>,
}

// ── Raw engine response shapes ────────────────────────────────────────────────

/// `hits.total` is a bare number on older engines and `{value, relation}`
/// since Elasticsearch 7.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawTotal {
    Legacy(u64),
    Tracked { value: u64 },
}

impl RawTotal {
    pub(crate) fn value(&self) -> u64 {
        match self {
            RawTotal::Legacy(n) => *n,
            RawTotal::Tracked { value } => *value,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawHit {
    #[serde(rename = "_source", default)]
    pub source: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawHits {
    pub total: RawTotal,
    #[serde(default)]
    pub hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawSearchResponse {
    pub hits: RawHits,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawBulkItemStatus {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub status: u16,
    #[serde(default)]
    pub error: Option<Value>,
}

/// Each bulk item is keyed by its action name ("index", "create", …).
#[derive(Debug, Deserialize)]
pub(crate) struct RawBulkItem {
    #[serde(flatten)]
    pub actions: std::collections::HashMap<String, RawBulkItemStatus>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawBulkResponse {
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<RawBulkItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_parses_both_shapes() {
        let legacy: RawTotal = serde_json::from_str("42").unwrap();
        assert_eq!(legacy.value(), 42);

        let tracked: RawTotal =
            serde_json::from_str(r#"{"value": 42, "relation": "eq"}"#).unwrap();
        assert_eq!(tracked.value(), 42);
    }

    #[test]
    fn bulk_response_surfaces_item_errors() {
        let raw: RawBulkResponse = serde_json::from_str(
            r#"{
                "errors": true,
                "items": [
                    {"index": {"_id": "1", "status": 201}},
                    {"index": {"_id": "2", "status": 400,
                               "error": {"type": "mapper_parsing_exception"}}}
                ]
            }"#,
        )
        .unwrap();
        assert!(raw.errors);
        let failed: Vec<_> = raw
            .items
            .iter()
            .flat_map(|i| i.actions.values())
            .filter(|s| s.error.is_some())
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].id, "2");
    }
}
