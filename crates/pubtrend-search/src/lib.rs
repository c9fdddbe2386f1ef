//! pubtrend-search — Search engine boundary.
//!
//! The rest of the system talks to the document index only through the
//! [`SearchEngine`] trait: index lifecycle, bulk upserts, refresh, and
//! count/search queries. [`HttpSearchEngine`] is the production
//! implementation against an Elasticsearch-compatible HTTP API.

pub mod engine;
pub mod http;
pub mod types;

pub use engine::SearchEngine;
pub use http::HttpSearchEngine;
pub use types::{BulkFailure, BulkOperation, BulkReport, SearchResponse};
