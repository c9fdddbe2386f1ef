//! Trend aggregation against an in-memory engine double that interprets the
//! generated query JSON (date range + phrase clauses), so the builder and
//! the bucket walk are exercised together.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde_json::Value;

use pubtrend_common::{PubtrendError, Result};
use pubtrend_config::TrendsConfig;
use pubtrend_search::{BulkOperation, BulkReport, SearchEngine, SearchResponse};
use pubtrend_trends::{TopicGroup, TrendAggregator};

// ── Engine double ─────────────────────────────────────────────────────────────

struct Doc {
    created: NaiveDate,
    title: String,
    abstract_text: String,
}

#[derive(Default)]
struct MockEngine {
    docs: Vec<Doc>,
}

impl MockEngine {
    fn with_docs(docs: Vec<Doc>) -> Self {
        Self { docs }
    }
}

fn parse_date(v: &Value) -> NaiveDate {
    NaiveDate::parse_from_str(v.as_str().unwrap(), "%Y-%m-%d").unwrap()
}

#[async_trait]
impl SearchEngine for MockEngine {
    async fn delete_index(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    async fn create_index(&self, _name: &str, _body: &Value) -> Result<()> {
        Ok(())
    }

    async fn bulk(&self, _index: &str, _ops: &[BulkOperation]) -> Result<BulkReport> {
        Ok(BulkReport::default())
    }

    async fn refresh(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    /// Interpret the range + bool/should/match_phrase query shape the
    /// trend query builder emits.
    async fn search(&self, _index: &str, query: &Value, _size: usize) -> Result<SearchResponse> {
        let must = query["bool"]["must"].as_array().expect("bool.must");
        let range = &must[0]["range"]["created_date"];
        let low = parse_date(&range["gte"]);
        let high = parse_date(&range["lt"]);

        // (field, phrase) pairs from the optional term clause.
        let phrases: Vec<(String, String)> = must
            .get(1)
            .and_then(|clause| clause["bool"]["should"].as_array())
            .map(|should| {
                should
                    .iter()
                    .map(|c| {
                        let obj = c["match_phrase"].as_object().unwrap();
                        let (field, term) = obj.iter().next().unwrap();
                        (field.clone(), term.as_str().unwrap().to_string())
                    })
                    .collect()
            })
            .unwrap_or_default();

        let total = self
            .docs
            .iter()
            .filter(|d| d.created >= low && d.created < high)
            .filter(|d| {
                phrases.is_empty()
                    || phrases.iter().any(|(field, term)| match field.as_str() {
                        "title" => d.title.contains(term),
                        "abstract" => d.abstract_text.contains(term),
                        _ => false,
                    })
            })
            .count() as u64;

        Ok(SearchResponse {
            total,
            hits: Vec::new(),
        })
    }
}

/// Engine whose search always fails, for error propagation.
struct FailingEngine;

#[async_trait]
impl SearchEngine for FailingEngine {
    async fn delete_index(&self, _name: &str) -> Result<()> {
        Ok(())
    }
    async fn create_index(&self, _name: &str, _body: &Value) -> Result<()> {
        Ok(())
    }
    async fn bulk(&self, _index: &str, _ops: &[BulkOperation]) -> Result<BulkReport> {
        Ok(BulkReport::default())
    }
    async fn refresh(&self, _name: &str) -> Result<()> {
        Ok(())
    }
    async fn search(&self, _i: &str, _q: &Value, _s: usize) -> Result<SearchResponse> {
        Err(PubtrendError::Query("engine unavailable".to_string()))
    }
}

// ── Fixtures ──────────────────────────────────────────────────────────────────

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn doc(created: NaiveDate, title: &str, abstract_text: &str) -> Doc {
    Doc {
        created,
        title: title.to_string(),
        abstract_text: abstract_text.to_string(),
    }
}

fn cfg(bucket: i64, lookback: i64, margin: i64) -> TrendsConfig {
    TrendsConfig {
        bucket_days: bucket,
        lookback_days: lookback,
        margin_days: margin,
        ..Default::default()
    }
}

fn group(label: &str, terms: &[&str]) -> TopicGroup {
    TopicGroup {
        label: label.to_string(),
        terms: terms.iter().map(|t| t.to_string()).collect(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn percentage_is_matches_over_baseline() {
    let now = date(2017, 6, 1);
    // One 365-day bucket: 200 docs in range, 50 mentioning the term.
    let bucket_start = now - Duration::days(365);
    let mut docs = Vec::new();
    for i in 0..200 {
        let title = if i < 50 { "ebola outbreak" } else { "unrelated" };
        docs.push(doc(bucket_start + Duration::days(i % 300), title, ""));
    }
    let engine = MockEngine::with_docs(docs);

    let agg = TrendAggregator::new(&engine, "idx", &cfg(365, 365, 10));
    let series = agg.series_at(now, &group("Ebola", &["ebola"])).await.unwrap();

    assert_eq!(series.points.len(), 1);
    assert_eq!(series.points[0].percentage, 25.0);
}

#[tokio::test]
async fn empty_baseline_records_exact_zero() {
    let engine = MockEngine::default();
    let agg = TrendAggregator::new(&engine, "idx", &cfg(30, 90, 10));
    let series = agg
        .series_at(date(2017, 6, 1), &group("anything", &["term"]))
        .await
        .unwrap();

    assert!(!series.points.is_empty());
    assert!(series.points.iter().all(|p| p.percentage == 0.0));
}

#[tokio::test]
async fn match_in_either_field_counts() {
    let now = date(2017, 6, 1);
    let in_bucket = now - Duration::days(100);
    let engine = MockEngine::with_docs(vec![
        doc(in_bucket, "dementia care", ""),
        doc(in_bucket, "plain title", "patients with dementia were"),
        doc(in_bucket, "neither", "nothing relevant"),
    ]);

    let agg = TrendAggregator::new(&engine, "idx", &cfg(365, 365, 10));
    let series = agg
        .series_at(now, &group("dementia", &["alzheimer", "dementia"]))
        .await
        .unwrap();

    let pct = series.points[0].percentage;
    assert!((pct - 100.0 * 2.0 / 3.0).abs() < 1e-9);
}

#[tokio::test]
async fn midpoints_increase_and_are_spaced_by_bucket_width() {
    let engine = MockEngine::default();
    // 40-day buckets over a 100-day lookback: the last bucket opens before
    // the margin cutoff but runs 20 days past "now". It stays included.
    let agg = TrendAggregator::new(&engine, "idx", &cfg(40, 100, 10));
    let now = date(2017, 6, 1);
    let series = agg.series_at(now, &group("g", &["x"])).await.unwrap();

    assert_eq!(series.points.len(), 3);
    for pair in series.points.windows(2) {
        assert_eq!(pair[1].date - pair[0].date, Duration::days(40));
    }
    // First midpoint: lookback start + half a bucket.
    assert_eq!(series.points[0].date, now - Duration::days(100 - 20));
    // Final bucket's midpoint lands on "now": the bucket overruns the cutoff.
    assert_eq!(series.points[2].date, now);
}

#[tokio::test]
async fn series_keep_group_order_and_labels() {
    let engine = MockEngine::default();
    let agg = TrendAggregator::new(&engine, "idx", &cfg(365, 365, 10));
    let groups = vec![group("first", &["a"]), group("second", &["b"])];

    let all = agg.series_for_all_at(date(2017, 6, 1), &groups).await;
    let all = all.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].label, "first");
    assert_eq!(all[1].label, "second");
}

#[tokio::test]
async fn query_failure_propagates_instead_of_recording_zero() {
    let engine = FailingEngine;
    let agg = TrendAggregator::new(&engine, "idx", &cfg(365, 365, 10));
    let err = agg
        .series_at(date(2017, 6, 1), &group("g", &["x"]))
        .await
        .unwrap_err();
    assert!(matches!(err, PubtrendError::Query(_)));
}
