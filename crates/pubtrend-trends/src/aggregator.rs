//! Time-bucketed trend aggregation.
//!
//! Walks the lookback horizon in fixed-width buckets, oldest first. Each
//! bucket costs two count queries: the unfiltered baseline and the
//! term-filtered match count. The recorded value is the match share as a
//! percentage of the baseline, timestamped at the bucket midpoint.

use chrono::{Duration, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};

use pubtrend_common::Result;
use pubtrend_config::{TopicConfig, TrendsConfig};
use pubtrend_search::SearchEngine;

use crate::query::trend_query;

/// One topic to trend: a legend label and the phrase terms that count a
/// publication as matching.
#[derive(Debug, Clone, Serialize)]
pub struct TopicGroup {
    pub label: String,
    pub terms: Vec<String>,
}

impl From<TopicConfig> for TopicGroup {
    fn from(cfg: TopicConfig) -> Self {
        Self {
            label: cfg.label,
            terms: cfg.terms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// Bucket midpoint.
    pub date: NaiveDate,
    /// Matching share of the bucket's publications, 0 when the bucket holds
    /// no documents at all.
    pub percentage: f64,
}

/// Ordered series for one topic group, ready for plotting.
#[derive(Debug, Clone, Serialize)]
pub struct TrendSeries {
    pub label: String,
    pub points: Vec<TrendPoint>,
}

pub struct TrendAggregator<'a> {
    engine: &'a dyn SearchEngine,
    index: String,
    bucket_days: i64,
    lookback_days: i64,
    margin_days: i64,
}

impl<'a> TrendAggregator<'a> {
    pub fn new(engine: &'a dyn SearchEngine, index: impl Into<String>, cfg: &TrendsConfig) -> Self {
        Self {
            engine,
            index: index.into(),
            bucket_days: cfg.bucket_days,
            lookback_days: cfg.lookback_days,
            margin_days: cfg.margin_days,
        }
    }

    /// Compute the series for every group, in order.
    pub async fn series_for_all(&self, groups: &[TopicGroup]) -> Result<Vec<TrendSeries>> {
        self.series_for_all_at(Utc::now().date_naive(), groups).await
    }

    pub async fn series_for_all_at(
        &self,
        now: NaiveDate,
        groups: &[TopicGroup],
    ) -> Result<Vec<TrendSeries>> {
        let mut all = Vec::with_capacity(groups.len());
        for group in groups {
            all.push(self.series_at(now, group).await?);
        }
        Ok(all)
    }

    /// Compute one topic's series ending at today's horizon.
    #[instrument(skip(self, group), fields(label = %group.label))]
    pub async fn series(&self, group: &TopicGroup) -> Result<TrendSeries> {
        self.series_at(Utc::now().date_naive(), group).await
    }

    /// Bucket walk with an explicit "now", the testable core.
    ///
    /// Buckets start at `now − lookback` and open while `low < now − margin`;
    /// the final bucket keeps its full width, so it may extend past the
    /// margin cutoff. The overrun is deliberate: every bucket spans the same
    /// number of days, at the cost of the tail reaching into the margin.
    pub async fn series_at(&self, now: NaiveDate, group: &TopicGroup) -> Result<TrendSeries> {
        let cutoff = now - Duration::days(self.margin_days);
        let mut low = now - Duration::days(self.lookback_days);
        let mut points = Vec::new();

        while low < cutoff {
            let high = low + Duration::days(self.bucket_days);

            let baseline = self.count(low, high, &[]).await?;
            let matches = self.count(low, high, &group.terms).await?;

            // Zero is the legitimate empty-bucket value; query failures have
            // already propagated above.
            let percentage = if baseline > 0 {
                100.0 * matches as f64 / baseline as f64
            } else {
                0.0
            };

            let midpoint = low + Duration::days(self.bucket_days / 2);
            debug!(%low, %high, baseline, matches, percentage, "Bucket counted");
            points.push(TrendPoint {
                date: midpoint,
                percentage,
            });

            low = high;
        }

        info!(label = %group.label, buckets = points.len(), "Trend series computed");
        Ok(TrendSeries {
            label: group.label.clone(),
            points,
        })
    }

    async fn count(&self, low: NaiveDate, high: NaiveDate, terms: &[String]) -> Result<u64> {
        let query = trend_query(low, high, terms);
        // Count-only: size 0 skips hit payloads.
        let resp = self.engine.search(&self.index, &query, 0).await?;
        Ok(resp.total)
    }
}
