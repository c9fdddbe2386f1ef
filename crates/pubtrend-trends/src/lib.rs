//! pubtrend-trends — Topic trend aggregation over the publication index.
//!
//! For each topic term group, walks the lookback horizon in fixed-width
//! time buckets and computes the share of publications matching the terms
//! relative to all publications in the bucket, yielding a time series for
//! the plotting collaborator.

pub mod aggregator;
pub mod query;

pub use aggregator::{TopicGroup, TrendAggregator, TrendPoint, TrendSeries};
pub use query::trend_query;
