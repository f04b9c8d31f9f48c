//! Summary types produced by the aggregation step.

use serde::Serialize;

use crate::record::StarCounts;

/// Headline statistics for one batch. Derived, never stored.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    /// Number of records, including failed ones.
    pub products: usize,
    /// Number of records that carried a rating.
    pub rated_products: usize,
    /// Mean of the non-null ratings, rounded to 3 places.
    pub unweighted_mean: Option<f64>,
    /// Review-count-weighted mean rating, rounded to 3 places.
    pub weighted_mean: Option<f64>,
    pub total_reviews: u64,
    pub stars: StarCounts,
}
