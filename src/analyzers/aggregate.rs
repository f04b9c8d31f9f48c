use crate::analyzers::types::RunSummary;
use crate::analyzers::utility::{mean, round_to};
use crate::record::{Asin, ProductRecord, StarCounts};

pub const GRAND_TOTAL_LABEL: &str = "GRAND TOTAL";

/// Decimal places kept on the two means.
const MEAN_PRECISION: i32 = 3;

/// Aggregates a batch of [`ProductRecord`]s into a [`RunSummary`].
///
/// - the unweighted mean covers exactly the records with a rating;
/// - the weighted mean is `Σ rating × reviews / Σ reviews`, where a missing
///   rating or review count contributes 0 to the numerator and only present
///   review counts enter the denominator;
/// - star totals add every record's buckets, missing ones counting as 0.
///
/// Count sums saturate at `u64::MAX` instead of overflowing.
pub fn aggregate(records: &[ProductRecord]) -> RunSummary {
    let ratings: Vec<f64> = records.iter().filter_map(|r| r.average_rating).collect();

    let mut weighted_total = 0.0;
    let mut weight_sum = 0.0;
    let mut review_sum: u64 = 0;
    let mut stars = StarCounts::default();

    for record in records {
        if let Some(reviews) = record.total_reviews {
            weighted_total += record.average_rating.unwrap_or(0.0) * reviews as f64;
            weight_sum += reviews as f64;
            review_sum = review_sum.saturating_add(reviews);
        }
        stars += record.star_counts();
    }

    let weighted_mean = if weight_sum == 0.0 {
        None
    } else {
        Some(round_to(weighted_total / weight_sum, MEAN_PRECISION))
    };

    RunSummary {
        products: records.len(),
        rated_products: ratings.len(),
        unweighted_mean: mean(&ratings).map(|m| round_to(m, MEAN_PRECISION)),
        weighted_mean,
        total_reviews: review_sum,
        stars,
    }
}

/// The synthetic row appended under the detail rows.
///
/// Carries the unweighted mean as its rating, the review sum and the star
/// totals; Design and Size stay empty.
pub fn grand_total_record(summary: &RunSummary) -> ProductRecord {
    ProductRecord {
        asin: Asin::new(GRAND_TOTAL_LABEL),
        design: None,
        size: None,
        average_rating: summary.unweighted_mean,
        total_reviews: Some(summary.total_reviews),
        stars: Some(summary.stars),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rated(asin: &str, rating: f64, reviews: u64, stars: [u64; 5]) -> ProductRecord {
        ProductRecord {
            asin: Asin::new(asin),
            design: None,
            size: None,
            average_rating: Some(rating),
            total_reviews: Some(reviews),
            stars: Some(StarCounts {
                five: stars[0],
                four: stars[1],
                three: stars[2],
                two: stars[3],
                one: stars[4],
            }),
        }
    }

    #[test]
    fn test_single_product() {
        let records = vec![rated("B0DNKXYG1X", 4.5, 100, [60, 20, 10, 5, 5])];
        let summary = aggregate(&records);

        assert_eq!(summary.unweighted_mean, Some(4.5));
        assert_eq!(summary.weighted_mean, Some(4.5));
        assert_eq!(summary.total_reviews, 100);
        assert_eq!(summary.stars.as_array(), [60, 20, 10, 5, 5]);
    }

    #[test]
    fn test_failed_record_excluded_from_means() {
        let records = vec![
            rated("A", 4.0, 10, [5, 5, 0, 0, 0]),
            ProductRecord::empty(Asin::new("B")),
        ];
        let summary = aggregate(&records);

        assert_eq!(summary.products, 2);
        assert_eq!(summary.rated_products, 1);
        assert_eq!(summary.unweighted_mean, Some(4.0));
        assert_eq!(summary.weighted_mean, Some(4.0));
        assert_eq!(summary.stars.as_array(), [5, 5, 0, 0, 0]);
    }

    #[test]
    fn test_all_null_gives_absent_means() {
        let records = vec![
            ProductRecord::empty(Asin::new("A")),
            ProductRecord::empty(Asin::new("B")),
        ];
        let summary = aggregate(&records);

        assert_eq!(summary.unweighted_mean, None);
        assert_eq!(summary.weighted_mean, None);
        assert_eq!(summary.total_reviews, 0);
        assert_eq!(summary.stars, StarCounts::default());
    }

    #[test]
    fn test_zero_reviews_gives_absent_weighted_mean() {
        let records = vec![rated("A", 3.0, 0, [0; 5])];
        let summary = aggregate(&records);

        assert_eq!(summary.unweighted_mean, Some(3.0));
        assert_eq!(summary.weighted_mean, None);
    }

    #[test]
    fn test_weighted_vs_unweighted() {
        let records = vec![
            rated("A", 5.0, 1, [1, 0, 0, 0, 0]),
            rated("B", 3.0, 3, [0, 0, 3, 0, 0]),
            rated("C", 4.0, 2, [0, 2, 0, 0, 0]),
        ];
        let summary = aggregate(&records);

        assert_eq!(summary.unweighted_mean, Some(4.0));
        // (5 + 9 + 8) / 6
        assert_eq!(summary.weighted_mean, Some(3.667));
        assert_eq!(summary.total_reviews, 6);
        assert_eq!(summary.stars.as_array(), [1, 2, 3, 0, 0]);
    }

    #[test]
    fn test_weighted_mean_within_rating_bounds() {
        let records = vec![
            rated("A", 4.9, 1000, [0; 5]),
            rated("B", 1.2, 7, [0; 5]),
            rated("C", 3.3, 55, [0; 5]),
            ProductRecord::empty(Asin::new("D")),
        ];
        let weighted = aggregate(&records).weighted_mean.unwrap();
        assert!((1.2..=4.9).contains(&weighted));
    }

    #[test]
    fn test_unweighted_mean_is_rounded() {
        let records = vec![
            rated("A", 4.0, 1, [0; 5]),
            rated("B", 4.0, 1, [0; 5]),
            rated("C", 5.0, 1, [0; 5]),
        ];
        assert_eq!(aggregate(&records).unweighted_mean, Some(4.333));
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let records = vec![
            rated("A", 4.1, 12, [8, 2, 1, 1, 0]),
            ProductRecord::empty(Asin::new("B")),
        ];
        assert_eq!(aggregate(&records), aggregate(&records));
    }

    #[test]
    fn test_grand_total_record() {
        let records = vec![
            rated("A", 4.0, 10, [6, 4, 0, 0, 0]),
            rated("B", 5.0, 30, [30, 0, 0, 0, 0]),
        ];
        let summary = aggregate(&records);
        let total = grand_total_record(&summary);

        assert_eq!(total.asin.as_str(), GRAND_TOTAL_LABEL);
        assert_eq!(total.average_rating, Some(4.5));
        assert_eq!(total.total_reviews, Some(40));
        assert_eq!(total.stars.map(|s| s.as_array()), Some([36, 4, 0, 0, 0]));
        assert!(total.design.is_none() && total.size.is_none());
    }

    #[test]
    fn test_huge_review_counts_saturate() {
        let big = u64::MAX / 2 + 1;
        let records = vec![
            rated("A", 4.0, big, [big, 0, 0, 0, 0]),
            rated("B", 4.0, big, [big, 0, 0, 0, 0]),
        ];
        let summary = aggregate(&records);

        assert_eq!(summary.total_reviews, u64::MAX);
        assert_eq!(summary.stars.five, u64::MAX);
        assert_eq!(summary.unweighted_mean, Some(4.0));
        assert_eq!(summary.weighted_mean, Some(4.0));
    }

    #[test]
    fn test_empty_input() {
        let summary = aggregate(&[]);
        assert_eq!(summary.products, 0);
        assert_eq!(summary.unweighted_mean, None);
        assert_eq!(summary.weighted_mean, None);
    }
}
