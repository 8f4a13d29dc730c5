//! Confidence-weighted means over a set of reviews.

use super::Ratings;
use crate::data::{Dimension, Review};

/// Dot product of `values` and `weights` divided by the weight total.
///
/// `None` when either side is empty; callers treat that as an undefined rating.
pub fn weighted_mean(values: &[f64], weights: &[f64]) -> Option<f64> {
    if values.is_empty() || weights.is_empty() {
        return None;
    }
    debug_assert_eq!(values.len(), weights.len());
    let total: f64 = weights.iter().sum();
    let dot: f64 = values.iter().zip(weights).map(|(v, w)| v * w).sum();
    Some(dot / total)
}

/// Weighted means of a review set plus its sample count and confidence mass.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub ratings: Ratings,
    pub samples: usize,
    pub confidence: f64,
}

/// Aggregate `reviews` over `dimensions`, weighting each review with `weigh`.
pub fn aggregate(
    reviews: &[Review],
    dimensions: &[Dimension],
    weigh: impl Fn(&Review) -> f64,
) -> Aggregate {
    let weights: Vec<f64> = reviews.iter().map(weigh).collect();
    let ratings = dimensions
        .iter()
        .map(|&dimension| {
            let values: Vec<f64> = reviews.iter().map(|r| r.rating(dimension)).collect();
            (dimension, weighted_mean(&values, &weights))
        })
        .collect();

    Aggregate {
        ratings,
        samples: reviews.len(),
        confidence: weights.iter().sum(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::reviews::tests::review;

    #[test]
    fn test_weighted_mean() {
        assert_eq!(weighted_mean(&[1.0, 3.0], &[1.0, 1.0]), Some(2.0));
        assert_eq!(weighted_mean(&[1.0, 4.0], &[2.0, 1.0]), Some(2.0));
        assert_eq!(weighted_mean(&[], &[]), None);
        assert_eq!(weighted_mean(&[1.0], &[]), None);
    }

    #[test]
    fn test_aggregate_empty_is_undefined() {
        let agg = aggregate(&[], &Dimension::COURSE, |_| 1.0);
        assert_eq!(agg.samples, 0);
        assert_eq!(agg.confidence, 0.0);
        assert!(agg.ratings.is_undefined());
        assert_eq!(agg.ratings.dimensions().count(), 4);
    }

    #[test]
    fn test_aggregate_weights_each_dimension() {
        let mut a = review("LEE", ("COMP", "2011"), 10);
        let mut b = review("LEE", ("COMP", "2011"), 11);
        a.rating_teaching = 2.0;
        b.rating_teaching = 5.0;
        a.rating_workload = 1.0;
        b.rating_workload = 1.0;

        let agg = aggregate(&[a, b], &Dimension::ALL, |r| {
            if r.term_number == 11 { 2.0 } else { 1.0 }
        });
        assert_eq!(agg.samples, 2);
        assert_eq!(agg.confidence, 3.0);
        assert_eq!(agg.ratings.get(Dimension::Teaching), Some(4.0));
        assert_eq!(agg.ratings.get(Dimension::Workload), Some(1.0));
    }
}
