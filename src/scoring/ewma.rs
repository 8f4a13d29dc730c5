//! Time-decayed exponential moving average over term-stamped ratings.

/// Smoothing factor giving an 8-term (two-year) half-life: `(1 - a)^8 ≈ 0.5`.
pub const DEFAULT_EWMA_ALPHA: f64 = 0.08425;

/// Weighted mean of `(term_number, rating)` pairs with `w(s) = a (1-a)^(now - s)`.
///
/// Ratings after `now` are ignored. `None` when nothing remains.
pub fn ewma(ratings: &[(u32, f64)], alpha: f64, now: u32) -> Option<f64> {
    let weight = |term: u32| alpha * (1.0 - alpha).powf(f64::from(now - term));

    let (sum, total) = ratings
        .iter()
        .filter(|(term, _)| *term <= now)
        .fold((0.0, 0.0), |(sum, total), &(term, rating)| {
            let w = weight(term);
            (sum + w * rating, total + w)
        });
    (total > 0.0).then(|| sum / total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_life_is_two_years() {
        let decay = (1.0 - DEFAULT_EWMA_ALPHA).powi(8);
        assert!((decay - 0.5).abs() < 0.01, "decay after 8 terms was {decay}");
    }

    #[test]
    fn test_recent_ratings_dominate() {
        let ratings = [(0, 1.0), (40, 5.0)];
        let value = ewma(&ratings, DEFAULT_EWMA_ALPHA, 40).unwrap();
        assert!(value > 4.9);
    }

    #[test]
    fn test_single_term_is_plain_mean() {
        let ratings = [(10, 2.0), (10, 4.0), (12, 100.0)];
        let value = ewma(&ratings, DEFAULT_EWMA_ALPHA, 10).unwrap();
        assert!((value - 3.0).abs() < 1e-12);
        assert_eq!(ewma(&[], DEFAULT_EWMA_ALPHA, 10), None);
    }
}
