//! Per-review confidence weights.
//!
//! A weight is a product of strictly positive factors, applied in order:
//! recency decay, vote balance, instructor relevance, seasonal alignment.
//! Instructor and course scoring differ only in the [`ConfidencePolicy`] they use.

use serde::{Deserialize, Serialize};

use crate::data::Review;
use crate::terms::{Season, TERMS_PER_YEAR};

/// What a review is weighed against: the evaluation term and, for course
/// scoring, the instructors scheduled for the course at that term.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub term: u32,
    pub roster: &'a [String],
}

impl<'a> ScoringContext<'a> {
    pub fn new(term: u32) -> Self {
        Self { term, roster: &[] }
    }

    pub fn with_roster(term: u32, roster: &'a [String]) -> Self {
        Self { term, roster }
    }
}

/// Compounding discount per academic year of age beyond a grace window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecencyDecay {
    /// Terms of age that carry no discount.
    pub grace_terms: u32,
    /// Fraction of weight lost per additional year.
    pub yearly_discount: f64,
}

impl RecencyDecay {
    pub fn factor(&self, age_terms: i64) -> f64 {
        let excess = age_terms - i64::from(self.grace_terms);
        if excess <= 0 {
            return 1.0;
        }
        (1.0 - self.yearly_discount).powf(excess as f64 / f64::from(TERMS_PER_YEAR))
    }
}

/// Weight adjustment from the review's net helpfulness votes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoteWeight {
    /// Weight gained per net upvote.
    pub upvote_factor: f64,
}

impl VoteWeight {
    pub fn factor(&self, balance: i64) -> f64 {
        match balance {
            v if v > 0 => 1.0 + v as f64 * self.upvote_factor,
            v if v < 0 => 1.0 / (v.unsigned_abs() as f64 + 1.0),
            _ => 1.0,
        }
    }
}

/// Multipliers for whether the reviewed instructor is teaching the course now.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelevanceWeight {
    pub same_instructor: f64,
    pub other_instructor: f64,
}

impl RelevanceWeight {
    pub fn factor(&self, instructor: &str, roster: &[String]) -> f64 {
        if roster.iter().any(|i| i == instructor) {
            self.same_instructor
        } else {
            self.other_instructor
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidencePolicy {
    pub recency: RecencyDecay,
    pub votes: VoteWeight,
    #[serde(default)]
    pub relevance: Option<RelevanceWeight>,
    /// Multiplier for reviews from the same season as the evaluation term.
    #[serde(default)]
    pub seasonal_boost: Option<f64>,
}

impl ConfidencePolicy {
    /// Instructor scoring: two years of grace, full weight per upvote.
    pub fn instructor() -> Self {
        Self {
            recency: RecencyDecay {
                grace_terms: 2 * TERMS_PER_YEAR,
                yearly_discount: 0.25,
            },
            votes: VoteWeight { upvote_factor: 1.0 },
            relevance: None,
            seasonal_boost: None,
        }
    }

    /// Course scoring: decay from the first term, half weight per upvote, and
    /// strong preference for reviews of the instructors currently teaching it.
    pub fn course() -> Self {
        Self {
            recency: RecencyDecay {
                grace_terms: 0,
                yearly_discount: 0.25,
            },
            votes: VoteWeight { upvote_factor: 0.5 },
            relevance: Some(RelevanceWeight {
                same_instructor: 3.0,
                other_instructor: 0.15,
            }),
            seasonal_boost: Some(1.5),
        }
    }

    pub fn confidence(&self, review: &Review, context: &ScoringContext<'_>) -> f64 {
        let age = i64::from(context.term) - i64::from(review.term_number);

        let mut weight = self.recency.factor(age);
        weight *= self.votes.factor(review.vote_balance());
        if let Some(relevance) = &self.relevance {
            weight *= relevance.factor(&review.instructor, context.roster);
        }
        if let Some(boost) = self.seasonal_boost
            && Season::same_season(review.term_number, context.term)
        {
            weight *= boost;
        }
        weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::reviews::tests::review;

    fn voted(up: u32, down: u32, term_number: u32) -> Review {
        let mut r = review("LEE", ("COMP", "2011"), term_number);
        r.upvote_count = up;
        r.downvote_count = down;
        r
    }

    #[test]
    fn test_instructor_grace_window() {
        let policy = ConfidencePolicy::instructor();
        let ctx = ScoringContext::new(100);
        assert_eq!(policy.confidence(&voted(0, 0, 92), &ctx), 1.0);
        // One year beyond the window
        let w = policy.confidence(&voted(0, 0, 88), &ctx);
        assert!((w - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_course_decay_has_no_grace() {
        let policy = ConfidencePolicy {
            relevance: None,
            seasonal_boost: None,
            ..ConfidencePolicy::course()
        };
        let w = policy.confidence(&voted(0, 0, 96), &ScoringContext::new(100));
        assert!((w - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_vote_balance_variants() {
        let ctx = ScoringContext::new(10);
        let instructor = ConfidencePolicy::instructor();
        assert_eq!(instructor.confidence(&voted(4, 1, 10), &ctx), 4.0);
        assert_eq!(instructor.confidence(&voted(1, 4, 10), &ctx), 0.25);
        assert_eq!(instructor.confidence(&voted(2, 2, 10), &ctx), 1.0);

        let course_votes = VoteWeight { upvote_factor: 0.5 };
        assert_eq!(course_votes.factor(3), 2.5);
        assert_eq!(course_votes.factor(-3), 0.25);
    }

    #[test]
    fn test_course_relevance_and_season() {
        let policy = ConfidencePolicy::course();
        let roster = vec!["LEE".to_string()];
        let same_term = ScoringContext::with_roster(10, &roster);

        // Same instructor, same season, no age: 3.0 * 1.5
        assert!((policy.confidence(&voted(0, 0, 10), &same_term) - 4.5).abs() < 1e-12);

        // Catalog miss: empty roster, every review is "other instructor"
        let empty = ScoringContext::new(10);
        assert!((policy.confidence(&voted(0, 0, 10), &empty) - 0.225).abs() < 1e-12);

        // Different season, one term old
        let w = policy.confidence(&voted(0, 0, 9), &same_term);
        assert!((w - 3.0 * 0.75f64.powf(0.25)).abs() < 1e-12);
    }
}
