//! Normalized review rows and the in-memory store the scoring engine reads.
//!
//! Reviews are grouped once per instructor and per course and sorted by term
//! number, so cumulative (`term <= t`) and individual (`term == t`) sets are
//! contiguous slices found by binary search rather than per-term queries.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A rating dimension carried by every review.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum Dimension {
    Content,
    Teaching,
    Grading,
    Workload,
    /// Rating of the named instructor specifically; meaningless for courses.
    Instructor,
}

impl Dimension {
    pub const ALL: [Dimension; 5] = [
        Dimension::Content,
        Dimension::Teaching,
        Dimension::Grading,
        Dimension::Workload,
        Dimension::Instructor,
    ];

    /// Dimensions that describe a course independent of who teaches it.
    pub const COURSE: [Dimension; 4] = [
        Dimension::Content,
        Dimension::Teaching,
        Dimension::Grading,
        Dimension::Workload,
    ];
}

/// A (subject, number) course identifier, e.g. `COMP 2011`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CourseKey {
    pub subject: String,
    pub number: String,
}

impl CourseKey {
    pub fn new(subject: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            number: number.into(),
        }
    }
}

impl fmt::Display for CourseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.subject, self.number)
    }
}

/// One review of one instructor for one course offering.
///
/// A review naming several instructors becomes several rows sharing a `hash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub hash: String,
    /// Four-digit term code, e.g. `"2330"`.
    pub term: String,
    /// Term label, e.g. `"2023-24 Spring"`.
    pub term_name: String,
    pub term_number: u32,
    pub subject: String,
    pub number: String,
    pub instructor: String,
    pub rating_content: f64,
    pub rating_teaching: f64,
    pub rating_grading: f64,
    pub rating_workload: f64,
    pub rating_instructor: f64,
    pub upvote_count: u32,
    pub downvote_count: u32,
}

impl Review {
    pub fn rating(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Content => self.rating_content,
            Dimension::Teaching => self.rating_teaching,
            Dimension::Grading => self.rating_grading,
            Dimension::Workload => self.rating_workload,
            Dimension::Instructor => self.rating_instructor,
        }
    }

    fn rating_mut(&mut self, dimension: Dimension) -> &mut f64 {
        match dimension {
            Dimension::Content => &mut self.rating_content,
            Dimension::Teaching => &mut self.rating_teaching,
            Dimension::Grading => &mut self.rating_grading,
            Dimension::Workload => &mut self.rating_workload,
            Dimension::Instructor => &mut self.rating_instructor,
        }
    }

    pub fn course(&self) -> CourseKey {
        CourseKey::new(&self.subject, &self.number)
    }

    /// Net helpfulness: upvotes minus downvotes.
    pub fn vote_balance(&self) -> i64 {
        i64::from(self.upvote_count) - i64::from(self.downvote_count)
    }
}

/// Term predicate for [`ReviewSelector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermFilter {
    Exactly(u32),
    AtMost(u32),
}

impl TermFilter {
    fn matches(self, term_number: u32) -> bool {
        match self {
            Self::Exactly(t) => term_number == t,
            Self::AtMost(t) => term_number <= t,
        }
    }
}

/// Equality/range selector over review rows. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct ReviewSelector {
    pub instructor: Option<String>,
    pub subject: Option<String>,
    pub number: Option<String>,
    pub term: Option<TermFilter>,
}

impl ReviewSelector {
    pub fn instructor(name: impl Into<String>) -> Self {
        Self {
            instructor: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn course(course: &CourseKey) -> Self {
        Self {
            subject: Some(course.subject.clone()),
            number: Some(course.number.clone()),
            ..Default::default()
        }
    }

    pub fn with_term(mut self, filter: TermFilter) -> Self {
        self.term = Some(filter);
        self
    }

    fn matches(&self, review: &Review) -> bool {
        self.instructor.as_ref().is_none_or(|i| *i == review.instructor)
            && self.subject.as_ref().is_none_or(|s| *s == review.subject)
            && self.number.as_ref().is_none_or(|n| *n == review.number)
            && self.term.is_none_or(|t| t.matches(review.term_number))
    }
}

/// Immutable, indexed collection of reviews.
#[derive(Debug, Default)]
pub struct ReviewStore {
    reviews: Vec<Review>,
    by_instructor: BTreeMap<String, Vec<Review>>,
    by_course: BTreeMap<CourseKey, Vec<Review>>,
}

impl ReviewStore {
    pub fn new(reviews: Vec<Review>) -> Self {
        let mut by_instructor: BTreeMap<String, Vec<Review>> = BTreeMap::new();
        let mut by_course: BTreeMap<CourseKey, Vec<Review>> = BTreeMap::new();
        for review in &reviews {
            by_instructor
                .entry(review.instructor.clone())
                .or_default()
                .push(review.clone());
            by_course
                .entry(review.course())
                .or_default()
                .push(review.clone());
        }
        // Stable: rows within a term keep insertion order.
        for group in by_instructor.values_mut().chain(by_course.values_mut()) {
            group.sort_by_key(|r| r.term_number);
        }

        Self {
            reviews,
            by_instructor,
            by_course,
        }
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Review> {
        self.reviews.iter()
    }

    pub fn find(&self, selector: &ReviewSelector) -> Vec<&Review> {
        self.reviews.iter().filter(|r| selector.matches(r)).collect()
    }

    pub fn count(&self, selector: &ReviewSelector) -> usize {
        self.reviews.iter().filter(|r| selector.matches(r)).count()
    }

    /// Distinct instructor names, sorted.
    pub fn instructors(&self) -> impl Iterator<Item = &str> {
        self.by_instructor.keys().map(String::as_str)
    }

    /// Distinct courses, sorted.
    pub fn courses(&self) -> impl Iterator<Item = &CourseKey> {
        self.by_course.keys()
    }

    /// Distinct term numbers carrying at least one review, ascending.
    pub fn term_numbers(&self) -> BTreeSet<u32> {
        self.reviews.iter().map(|r| r.term_number).collect()
    }

    pub fn latest_term_number(&self) -> Option<u32> {
        self.reviews.iter().map(|r| r.term_number).max()
    }

    /// All reviews of an instructor, sorted by term number.
    pub fn instructor_reviews(&self, instructor: &str) -> &[Review] {
        self.by_instructor
            .get(instructor)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// All reviews of a course, sorted by term number.
    pub fn course_reviews(&self, course: &CourseKey) -> &[Review] {
        self.by_course
            .get(course)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Prefix of a term-sorted slice with `term_number <= term`.
pub fn cumulative(sorted: &[Review], term: u32) -> &[Review] {
    &sorted[..sorted.partition_point(|r| r.term_number <= term)]
}

/// Sub-slice of a term-sorted slice with `term_number == term`.
pub fn within_term(sorted: &[Review], term: u32) -> &[Review] {
    let start = sorted.partition_point(|r| r.term_number < term);
    let end = sorted.partition_point(|r| r.term_number <= term);
    &sorted[start..end]
}

/// Z-score every rating dimension across all rows.
///
/// Uses the population standard deviation. A dimension with zero spread is
/// centred but left unscaled.
pub fn normalize_ratings(reviews: &mut [Review]) {
    if reviews.is_empty() {
        return;
    }
    let n = reviews.len() as f64;
    for dimension in Dimension::ALL {
        let mean = reviews.iter().map(|r| r.rating(dimension)).sum::<f64>() / n;
        let variance = reviews
            .iter()
            .map(|r| (r.rating(dimension) - mean).powi(2))
            .sum::<f64>()
            / n;
        let std = variance.sqrt();
        for review in reviews.iter_mut() {
            let value = review.rating_mut(dimension);
            *value -= mean;
            if std > 0.0 {
                *value /= std;
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn review(instructor: &str, course: (&str, &str), term_number: u32) -> Review {
        Review {
            hash: format!("{instructor}-{}{}-{term_number}", course.0, course.1),
            term: String::new(),
            term_name: String::new(),
            term_number,
            subject: course.0.to_string(),
            number: course.1.to_string(),
            instructor: instructor.to_string(),
            rating_content: 3.0,
            rating_teaching: 3.0,
            rating_grading: 3.0,
            rating_workload: 3.0,
            rating_instructor: 3.0,
            upvote_count: 0,
            downvote_count: 0,
        }
    }

    #[test]
    fn test_groups_are_sorted_by_term() {
        let store = ReviewStore::new(vec![
            review("LEE", ("COMP", "2011"), 14),
            review("LEE", ("COMP", "2011"), 10),
            review("LEE", ("MATH", "1013"), 12),
            review("WONG", ("COMP", "2011"), 11),
        ]);
        let terms: Vec<u32> = store
            .instructor_reviews("LEE")
            .iter()
            .map(|r| r.term_number)
            .collect();
        assert_eq!(terms, vec![10, 12, 14]);

        let course = CourseKey::new("COMP", "2011");
        let terms: Vec<u32> = store
            .course_reviews(&course)
            .iter()
            .map(|r| r.term_number)
            .collect();
        assert_eq!(terms, vec![10, 11, 14]);
        assert!(store.instructor_reviews("NOBODY").is_empty());
    }

    #[test]
    fn test_slicing_matches_selectors() {
        let store = ReviewStore::new(vec![
            review("LEE", ("COMP", "2011"), 10),
            review("LEE", ("COMP", "2011"), 12),
            review("LEE", ("COMP", "2012"), 12),
            review("LEE", ("COMP", "2011"), 14),
        ]);
        let sorted = store.instructor_reviews("LEE");

        let selector = ReviewSelector::instructor("LEE").with_term(TermFilter::AtMost(12));
        assert_eq!(cumulative(sorted, 12).len(), store.count(&selector));

        let selector = ReviewSelector::instructor("LEE").with_term(TermFilter::Exactly(12));
        assert_eq!(within_term(sorted, 12).len(), store.count(&selector));
        assert!(within_term(sorted, 13).is_empty());
        assert!(cumulative(sorted, 9).is_empty());
    }

    #[test]
    fn test_find_by_course() {
        let store = ReviewStore::new(vec![
            review("LEE", ("COMP", "2011"), 10),
            review("WONG", ("COMP", "2011"), 12),
            review("WONG", ("MATH", "1013"), 12),
        ]);
        let found = store.find(&ReviewSelector::course(&CourseKey::new("COMP", "2011")));
        assert_eq!(found.len(), 2);
        assert_eq!(store.term_numbers().into_iter().collect::<Vec<_>>(), vec![10, 12]);
    }

    #[test]
    fn test_normalize_ratings() {
        let mut rows = vec![
            review("LEE", ("COMP", "2011"), 10),
            review("LEE", ("COMP", "2011"), 11),
        ];
        rows[0].rating_teaching = 1.0;
        rows[1].rating_teaching = 5.0;
        normalize_ratings(&mut rows);

        assert!((rows[0].rating_teaching + 1.0).abs() < 1e-12);
        assert!((rows[1].rating_teaching - 1.0).abs() < 1e-12);
        // Constant dimension: centred, not divided by zero.
        assert_eq!(rows[0].rating_content, 0.0);
    }
}
