//! Confidence-weighted scoring of instructors and courses.
//!
//! Pipeline per evaluation term: per-review confidence -> weighted means ->
//! Bayesian shrinkage toward the population -> per-entity timelines.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::data::{CourseKey, Dimension};

pub mod aggregate;
pub mod bayes;
pub mod confidence;
pub mod ewma;
pub mod rollup;

pub use aggregate::{Aggregate, aggregate, weighted_mean};
pub use bayes::{PopulationPrior, shrink};
pub use confidence::{ConfidencePolicy, RecencyDecay, RelevanceWeight, ScoringContext, VoteWeight};
pub use ewma::{DEFAULT_EWMA_ALPHA, ewma};
pub use rollup::{EntityKind, Scorer};

/// Identity of a scored entity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum EntityId {
    Instructor { instructor: String },
    Course { subject: String, number: String },
}

impl EntityId {
    pub fn instructor(name: impl Into<String>) -> Self {
        Self::Instructor {
            instructor: name.into(),
        }
    }

    pub fn course(course: &CourseKey) -> Self {
        Self::Course {
            subject: course.subject.clone(),
            number: course.number.clone(),
        }
    }

    pub fn course_key(&self) -> Option<CourseKey> {
        match self {
            Self::Course { subject, number } => Some(CourseKey::new(subject, number)),
            Self::Instructor { .. } => None,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Instructor { instructor } => f.write_str(instructor),
            Self::Course { subject, number } => write!(f, "{subject} {number}"),
        }
    }
}

/// Per-dimension values; `None` marks an undefined mean (no reviews).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Ratings(BTreeMap<Dimension, Option<f64>>);

impl Ratings {
    /// All of `dimensions` present but undefined.
    pub fn undefined(dimensions: &[Dimension]) -> Self {
        Self(dimensions.iter().map(|d| (*d, None)).collect())
    }

    pub fn get(&self, dimension: Dimension) -> Option<f64> {
        self.0.get(&dimension).copied().flatten()
    }

    pub fn set(&mut self, dimension: Dimension, value: Option<f64>) {
        self.0.insert(dimension, value);
    }

    pub fn dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.0.keys().copied()
    }

    pub fn is_undefined(&self) -> bool {
        self.0.values().all(Option::is_none)
    }
}

impl FromIterator<(Dimension, Option<f64>)> for Ratings {
    fn from_iter<I: IntoIterator<Item = (Dimension, Option<f64>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Score of one entity at one evaluation term.
///
/// `ratings` covers every review up to and including `term`; the `individual_*`
/// fields cover only reviews from `term` itself. `bayesian_ratings` is filled by
/// the population pass once every entity at `term` has been aggregated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ScoreRecord {
    pub entity: EntityId,
    pub term: u32,

    pub ratings: Ratings,
    pub samples: usize,
    pub confidence: f64,

    pub individual_ratings: Ratings,
    pub individual_samples: usize,
    pub individual_confidence: f64,

    pub bayesian_ratings: Option<Ratings>,
}
