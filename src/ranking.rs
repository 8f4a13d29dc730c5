//! Ranking, percentiles, and letter grades over terminal scores.
//!
//! Overall ratings are min-max normalized, pulled toward the normalized mean by
//! sample count, then competition-ranked (ties share a rank, the next distinct
//! score resumes at its 1-based position) and bucketed into grades.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::data::reviews::cumulative;
use crate::scoring::{EntityId, ScoreRecord, Scorer, ewma};

/// How the overall rating fed into ranking is derived.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverallMethod {
    /// Mean of the two shrunk dimensions on the evaluation-term record.
    Bayesian,
    /// Mean of the EWMAs of the same two dimensions over raw reviews.
    Ewma { alpha: f64 },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GradeTableError {
    #[error("grade table is empty")]
    Empty,
    #[error("grade cutoff {0} is not a finite number")]
    InvalidCutoff(f64),
    #[error("no grade cutoff at or below percentile {0}")]
    NoMatch(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeCutoff {
    pub cutoff: f64,
    pub grade: String,
}

/// Percentile cutoffs to letter grades, sorted descending by cutoff.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeTable {
    cutoffs: Vec<GradeCutoff>,
}

impl Default for GradeTable {
    fn default() -> Self {
        let cutoffs = [
            (0.90, "A+"),
            (0.80, "A"),
            (0.75, "A-"),
            (0.60, "B+"),
            (0.45, "B"),
            (0.35, "B-"),
            (0.30, "C+"),
            (0.25, "C"),
            (0.20, "C-"),
            (0.10, "D"),
            (0.00, "F"),
        ];
        Self {
            cutoffs: cutoffs
                .into_iter()
                .map(|(cutoff, grade)| GradeCutoff {
                    cutoff,
                    grade: grade.to_string(),
                })
                .collect(),
        }
    }
}

impl GradeTable {
    pub fn new(mut cutoffs: Vec<GradeCutoff>) -> Result<Self, GradeTableError> {
        if cutoffs.is_empty() {
            return Err(GradeTableError::Empty);
        }
        if let Some(bad) = cutoffs.iter().find(|c| !c.cutoff.is_finite()) {
            return Err(GradeTableError::InvalidCutoff(bad.cutoff));
        }
        cutoffs.sort_by(|a, b| b.cutoff.total_cmp(&a.cutoff));
        Ok(Self { cutoffs })
    }

    /// Grade of the highest cutoff not above `percentile`.
    pub fn grade(&self, percentile: f64) -> Result<&str, GradeTableError> {
        self.cutoffs
            .iter()
            .find(|c| percentile >= c.cutoff)
            .map(|c| c.grade.as_str())
            .ok_or(GradeTableError::NoMatch(percentile))
    }
}

/// One entity's input to ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RankInput {
    pub entity: EntityId,
    /// `None` excludes the entity from ranking.
    pub overall_rating: Option<f64>,
    pub samples: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RankedEntity {
    pub entity: EntityId,
    pub overall_rating: f64,
    pub samples: usize,
    pub score: f64,
    pub rank: usize,
    pub percentile: f64,
    pub grade: String,
}

/// Collect ranking inputs from the newest record of each timeline.
pub fn overall_inputs(
    scorer: &Scorer,
    timelines: &BTreeMap<EntityId, Vec<ScoreRecord>>,
    evaluation_term: u32,
    method: OverallMethod,
) -> Vec<RankInput> {
    let [first, second] = scorer.kind().overall_dimensions();

    timelines
        .iter()
        .filter_map(|(entity, records)| {
            let terminal = records.iter().find(|r| r.term == evaluation_term)?;
            let overall_rating = match method {
                OverallMethod::Bayesian => terminal.bayesian_ratings.as_ref().and_then(|shrunk| {
                    Some((shrunk.get(first)? + shrunk.get(second)?) / 2.0)
                }),
                OverallMethod::Ewma { alpha } => {
                    let reviews = cumulative(scorer.reviews_of(entity), evaluation_term);
                    let series = |dimension| -> Vec<(u32, f64)> {
                        reviews
                            .iter()
                            .map(|r| (r.term_number, r.rating(dimension)))
                            .collect()
                    };
                    ewma(&series(first), alpha, evaluation_term)
                        .zip(ewma(&series(second), alpha, evaluation_term))
                        .map(|(a, b)| (a + b) / 2.0)
                }
            };
            Some(RankInput {
                entity: entity.clone(),
                overall_rating,
                samples: terminal.samples,
            })
        })
        .collect()
}

/// Min-max normalizer over a population of ratings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Linear {
    min: f64,
    max: f64,
}

impl Linear {
    /// `None` for an empty population.
    pub fn fit(values: &[f64]) -> Option<Self> {
        let min = values.iter().copied().reduce(f64::min)?;
        let max = values.iter().copied().reduce(f64::max)?;
        Some(Self { min, max })
    }

    /// Position of `x` in `[min, max]`; a population with no spread maps to `1.0`.
    pub fn apply(&self, x: f64) -> f64 {
        if self.max == self.min {
            return 1.0;
        }
        (x - self.min) / (self.max - self.min)
    }
}

/// Blend a normalized rating with the normalized population mean by sample count.
pub fn sample_aware_score(
    linear_rating: f64,
    samples: f64,
    linear_mean: f64,
    mean_samples: f64,
) -> f64 {
    (mean_samples * linear_mean + samples * linear_rating) / (mean_samples + samples)
}

/// Competition ranks for scores already sorted descending.
pub fn competition_ranks(sorted_scores: &[f64]) -> Vec<usize> {
    let mut ranks = Vec::with_capacity(sorted_scores.len());
    let mut rank = 1;
    for (i, score) in sorted_scores.iter().enumerate() {
        if i > 0 && *score != sorted_scores[i - 1] {
            rank = i + 1;
        }
        ranks.push(rank);
    }
    ranks
}

/// `(n - rank + 1) / n`: rank 1 maps to 1.0.
pub fn percentile(rank: usize, n: usize) -> f64 {
    (n - rank + 1) as f64 / n as f64
}

/// Rank every entity with a defined overall rating, best first.
///
/// Fails as a whole if any percentile has no grade.
pub fn rank(inputs: &[RankInput], grades: &GradeTable) -> Result<Vec<RankedEntity>, GradeTableError> {
    let rated: Vec<(&RankInput, f64)> = inputs
        .iter()
        .filter_map(|input| input.overall_rating.map(|overall| (input, overall)))
        .collect();
    let overalls: Vec<f64> = rated.iter().map(|(_, overall)| *overall).collect();
    let Some(linear) = Linear::fit(&overalls) else {
        return Ok(Vec::new());
    };

    let n = rated.len();
    let mean = overalls.iter().sum::<f64>() / n as f64;
    let linear_mean = linear.apply(mean);
    let mean_samples = rated.iter().map(|(i, _)| i.samples as f64).sum::<f64>() / n as f64;

    let mut scored: Vec<(&RankInput, f64, f64)> = rated
        .into_iter()
        .map(|(input, overall)| {
            let score = sample_aware_score(
                linear.apply(overall),
                input.samples as f64,
                linear_mean,
                mean_samples,
            );
            (input, overall, score)
        })
        .collect();
    scored.sort_by(|a, b| b.2.total_cmp(&a.2).then_with(|| a.0.entity.cmp(&b.0.entity)));

    let scores: Vec<f64> = scored.iter().map(|(_, _, score)| *score).collect();
    let ranks = competition_ranks(&scores);

    scored
        .into_iter()
        .zip(ranks)
        .map(|((input, overall, score), rank)| {
            let percentile = percentile(rank, n);
            Ok::<_, GradeTableError>(RankedEntity {
                entity: input.entity.clone(),
                overall_rating: overall,
                samples: input.samples,
                score,
                rank,
                percentile,
                grade: grades.grade(percentile)?.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::data::reviews::tests::review;
    use crate::data::{Dataset, OfferingCatalog, Review, ReviewStore};
    use crate::scoring::{ConfidencePolicy, EntityKind};

    fn rated(term: u32, teaching: f64, instructor: f64) -> Review {
        let mut r = review("LEE", ("COMP", "2011"), term);
        r.rating_teaching = teaching;
        r.rating_instructor = instructor;
        r
    }

    #[test]
    fn test_competition_ranks_jump_after_ties() {
        assert_eq!(competition_ranks(&[0.9, 0.9, 0.7]), vec![1, 1, 3]);
        assert_eq!(competition_ranks(&[0.9, 0.8, 0.8, 0.8, 0.1]), vec![1, 2, 2, 2, 5]);
        assert!(competition_ranks(&[]).is_empty());
    }

    #[test]
    fn test_percentiles_from_ranks() {
        let ps: Vec<f64> = [1, 1, 3].iter().map(|&r| percentile(r, 3)).collect();
        assert_eq!(ps[0], 1.0);
        assert_eq!(ps[1], 1.0);
        assert!((ps[2] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_default_grades() {
        let table = GradeTable::default();
        assert_eq!(table.grade(0.82).unwrap(), "A");
        assert_eq!(table.grade(0.90).unwrap(), "A+");
        assert_eq!(table.grade(0.05).unwrap(), "F");
        assert_eq!(table.grade(1.0).unwrap(), "A+");
        assert_eq!(table.grade(0.75).unwrap(), "A-");
    }

    #[test]
    fn test_grade_table_without_floor() {
        let table = GradeTable::new(vec![
            GradeCutoff { cutoff: 0.5, grade: "P".to_string() },
            GradeCutoff { cutoff: 0.9, grade: "H".to_string() },
        ])
        .unwrap();
        assert_eq!(table.grade(0.95).unwrap(), "H");
        assert_eq!(table.grade(0.2), Err(GradeTableError::NoMatch(0.2)));
        assert_eq!(GradeTable::new(vec![]), Err(GradeTableError::Empty));
    }

    #[test]
    fn test_rank_fails_without_grade_floor() {
        let inputs = vec![
            RankInput {
                entity: EntityId::instructor("LEE"),
                overall_rating: Some(4.0),
                samples: 3,
            },
            RankInput {
                entity: EntityId::instructor("WONG"),
                overall_rating: Some(2.0),
                samples: 3,
            },
        ];
        let table = GradeTable::new(vec![GradeCutoff { cutoff: 0.9, grade: "H".to_string() }])
            .unwrap();
        assert_eq!(rank(&inputs, &table), Err(GradeTableError::NoMatch(0.5)));
    }

    #[test]
    fn test_ewma_overall_uses_reviews_up_to_evaluation() {
        let data = Arc::new(Dataset {
            reviews: ReviewStore::new(vec![
                rated(10, 2.0, 4.0),
                rated(12, 4.0, 4.0),
                rated(20, 1.0, 1.0),
            ]),
            offerings: OfferingCatalog::default(),
        });
        let scorer = Scorer::new(EntityKind::Instructor, ConfidencePolicy::instructor(), data);
        let lee = EntityId::instructor("LEE");
        let timelines = BTreeMap::from([(lee.clone(), scorer.rollup(&lee, 16))]);

        let alpha = 0.1;
        let inputs = overall_inputs(&scorer, &timelines, 16, OverallMethod::Ewma { alpha });
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].entity, lee);
        assert_eq!(inputs[0].samples, 2);

        // Teaching EWMA over terms 10 and 12 at now = 16; the instructor series is flat at 4.0.
        let w10 = alpha * (1.0 - alpha).powi(6);
        let w12 = alpha * (1.0 - alpha).powi(4);
        let teaching = (2.0 * w10 + 4.0 * w12) / (w10 + w12);
        let expected = (teaching + 4.0) / 2.0;
        let overall = inputs[0].overall_rating.unwrap();
        assert!((overall - expected).abs() < 1e-12, "{overall} != {expected}");

        let bayesian = overall_inputs(&scorer, &timelines, 16, OverallMethod::Bayesian);
        assert_eq!(bayesian[0].samples, 2);
        assert_ne!(bayesian[0].overall_rating, inputs[0].overall_rating);
    }

    #[test]
    fn test_linear_without_spread() {
        let linear = Linear::fit(&[2.0, 2.0]).unwrap();
        assert_eq!(linear.apply(2.0), 1.0);
        assert!(Linear::fit(&[]).is_none());
    }

    #[test]
    fn test_few_samples_pull_toward_mean() {
        // Equal sample counts: ordering follows the rating.
        let linear_mean = 0.5;
        let strong = sample_aware_score(1.0, 10.0, linear_mean, 10.0);
        let weak = sample_aware_score(0.0, 10.0, linear_mean, 10.0);
        assert!(strong > weak);
        // A single glowing review is damped toward the mean.
        let lucky = sample_aware_score(1.0, 1.0, linear_mean, 10.0);
        assert!(lucky < 0.6);
    }
}
