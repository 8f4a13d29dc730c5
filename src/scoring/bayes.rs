//! Bayesian shrinkage toward the population mean.
//!
//! An entity's weighted mean is blended with the mean across all entities at
//! the same term, weighted by its own confidence mass against the average mass.
//! Sparse entities land near the population; well-reviewed ones keep their own.

use std::collections::BTreeMap;

use super::{Ratings, ScoreRecord};
use crate::data::Dimension;

pub fn shrink(
    entity_mean: f64,
    entity_mass: f64,
    population_mean: f64,
    population_mass: f64,
) -> f64 {
    (entity_mean * entity_mass + population_mean * population_mass)
        / (entity_mass + population_mass)
}

/// Population statistics for one evaluation term.
#[derive(Debug, Clone, PartialEq)]
pub struct PopulationPrior {
    /// Unweighted mean of entities' weighted means, per dimension. Entities
    /// with an undefined mean do not contribute.
    pub means: BTreeMap<Dimension, f64>,
    /// Mean confidence mass over entities with at least one review.
    pub mass: f64,
}

impl PopulationPrior {
    /// `None` when no record has any reviews.
    pub fn from_records(records: &[ScoreRecord], dimensions: &[Dimension]) -> Option<Self> {
        let evidenced: Vec<&ScoreRecord> = records.iter().filter(|r| r.samples > 0).collect();
        if evidenced.is_empty() {
            return None;
        }
        let mass = evidenced.iter().map(|r| r.confidence).sum::<f64>() / evidenced.len() as f64;

        let means = dimensions
            .iter()
            .filter_map(|&dimension| {
                let values: Vec<f64> = evidenced
                    .iter()
                    .filter_map(|r| r.ratings.get(dimension))
                    .collect();
                (!values.is_empty())
                    .then(|| (dimension, values.iter().sum::<f64>() / values.len() as f64))
            })
            .collect();

        Some(Self { means, mass })
    }

    /// Shrunk ratings for one record; undefined wherever its own mean is.
    pub fn shrink_record(&self, record: &ScoreRecord) -> Ratings {
        record
            .ratings
            .dimensions()
            .map(|dimension| {
                let shrunk = record
                    .ratings
                    .get(dimension)
                    .zip(self.means.get(&dimension))
                    .map(|(mean, &population)| {
                        shrink(mean, record.confidence, population, self.mass)
                    });
                (dimension, shrunk)
            })
            .collect()
    }

    /// Second pass: write shrunk ratings into every record.
    pub fn apply(&self, records: &mut [ScoreRecord]) {
        for record in records.iter_mut() {
            record.bayesian_ratings = Some(self.shrink_record(record));
        }
    }
}
