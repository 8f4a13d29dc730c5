//! Per-term scoring of every entity and the historical timeline rollup.
//!
//! The evaluation term is always scored for every entity. Earlier terms are
//! scored lazily: an entity gets a record for term `t` only if it received a
//! review during `t`, and that record is computed as if `t` were "now".

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, info};

use super::aggregate::aggregate;
use super::bayes::PopulationPrior;
use super::confidence::{ConfidencePolicy, ScoringContext};
use super::{EntityId, ScoreRecord};
use crate::data::reviews::{cumulative, within_term};
use crate::data::{CourseKey, Dataset, Dimension, Review, ReviewStore};

/// Which kind of entity is being scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Instructor,
    Course,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Instructor => "instructor",
            Self::Course => "course",
        }
    }

    pub fn dimensions(self) -> &'static [Dimension] {
        match self {
            Self::Instructor => &Dimension::ALL,
            Self::Course => &Dimension::COURSE,
        }
    }

    /// The two shrunk dimensions averaged into the overall rating for ranking.
    pub fn overall_dimensions(self) -> [Dimension; 2] {
        match self {
            Self::Instructor => [Dimension::Teaching, Dimension::Instructor],
            Self::Course => [Dimension::Content, Dimension::Teaching],
        }
    }

    /// Every entity of this kind with at least one review, sorted.
    pub fn entities(self, store: &ReviewStore) -> Vec<EntityId> {
        match self {
            Self::Instructor => store.instructors().map(EntityId::instructor).collect(),
            Self::Course => store.courses().map(EntityId::course).collect(),
        }
    }
}

/// Scores one kind of entity against a loaded dataset.
pub struct Scorer {
    kind: EntityKind,
    policy: ConfidencePolicy,
    data: Arc<Dataset>,
    entities: Vec<EntityId>,
}

impl Scorer {
    pub fn new(kind: EntityKind, policy: ConfidencePolicy, data: Arc<Dataset>) -> Self {
        let entities = kind.entities(&data.reviews);
        Self {
            kind,
            policy,
            data,
            entities,
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn policy(&self) -> &ConfidencePolicy {
        &self.policy
    }

    pub fn data(&self) -> &Dataset {
        &self.data
    }

    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    /// All reviews of `entity`, sorted by term number.
    pub fn reviews_of(&self, entity: &EntityId) -> &[Review] {
        match entity {
            EntityId::Instructor { instructor } => self.data.reviews.instructor_reviews(instructor),
            EntityId::Course { subject, number } => self
                .data
                .reviews
                .course_reviews(&CourseKey::new(subject, number)),
        }
    }

    fn context_for(&self, entity: &EntityId, term: u32) -> ScoringContext<'_> {
        match entity.course_key() {
            Some(course) => {
                ScoringContext::with_roster(term, self.data.offerings.roster(&course, term))
            }
            None => ScoringContext::new(term),
        }
    }

    /// Unshrunk record for `entity` evaluated at `term`.
    ///
    /// With `lazy`, returns `None` when the entity has no review from `term` itself.
    pub fn score_entity(&self, entity: &EntityId, term: u32, lazy: bool) -> Option<ScoreRecord> {
        let reviews = self.reviews_of(entity);
        let this_term = within_term(reviews, term);
        if lazy && this_term.is_empty() {
            return None;
        }
        let up_to_term = cumulative(reviews, term);

        let context = self.context_for(entity, term);
        let weigh = |review: &Review| self.policy.confidence(review, &context);
        let dimensions = self.kind.dimensions();
        let overall = aggregate(up_to_term, dimensions, weigh);
        let individual = aggregate(this_term, dimensions, weigh);

        Some(ScoreRecord {
            entity: entity.clone(),
            term,
            ratings: overall.ratings,
            samples: overall.samples,
            confidence: overall.confidence,
            individual_ratings: individual.ratings,
            individual_samples: individual.samples,
            individual_confidence: individual.confidence,
            bayesian_ratings: None,
        })
    }

    fn unshrunk_term(&self, term: u32, lazy: bool) -> Vec<ScoreRecord> {
        self.entities
            .iter()
            .filter_map(|entity| self.score_entity(entity, term, lazy))
            .collect()
    }

    /// Population statistics over the records that `term` produces.
    pub fn prior_at(&self, term: u32, lazy: bool) -> Option<PopulationPrior> {
        PopulationPrior::from_records(&self.unshrunk_term(term, lazy), self.kind.dimensions())
    }

    /// Every record for `term`, with the Bayesian pass applied.
    pub fn score_term(&self, term: u32, lazy: bool) -> Vec<ScoreRecord> {
        let mut records = self.unshrunk_term(term, lazy);
        if let Some(prior) = PopulationPrior::from_records(&records, self.kind.dimensions()) {
            prior.apply(&mut records);
        }
        records
    }

    /// Terms scored for an evaluation, newest first: every reviewed term up to
    /// `evaluation_term`, plus `evaluation_term` itself.
    pub fn rollup_terms(&self, evaluation_term: u32) -> Vec<u32> {
        let mut terms: BTreeSet<u32> = self
            .data
            .reviews
            .term_numbers()
            .into_iter()
            .filter(|&t| t <= evaluation_term)
            .collect();
        terms.insert(evaluation_term);
        terms.into_iter().rev().collect()
    }

    /// Timeline for a single entity, newest first.
    ///
    /// Recomputes the population at every term it touches; use
    /// [`Scorer::timelines`] to score every entity at once.
    pub fn rollup(&self, entity: &EntityId, evaluation_term: u32) -> Vec<ScoreRecord> {
        let mut terms: BTreeSet<u32> = self
            .reviews_of(entity)
            .iter()
            .map(|r| r.term_number)
            .filter(|&t| t < evaluation_term)
            .collect();
        terms.insert(evaluation_term);

        terms
            .into_iter()
            .rev()
            .filter_map(|term| {
                let lazy = term != evaluation_term;
                let mut record = self.score_entity(entity, term, lazy)?;
                if let Some(prior) = self.prior_at(term, lazy) {
                    record.bayesian_ratings = Some(prior.shrink_record(&record));
                }
                Some(record)
            })
            .collect()
    }

    /// Timelines for every entity, each newest first.
    ///
    /// Terms are independent and scored on the blocking pool; results are
    /// merged by term so task completion order never affects the output.
    pub async fn timelines(
        self: Arc<Self>,
        evaluation_term: u32,
    ) -> Result<BTreeMap<EntityId, Vec<ScoreRecord>>> {
        let terms = self.rollup_terms(evaluation_term);
        info!(
            kind = self.kind.as_str(),
            terms = terms.len(),
            entities = self.entities.len(),
            evaluation_term,
            "Scoring timelines"
        );

        let mut tasks = JoinSet::new();
        for term in terms {
            let scorer = Arc::clone(&self);
            tasks.spawn_blocking(move || {
                let records = scorer.score_term(term, term != evaluation_term);
                (term, records)
            });
        }

        let mut by_term: BTreeMap<u32, Vec<ScoreRecord>> = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (term, records) = joined.context("Term scoring task failed")?;
            debug!(kind = self.kind.as_str(), term, records = records.len(), "Scored term");
            by_term.insert(term, records);
        }

        let mut timelines: BTreeMap<EntityId, Vec<ScoreRecord>> = BTreeMap::new();
        for records in by_term.into_values().rev() {
            for record in records {
                timelines.entry(record.entity.clone()).or_default().push(record);
            }
        }
        Ok(timelines)
    }
}
