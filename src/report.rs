//! Assembly and serialization of per-entity output documents.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::data::Dataset;
use crate::extras::{Extras, extras_of};
use crate::ranking::RankedEntity;
use crate::scoring::{EntityId, ScoreRecord};

/// Ranking summary of an entity at the evaluation term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Ranking {
    pub score: f64,
    pub rank: usize,
    pub percentile: f64,
    pub grade: String,
}

impl From<&RankedEntity> for Ranking {
    fn from(ranked: &RankedEntity) -> Self {
        Self {
            score: ranked.score,
            rank: ranked.rank,
            percentile: ranked.percentile,
            grade: ranked.grade.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EntityReport {
    pub entity: EntityId,
    /// Newest term first.
    pub scores: Vec<ScoreRecord>,
    pub extras: Extras,
    /// `None` when the entity has no defined overall rating.
    pub ranking: Option<Ranking>,
}

/// One report per entity, keyed by display name in entity order.
pub fn build_reports(
    data: &Dataset,
    timelines: BTreeMap<EntityId, Vec<ScoreRecord>>,
    ranked: &[RankedEntity],
    evaluation_term: u32,
) -> IndexMap<String, EntityReport> {
    let rankings: BTreeMap<&EntityId, Ranking> = ranked
        .iter()
        .map(|r| (&r.entity, Ranking::from(r)))
        .collect();

    timelines
        .into_iter()
        .map(|(entity, scores)| {
            let report = EntityReport {
                extras: extras_of(data, &entity, evaluation_term),
                ranking: rankings.get(&entity).cloned(),
                scores,
                entity,
            };
            (report.entity.to_string(), report)
        })
        .collect()
}

/// Write `reports` as pretty-printed JSON, creating parent directories.
pub fn write_reports(path: &Path, reports: &IndexMap<String, EntityReport>) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let body = serde_json::to_string_pretty(reports).context("Failed to serialize reports")?;
    std::fs::write(path, body).with_context(|| format!("Failed to write {}", path.display()))
}
