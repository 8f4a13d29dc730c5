//! Runtime configuration.
//!
//! Sources are merged in order, later ones winning: built-in defaults, an
//! optional TOML file, then `SCORECARD_`-prefixed environment variables.
//! Nested keys use `__` in the environment, e.g.
//! `SCORECARD_COURSE_CONFIDENCE__SEASONAL_BOOST=2.0`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::data::Dataset;
use crate::ranking::{GradeCutoff, GradeTable, OverallMethod};
use crate::scoring::{ConfidencePolicy, DEFAULT_EWMA_ALPHA};
use crate::terms::{TermError, parse_semester_label};

pub const ENV_PREFIX: &str = "SCORECARD_";

/// A configured term: a label or code string, or a bare code number.
///
/// Environment values such as `2330` arrive as integers, so both shapes are
/// accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TermSpec {
    Code(u32),
    Text(String),
}

impl TermSpec {
    pub fn term_number(&self) -> Result<u32, TermError> {
        match self {
            Self::Code(code) => parse_semester_label(&format!("{code:04}")),
            Self::Text(text) => parse_semester_label(text),
        }
    }
}

impl std::fmt::Display for TermSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{code:04}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallMethodName {
    #[default]
    Bayesian,
    Ewma,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Level for this crate's events when `RUST_LOG` is unset.
    pub log_level: String,
    /// Root containing `reviews/` and `offerings/`.
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Label (`"2023-24 Spring"`) or code (`"2330"`). Defaults to the newest
    /// catalog term, then the newest reviewed term.
    pub evaluation_term: Option<TermSpec>,
    pub normalize_ratings: bool,
    pub overall_method: OverallMethodName,
    pub ewma_alpha: f64,
    /// Replaces the built-in grade table when set.
    pub grades: Option<Vec<GradeCutoff>>,
    pub instructor_confidence: ConfidencePolicy,
    pub course_confidence: ConfidencePolicy,
    /// Stages slower than this are logged at warn level.
    pub slow_stage_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("."),
            evaluation_term: None,
            normalize_ratings: true,
            overall_method: OverallMethodName::default(),
            ewma_alpha: DEFAULT_EWMA_ALPHA,
            grades: None,
            instructor_confidence: ConfidencePolicy::instructor(),
            course_confidence: ConfidencePolicy::course(),
            slow_stage_ms: 2000,
        }
    }
}

impl Config {
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path
            && !path.exists()
        {
            bail!("Config file {} does not exist", path.display());
        }
        Self::figment(path)
            .extract()
            .context("Failed to load config")
    }

    pub fn overall_method(&self) -> OverallMethod {
        match self.overall_method {
            OverallMethodName::Bayesian => OverallMethod::Bayesian,
            OverallMethodName::Ewma => OverallMethod::Ewma {
                alpha: self.ewma_alpha,
            },
        }
    }

    pub fn grade_table(&self) -> Result<GradeTable> {
        match &self.grades {
            Some(cutoffs) => GradeTable::new(cutoffs.clone()).context("Invalid grade table"),
            None => Ok(GradeTable::default()),
        }
    }

    pub fn slow_stage(&self) -> Duration {
        Duration::from_millis(self.slow_stage_ms)
    }

    /// Resolve the configured evaluation term to a term number.
    pub fn evaluation_term(&self, data: &Dataset) -> Result<u32> {
        if let Some(term) = &self.evaluation_term {
            return term
                .term_number()
                .with_context(|| format!("Invalid evaluation_term \"{term}\""));
        }
        match data
            .offerings
            .latest_term_number()
            .or_else(|| data.reviews.latest_term_number())
        {
            Some(term) => Ok(term),
            None => bail!("No evaluation_term configured and no terms found in the dataset"),
        }
    }
}
