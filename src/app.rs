use crate::config::Config;
use crate::data::Dataset;
use crate::ranking::{GradeTable, overall_inputs, rank};
use crate::report::{EntityReport, build_reports, write_reports};
use crate::scoring::{EntityKind, Scorer};
use crate::terms::format_term_number;
use crate::utils::{fmt_duration, log_if_slow};
use anyhow::Context;
use indexmap::IndexMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Loaded dataset plus everything resolved from configuration.
pub struct App {
    config: Config,
    data: Arc<Dataset>,
    evaluation_term: u32,
    grades: GradeTable,
}

impl App {
    /// Load the dataset and resolve the evaluation term.
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        let grades = config.grade_table()?;

        let start = Instant::now();
        let data_dir = config.data_dir.clone();
        let normalize = config.normalize_ratings;
        let data = tokio::task::spawn_blocking(move || Dataset::load(&data_dir, normalize))
            .await
            .context("Dataset loading task failed")??;
        log_if_slow(start, config.slow_stage(), "load");

        if data.reviews.is_empty() {
            warn!(data_dir = %config.data_dir.display(), "No reviews found");
        }

        let evaluation_term = config.evaluation_term(&data)?;
        info!(
            evaluation_term,
            label = format_term_number(evaluation_term),
            reviews = data.reviews.len(),
            offerings = data.offerings.len(),
            "Dataset ready"
        );

        Ok(Self {
            config,
            data: Arc::new(data),
            evaluation_term,
            grades,
        })
    }

    pub fn evaluation_term(&self) -> u32 {
        self.evaluation_term
    }

    pub fn data(&self) -> &Arc<Dataset> {
        &self.data
    }

    /// Score, rank, and assemble reports for one kind of entity.
    pub async fn reports(
        &self,
        kind: EntityKind,
    ) -> Result<IndexMap<String, EntityReport>, anyhow::Error> {
        let policy = match kind {
            EntityKind::Instructor => self.config.instructor_confidence,
            EntityKind::Course => self.config.course_confidence,
        };
        let scorer = Arc::new(Scorer::new(kind, policy, Arc::clone(&self.data)));

        let start = Instant::now();
        let timelines = Arc::clone(&scorer)
            .timelines(self.evaluation_term)
            .await
            .with_context(|| format!("Failed to score {} timelines", kind.as_str()))?;
        log_if_slow(start, self.config.slow_stage(), "score");

        let start = Instant::now();
        let inputs = overall_inputs(
            &scorer,
            &timelines,
            self.evaluation_term,
            self.config.overall_method(),
        );
        let ranked = rank(&inputs, &self.grades)
            .with_context(|| format!("Failed to rank {}s", kind.as_str()))?;
        log_if_slow(start, self.config.slow_stage(), "rank");

        info!(
            kind = kind.as_str(),
            entities = timelines.len(),
            ranked = ranked.len(),
            unranked = timelines.len() - ranked.len(),
            "Ranking complete"
        );

        Ok(build_reports(
            &self.data,
            timelines,
            &ranked,
            self.evaluation_term,
        ))
    }

    pub fn output_path(&self, kind: EntityKind) -> PathBuf {
        self.config
            .output_dir
            .join(format!("data-{}.json", kind.as_str()))
    }

    /// Produce and write the report file for each requested kind.
    pub async fn run(&self, kinds: &[EntityKind]) -> Result<(), anyhow::Error> {
        for &kind in kinds {
            let start = Instant::now();
            let reports = self.reports(kind).await?;
            let path = self.output_path(kind);
            write_reports(&path, &reports)?;
            info!(
                kind = kind.as_str(),
                path = %path.display(),
                entities = reports.len(),
                duration = fmt_duration(start.elapsed()),
                "Report written"
            );
        }
        Ok(())
    }
}
