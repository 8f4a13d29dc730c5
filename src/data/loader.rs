//! Ingestion of raw review and offering dumps into the in-memory stores.
//!
//! Layout under the data directory:
//!
//! ```text
//! reviews/**/*.json      { course, reviews: [...] } per course
//! offerings/terms.json   [{ term, termName }]
//! offerings/<term>.json  [{ subject, number, classes: [{ schedule: [{ instructors }] }] }]
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::json::parse_json_with_context;
use super::offerings::{Offering, OfferingCatalog};
use super::reviews::{Review, ReviewStore, normalize_ratings};
use crate::terms::Term;
use crate::utils::fmt_duration;

#[derive(Debug, Deserialize)]
struct RawReviewFile {
    course: RawCourse,
    reviews: Vec<RawReview>,
}

#[derive(Debug, Deserialize)]
struct RawCourse {
    subject: String,
    code: String,
}

#[derive(Debug, Deserialize)]
struct RawReview {
    hash: String,
    semester: String,
    instructors: Vec<RawInstructor>,
    rating_content: f64,
    rating_teaching: f64,
    rating_grading: f64,
    rating_workload: f64,
    upvote_count: u32,
    /// Total votes cast, up and down.
    vote_count: u32,
}

#[derive(Debug, Deserialize)]
struct RawInstructor {
    name: String,
    rating: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTerm {
    term: String,
    term_name: String,
}

#[derive(Debug, Deserialize)]
struct RawOfferedCourse {
    subject: String,
    number: String,
    #[serde(default)]
    classes: Vec<RawClass>,
}

#[derive(Debug, Deserialize)]
struct RawClass {
    #[serde(default)]
    schedule: Vec<RawSchedule>,
}

#[derive(Debug, Deserialize)]
struct RawSchedule {
    #[serde(default)]
    instructors: Vec<String>,
}

/// Everything the scoring phase reads, loaded before it starts.
#[derive(Debug, Default)]
pub struct Dataset {
    pub reviews: ReviewStore,
    pub offerings: OfferingCatalog,
}

impl Dataset {
    pub fn load(data_dir: &Path, normalize: bool) -> Result<Self> {
        let offerings = load_offerings(&data_dir.join("offerings"))?;
        let mut rows = load_reviews(&data_dir.join("reviews"))?;
        if normalize {
            let start = Instant::now();
            normalize_ratings(&mut rows);
            info!(
                count = rows.len(),
                duration = fmt_duration(start.elapsed()),
                "Normalized review ratings"
            );
        }
        Ok(Self {
            reviews: ReviewStore::new(rows),
            offerings,
        })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    parse_json_with_context(&body).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load every review file under `dir`, one row per named instructor.
pub fn load_reviews(dir: &Path) -> Result<Vec<Review>> {
    let start = Instant::now();

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.with_context(|| format!("Failed to walk {}", dir.display()))?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|e| e == "json") {
            files.push(entry.into_path());
        }
    }
    files.sort();

    let mut rows = Vec::new();
    for file in &files {
        let raw: RawReviewFile = read_json(file)?;
        let before = rows.len();
        expand_review_file(raw, &mut rows)
            .with_context(|| format!("Invalid review data in {}", file.display()))?;
        debug!(file = %file.display(), rows = rows.len() - before, "Loaded review file");
    }

    info!(
        files = files.len(),
        count = rows.len(),
        duration = fmt_duration(start.elapsed()),
        "Loaded reviews"
    );
    Ok(rows)
}

fn expand_review_file(raw: RawReviewFile, rows: &mut Vec<Review>) -> Result<()> {
    let RawReviewFile { course, reviews } = raw;
    for review in reviews {
        let term = Term::from_label(&review.semester)?;
        let downvotes = review.vote_count.saturating_sub(review.upvote_count);
        for instructor in &review.instructors {
            rows.push(Review {
                hash: review.hash.clone(),
                term: term.code(),
                term_name: review.semester.clone(),
                term_number: term.number(),
                subject: course.subject.clone(),
                number: course.code.clone(),
                instructor: instructor.name.clone(),
                rating_content: review.rating_content,
                rating_teaching: review.rating_teaching,
                rating_grading: review.rating_grading,
                rating_workload: review.rating_workload,
                rating_instructor: instructor.rating,
                upvote_count: review.upvote_count,
                downvote_count: downvotes,
            });
        }
    }
    Ok(())
}

/// Load the offering catalog from `dir`. A missing directory yields an empty catalog.
pub fn load_offerings(dir: &Path) -> Result<OfferingCatalog> {
    let start = Instant::now();
    let index = dir.join("terms.json");
    if !index.exists() {
        warn!(
            path = %index.display(),
            "No offering index found; every course roster will be empty"
        );
        return Ok(OfferingCatalog::default());
    }

    let terms: Vec<RawTerm> = read_json(&index)?;
    let mut offerings = Vec::new();
    for raw_term in &terms {
        let term_number = Term::from_code(&raw_term.term)
            .with_context(|| format!("Invalid term code in {}", index.display()))?
            .number();
        let courses: Vec<RawOfferedCourse> =
            read_json(&dir.join(format!("{}.json", raw_term.term)))?;
        offerings.extend(courses.into_iter().map(|course| Offering {
            term: raw_term.term.clone(),
            term_name: raw_term.term_name.clone(),
            term_number,
            subject: course.subject,
            number: course.number,
            instructors: course
                .classes
                .into_iter()
                .flat_map(|c| c.schedule)
                .flat_map(|s| s.instructors)
                .collect(),
        }));
    }

    let catalog = OfferingCatalog::new(offerings);
    info!(
        terms = terms.len(),
        count = catalog.len(),
        duration = fmt_duration(start.elapsed()),
        "Loaded offerings"
    );
    Ok(catalog)
}
