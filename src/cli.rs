use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::scoring::EntityKind;

/// Confidence-weighted instructor and course scorecards
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// TOML file merged over the built-in defaults
    #[arg(long, short, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log formatter
    #[arg(long, value_enum, default_value_t = default_tracing_format())]
    pub tracing: TracingFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Score and rank instructors
    Instructors,
    /// Score and rank courses
    Courses,
    /// Score and rank both
    All,
}

impl Command {
    pub fn kinds(self) -> &'static [EntityKind] {
        match self {
            Self::Instructors => &[EntityKind::Instructor],
            Self::Courses => &[EntityKind::Course],
            Self::All => &[EntityKind::Instructor, EntityKind::Course],
        }
    }
}

impl Args {
    pub fn kinds(&self) -> &'static [EntityKind] {
        self.command.unwrap_or(Command::All).kinds()
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable output
    Pretty,
    /// One JSON object per event
    Json,
}

const fn default_tracing_format() -> TracingFormat {
    if cfg!(debug_assertions) {
        TracingFormat::Pretty
    } else {
        TracingFormat::Json
    }
}
