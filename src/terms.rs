//! Academic term arithmetic.
//!
//! Terms are encoded as a monotonic integer so recency can be computed by
//! subtraction: four terms per academic year, starting from [`EPOCH_YEAR`].
//! Two textual forms are understood:
//!
//! - labels such as `"2023-24 Spring"`
//! - four-digit codes such as `"2330"` (`YY` + season digit)

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// First academic year representable as a term number.
pub const EPOCH_YEAR: u32 = 2000;

/// Last academic year whose term numbers all fit in a `u32`.
pub const MAX_YEAR: u32 = EPOCH_YEAR + u32::MAX / TERMS_PER_YEAR;

/// Number of terms in one academic year.
pub const TERMS_PER_YEAR: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TermError {
    #[error("unrecognized term format: {0:?}")]
    Malformed(String),
    #[error("unknown season {season:?} in term {term:?}")]
    UnknownSeason { term: String, season: String },
    #[error("invalid academic year in term {0:?}")]
    InvalidYear(String),
    #[error("academic year {0} precedes the {epoch} epoch", epoch = EPOCH_YEAR)]
    BeforeEpoch(u32),
    #[error("academic year {0} is past {max}", max = MAX_YEAR)]
    PastRange(u32),
}

/// Season within an academic year, in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Season {
    Fall,
    Winter,
    Spring,
    Summer,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Fall, Season::Winter, Season::Spring, Season::Summer];

    /// Position within the academic year (`0..=3`).
    pub fn index(self) -> u32 {
        match self {
            Self::Fall => 0,
            Self::Winter => 1,
            Self::Spring => 2,
            Self::Summer => 3,
        }
    }

    fn from_index(index: u32) -> Self {
        Self::ALL[(index % TERMS_PER_YEAR) as usize]
    }

    /// Digit used in four-digit term codes (`1..=4`).
    fn code_digit(self) -> u32 {
        self.index() + 1
    }

    fn from_code_digit(digit: char) -> Option<Self> {
        match digit {
            '1' => Some(Self::Fall),
            '2' => Some(Self::Winter),
            '3' => Some(Self::Spring),
            '4' => Some(Self::Summer),
            _ => None,
        }
    }

    fn from_label(s: &str) -> Option<Self> {
        match s {
            "Fall" => Some(Self::Fall),
            "Winter" => Some(Self::Winter),
            "Spring" => Some(Self::Spring),
            "Summer" => Some(Self::Summer),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fall => "Fall",
            Self::Winter => "Winter",
            Self::Spring => "Spring",
            Self::Summer => "Summer",
        }
    }

    /// Whether two term numbers fall in the same season of their academic years.
    pub fn same_season(a: u32, b: u32) -> bool {
        a % TERMS_PER_YEAR == b % TERMS_PER_YEAR
    }
}

/// An academic term: the starting calendar year of the academic year plus a season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Term {
    pub year: u32,
    pub season: Season,
}

impl Term {
    pub fn new(year: u32, season: Season) -> Result<Self, TermError> {
        if year < EPOCH_YEAR {
            return Err(TermError::BeforeEpoch(year));
        }
        if year > MAX_YEAR {
            return Err(TermError::PastRange(year));
        }
        Ok(Self { year, season })
    }

    pub fn number(self) -> u32 {
        (self.year - EPOCH_YEAR) * TERMS_PER_YEAR + self.season.index()
    }

    /// Inverse of [`Term::number`]; every `u32` maps to a year in
    /// `EPOCH_YEAR..=MAX_YEAR`.
    pub fn from_number(number: u32) -> Self {
        Self {
            year: EPOCH_YEAR + number / TERMS_PER_YEAR,
            season: Season::from_index(number),
        }
    }

    /// Last two digits of the calendar year the academic year ends in.
    fn end_year_suffix(self) -> u32 {
        (self.year % 100 + 1) % 100
    }

    /// Four-digit code, e.g. `"2330"` for 2023-24 Spring.
    pub fn code(self) -> String {
        format!("{:02}{}0", self.year % 100, self.season.code_digit())
    }

    /// Parse a label of the form `"2023-24 Spring"`.
    pub fn from_label(label: &str) -> Result<Self, TermError> {
        let (years, season_str) = label
            .trim()
            .split_once(' ')
            .ok_or_else(|| TermError::Malformed(label.to_string()))?;
        let (start, end) = years
            .split_once('-')
            .ok_or_else(|| TermError::Malformed(label.to_string()))?;

        let year: u32 = start
            .parse()
            .map_err(|_| TermError::InvalidYear(label.to_string()))?;
        let end: u32 = end
            .parse()
            .map_err(|_| TermError::InvalidYear(label.to_string()))?;
        if end != (year % 100 + 1) % 100 {
            return Err(TermError::InvalidYear(label.to_string()));
        }

        let season = Season::from_label(season_str.trim()).ok_or_else(|| {
            TermError::UnknownSeason {
                term: label.to_string(),
                season: season_str.to_string(),
            }
        })?;
        Self::new(year, season)
    }

    /// Parse a four-digit code of the form `"2330"`; the last digit is always `0`.
    pub fn from_code(code: &str) -> Result<Self, TermError> {
        let code = code.trim();
        if code.len() != 4 || !code.chars().all(|c| c.is_ascii_digit()) || !code.ends_with('0') {
            return Err(TermError::Malformed(code.to_string()));
        }
        let yy: u32 = code[..2]
            .parse()
            .map_err(|_| TermError::InvalidYear(code.to_string()))?;
        let digit = code[2..3].chars().next().unwrap_or('0');
        let season = Season::from_code_digit(digit).ok_or_else(|| TermError::UnknownSeason {
            term: code.to_string(),
            season: digit.to_string(),
        })?;
        Self::new(EPOCH_YEAR + yy, season)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{:02} {}",
            self.year,
            self.end_year_suffix(),
            self.season.as_str()
        )
    }
}

impl FromStr for Term {
    type Err = TermError;

    /// Accepts either a label or a four-digit code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().contains(' ') {
            Self::from_label(s)
        } else {
            Self::from_code(s)
        }
    }
}

/// Map a term label (or code) to its term number.
pub fn parse_semester_label(label: &str) -> Result<u32, TermError> {
    label.parse::<Term>().map(Term::number)
}

/// Map a term number back to its label.
pub fn format_term_number(number: u32) -> String {
    Term::from_number(number).to_string()
}
