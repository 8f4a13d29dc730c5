//! Catalog of scheduled course offerings per term.
//!
//! Only the instructor roster matters to scoring: a course review weighs more
//! when its instructor is teaching the course again at the evaluation term.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::reviews::CourseKey;

/// One course scheduled in one term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offering {
    pub term: String,
    pub term_name: String,
    pub term_number: u32,
    pub subject: String,
    pub number: String,
    pub instructors: Vec<String>,
}

impl Offering {
    pub fn course(&self) -> CourseKey {
        CourseKey::new(&self.subject, &self.number)
    }
}

/// Read-only offering lookup keyed by `(course, term_number)`.
///
/// Duplicate offerings of a course within a term are merged; their rosters
/// are unioned and sorted.
#[derive(Debug, Default)]
pub struct OfferingCatalog {
    offerings: BTreeMap<(CourseKey, u32), Offering>,
}

impl OfferingCatalog {
    pub fn new(offerings: impl IntoIterator<Item = Offering>) -> Self {
        let mut merged: BTreeMap<(CourseKey, u32), Offering> = BTreeMap::new();
        for offering in offerings {
            let key = (offering.course(), offering.term_number);
            match merged.get_mut(&key) {
                Some(existing) => existing.instructors.extend(offering.instructors),
                None => {
                    merged.insert(key, offering);
                }
            }
        }
        for offering in merged.values_mut() {
            offering.instructors.sort();
            offering.instructors.dedup();
        }
        Self { offerings: merged }
    }

    pub fn len(&self) -> usize {
        self.offerings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offerings.is_empty()
    }

    pub fn find(&self, course: &CourseKey, term_number: u32) -> Option<&Offering> {
        self.offerings.get(&(course.clone(), term_number))
    }

    /// Instructors scheduled to teach `course` at `term_number`.
    ///
    /// A course with no offering that term has an empty roster.
    pub fn roster(&self, course: &CourseKey, term_number: u32) -> &[String] {
        self.find(course, term_number)
            .map(|o| o.instructors.as_slice())
            .unwrap_or_default()
    }

    /// Courses whose roster at `term_number` includes `instructor`, sorted.
    pub fn courses_taught_by(&self, instructor: &str, term_number: u32) -> Vec<CourseKey> {
        self.offerings
            .iter()
            .filter(|((_, term), o)| {
                *term == term_number && o.instructors.iter().any(|i| i == instructor)
            })
            .map(|((course, _), _)| course.clone())
            .collect()
    }

    /// Terms in which `course` was offered, ascending.
    pub fn terms_of(&self, course: &CourseKey) -> BTreeSet<u32> {
        self.offerings
            .keys()
            .filter(|(c, _)| c == course)
            .map(|(_, term)| *term)
            .collect()
    }

    pub fn latest_term_number(&self) -> Option<u32> {
        self.offerings.keys().map(|(_, term)| *term).max()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offering(course: (&str, &str), term_number: u32, instructors: &[&str]) -> Offering {
        Offering {
            term: String::new(),
            term_name: String::new(),
            term_number,
            subject: course.0.to_string(),
            number: course.1.to_string(),
            instructors: instructors.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_roster_merges_duplicates() {
        let catalog = OfferingCatalog::new([
            offering(("COMP", "2011"), 94, &["WONG", "LEE"]),
            offering(("COMP", "2011"), 94, &["LEE", "CHAN"]),
        ]);
        let course = CourseKey::new("COMP", "2011");
        assert_eq!(catalog.roster(&course, 94), ["CHAN", "LEE", "WONG"]);
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_roster_miss_is_empty() {
        let catalog = OfferingCatalog::new([offering(("COMP", "2011"), 94, &["LEE"])]);
        assert!(catalog.roster(&CourseKey::new("COMP", "2011"), 93).is_empty());
        assert!(catalog.roster(&CourseKey::new("MATH", "1013"), 94).is_empty());
    }

    #[test]
    fn test_instructor_and_term_lookups() {
        let catalog = OfferingCatalog::new([
            offering(("COMP", "2011"), 93, &["LEE"]),
            offering(("COMP", "2011"), 94, &["LEE"]),
            offering(("MATH", "1013"), 94, &["LEE", "WONG"]),
        ]);
        assert_eq!(
            catalog.courses_taught_by("LEE", 94),
            vec![CourseKey::new("COMP", "2011"), CourseKey::new("MATH", "1013")]
        );
        assert_eq!(
            catalog.terms_of(&CourseKey::new("COMP", "2011")),
            BTreeSet::from([93, 94])
        );
        assert_eq!(catalog.latest_term_number(), Some(94));
    }
}
