//! Descriptive context attached to each scored entity.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::data::{CourseKey, Dataset};
use crate::scoring::EntityId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InstructorExtras {
    /// Every course the instructor has been reviewed for.
    pub historical_courses: Vec<CourseKey>,
    /// Courses the instructor is scheduled to teach at the evaluation term.
    pub courses: Vec<CourseKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CourseExtras {
    /// Terms with a review or an offering, ascending.
    pub terms: Vec<u32>,
    /// Instructors scheduled at the evaluation term.
    pub instructors: Vec<String>,
    /// Everyone reviewed for this course.
    pub historical_instructors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum Extras {
    Instructor(InstructorExtras),
    Course(CourseExtras),
}

pub fn extras_of(data: &Dataset, entity: &EntityId, evaluation_term: u32) -> Extras {
    match entity {
        EntityId::Instructor { instructor } => {
            let historical: BTreeSet<CourseKey> = data
                .reviews
                .instructor_reviews(instructor)
                .iter()
                .map(|r| r.course())
                .collect();
            Extras::Instructor(InstructorExtras {
                historical_courses: historical.into_iter().collect(),
                courses: data.offerings.courses_taught_by(instructor, evaluation_term),
            })
        }
        EntityId::Course { subject, number } => {
            let course = CourseKey::new(subject, number);
            let reviews = data.reviews.course_reviews(&course);

            let mut terms = data.offerings.terms_of(&course);
            terms.extend(reviews.iter().map(|r| r.term_number));
            let historical: BTreeSet<&str> =
                reviews.iter().map(|r| r.instructor.as_str()).collect();

            Extras::Course(CourseExtras {
                terms: terms.into_iter().collect(),
                instructors: data.offerings.roster(&course, evaluation_term).to_vec(),
                historical_instructors: historical.into_iter().map(str::to_string).collect(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::reviews::tests::review;
    use crate::data::{Offering, OfferingCatalog, ReviewStore};

    fn data() -> Dataset {
        Dataset {
            reviews: ReviewStore::new(vec![
                review("LEE", ("MATH", "1013"), 10),
                review("LEE", ("COMP", "2011"), 11),
                review("WONG", ("COMP", "2011"), 12),
            ]),
            offerings: OfferingCatalog::new([Offering {
                term: String::new(),
                term_name: String::new(),
                term_number: 14,
                subject: "COMP".to_string(),
                number: "2011".to_string(),
                instructors: vec!["LEE".to_string()],
            }]),
        }
    }

    #[test]
    fn test_instructor_extras() {
        let Extras::Instructor(extras) = extras_of(&data(), &EntityId::instructor("LEE"), 14)
        else {
            panic!("expected instructor extras");
        };
        assert_eq!(
            extras.historical_courses,
            vec![CourseKey::new("COMP", "2011"), CourseKey::new("MATH", "1013")]
        );
        assert_eq!(extras.courses, vec![CourseKey::new("COMP", "2011")]);
    }

    #[test]
    fn test_course_extras() {
        let course = EntityId::course(&CourseKey::new("COMP", "2011"));
        let Extras::Course(extras) = extras_of(&data(), &course, 14) else {
            panic!("expected course extras");
        };
        assert_eq!(extras.terms, vec![11, 12, 14]);
        assert_eq!(extras.instructors, vec!["LEE"]);
        assert_eq!(extras.historical_instructors, vec!["LEE", "WONG"]);
    }
}
