//! Numeric properties of the scoring primitives.

use proptest::prelude::*;

use scorecard::data::Review;
use scorecard::ranking::{GradeTable, RankInput, competition_ranks, rank};
use scorecard::scoring::{
    ConfidencePolicy, EntityId, RecencyDecay, ScoringContext, shrink, weighted_mean,
};

fn review(instructor: &str, term_number: u32, upvotes: u32, downvotes: u32) -> Review {
    Review {
        hash: String::new(),
        term: String::new(),
        term_name: String::new(),
        term_number,
        subject: "COMP".to_string(),
        number: "2011".to_string(),
        instructor: instructor.to_string(),
        rating_content: 3.0,
        rating_teaching: 3.0,
        rating_grading: 3.0,
        rating_workload: 3.0,
        rating_instructor: 3.0,
        upvote_count: upvotes,
        downvote_count: downvotes,
    }
}

proptest! {
    #[test]
    fn confidence_is_positive(
        term in 0u32..200,
        age in 0u32..200,
        up in 0u32..500,
        down in 0u32..500,
        on_roster in any::<bool>(),
    ) {
        let now = term + age;
        let roster = if on_roster { vec!["LEE".to_string()] } else { Vec::new() };
        let r = review("LEE", term, up, down);
        for policy in [ConfidencePolicy::instructor(), ConfidencePolicy::course()] {
            let w = policy.confidence(&r, &ScoringContext::with_roster(now, &roster));
            prop_assert!(w > 0.0 && w.is_finite(), "weight {w}");
        }
    }

    #[test]
    fn decay_never_increases_with_age(grace in 0u32..12, a in 0i64..400, b in 0i64..400) {
        let decay = RecencyDecay { grace_terms: grace, yearly_discount: 0.25 };
        let (young, old) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(decay.factor(young) >= decay.factor(old));
        prop_assert!(decay.factor(old) <= 1.0);
    }

    #[test]
    fn weighted_mean_within_bounds(
        pairs in prop::collection::vec((-5.0f64..5.0, 0.01f64..10.0), 1..50),
    ) {
        let (values, weights): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        let mean = weighted_mean(&values, &weights).unwrap();
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(mean >= lo - 1e-9 && mean <= hi + 1e-9);
    }

    #[test]
    fn shrink_between_entity_and_population(
        m in -5.0f64..5.0,
        c in 0.0f64..100.0,
        p in -5.0f64..5.0,
        c_bar in 0.01f64..100.0,
    ) {
        let s = shrink(m, c, p, c_bar);
        prop_assert!(s >= m.min(p) - 1e-9 && s <= m.max(p) + 1e-9);
    }

    #[test]
    fn percentiles_follow_ranks(
        entries in prop::collection::vec((0.0f64..5.0, 1usize..30), 1..40),
    ) {
        let inputs: Vec<RankInput> = entries
            .iter()
            .enumerate()
            .map(|(i, &(overall, samples))| RankInput {
                entity: EntityId::instructor(format!("I{i:03}")),
                overall_rating: Some(overall),
                samples,
            })
            .collect();
        let ranked = rank(&inputs, &GradeTable::default()).unwrap();
        prop_assert_eq!(ranked.len(), inputs.len());
        prop_assert_eq!(ranked[0].rank, 1);
        prop_assert_eq!(ranked[0].percentile, 1.0);
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
            prop_assert!(pair[0].rank <= pair[1].rank);
            prop_assert!(pair[0].percentile >= pair[1].percentile);
        }
        let scores: Vec<f64> = ranked.iter().map(|r| r.score).collect();
        let ranks: Vec<usize> = ranked.iter().map(|r| r.rank).collect();
        prop_assert_eq!(ranks, competition_ranks(&scores));
    }
}
