//! End-to-end tests for two-subject analysis.
//!
//! Points are tagged A or B at ingestion; the mixed-origin policy then
//! decides which matches survive.

use aspect_graph::{
    Analysis, AnalysisConfig, AspectKind, ComputedOffsets, MixedOrigin, Origin, OriginTagger,
    PatternCatalog, PatternMatcher, Point, Position, PrefixTagger, RawPoint, RawPosition,
    RelationGraph,
};
use pretty_assertions::assert_eq;

// ============================================================================
// Helpers
// ============================================================================

fn raw(layout: &[(&str, i64)]) -> Vec<RawPoint> {
    layout.iter()
        .map(|&(label, minutes)| RawPoint::new(label, RawPosition::Minutes(minutes)))
        .collect()
}

fn tuples(outcome: &aspect_graph::AnalysisOutcome, pattern: &str) -> Vec<Vec<String>> {
    outcome
        .patterns
        .matches(pattern)
        .iter()
        .map(|m| m.labels().to_vec())
        .collect()
}

/// Grand Trine inside A, with B's Venus opposite the Sun.
fn kite_chart() -> Vec<RawPoint> {
    raw(&[("A_sun", 0), ("A_moon", 7_200), ("A_mars", 14_400), ("B_venus", 10_800)])
}

// ============================================================================
// 1. Origin tagging
// ============================================================================

#[test]
fn test_prefixed_ingest_tags_origins() {
    let analysis = Analysis::synastry();
    let points = analysis.ingest_prefixed(raw(&[("A_sun", 0), ("B_moon", 60), ("node", 120)]));
    let origins: Vec<Origin> = points.iter().map(|p| p.origin).collect();
    assert_eq!(origins, vec![Origin::A, Origin::B, Origin::Unmarked]);
}

#[test]
fn test_custom_prefixes_from_config() {
    let config = AnalysisConfig::from_json_str(
        r#"{ "mixed_origin": "EveryOrigin", "origin_prefixes": { "a_prefix": "natal.", "b_prefix": "transit." } }"#,
    )
    .unwrap();
    let analysis = Analysis::new(config).unwrap();
    let points = analysis.ingest_prefixed(raw(&[
        ("natal.sun", 0),
        ("natal.moon", 7_200),
        ("transit.mars", 14_400),
    ]));
    let outcome = analysis.run(&points, &ComputedOffsets::default());
    assert_eq!(
        tuples(&outcome, "Grand Trine"),
        vec![vec!["natal.moon", "natal.sun", "transit.mars"]]
    );
}

// ============================================================================
// 2. Mixed-origin policies
// ============================================================================

#[test]
fn test_single_subject_pattern_is_filtered() {
    let analysis = Analysis::synastry();
    let points = analysis.ingest_prefixed(raw(&[("A_sun", 0), ("A_moon", 7_200), ("A_mars", 14_400)]));
    let outcome = analysis.run(&points, &ComputedOffsets::default());

    // the edges exist, the all-A triple does not survive
    assert_eq!(outcome.edges.len(), 3);
    assert!(outcome.patterns.is_empty());
}

#[test]
fn test_mixed_grand_trine_survives() {
    let analysis = Analysis::synastry();
    let points = analysis.ingest_prefixed(raw(&[("A_sun", 0), ("A_moon", 7_200), ("B_venus", 14_400)]));
    let outcome = analysis.run(&points, &ComputedOffsets::default());
    assert_eq!(tuples(&outcome, "Grand Trine"), vec![vec!["A_moon", "A_sun", "B_venus"]]);
}

#[test]
fn test_kite_on_single_subject_base() {
    let analysis = Analysis::synastry();
    let points = analysis.ingest_prefixed(kite_chart());
    let outcome = analysis.run(&points, &ComputedOffsets::default());

    // the all-A Grand Trine is filtered, so nothing extends it
    assert!(outcome.patterns.matches("Grand Trine").is_empty());
    assert!(outcome.patterns.matches("Kite").is_empty());
    assert_eq!(
        tuples(&outcome, "Minor Grand Trine"),
        vec![vec!["A_mars", "A_moon", "B_venus"]]
    );
}

#[test]
fn test_kite_on_mixed_base() {
    let analysis = Analysis::synastry();
    let points = analysis.ingest_prefixed(raw(&[
        ("A_sun", 0),
        ("A_moon", 7_200),
        ("B_mars", 14_400),
        ("B_venus", 10_800),
    ]));
    let outcome = analysis.run(&points, &ComputedOffsets::default());

    assert_eq!(tuples(&outcome, "Grand Trine"), vec![vec!["A_moon", "A_sun", "B_mars"]]);
    assert_eq!(
        tuples(&outcome, "Kite"),
        vec![vec!["A_moon", "A_sun", "B_mars", "B_venus"]]
    );
}

#[test]
fn test_partial_trines_to_b_point() {
    let mut graph = RelationGraph::new();
    for label in ["A_sun", "A_moon", "A_mars", "B_venus"] {
        let origin = PrefixTagger::default().origin_of(label);
        graph.register(&Point::new(label, Position::new(0).unwrap()).with_origin(origin));
    }
    for (a, b) in [
        ("A_sun", "A_moon"),
        ("A_moon", "A_mars"),
        ("A_sun", "A_mars"),
        ("B_venus", "A_sun"),
        ("B_venus", "A_mars"),
    ] {
        graph.add(a, b, AspectKind::Trine, 0.0);
    }

    let matches = PatternMatcher::new(&graph, MixedOrigin::EveryOrigin)
        .match_named(&PatternCatalog::standard(), "Grand Trine")
        .unwrap();
    let found: Vec<Vec<String>> = matches.into_iter().map(|m| m.0).collect();

    // the all-A triple is filtered, A_moon never closes a triangle with B_venus
    assert_eq!(found, vec![vec!["A_mars", "A_sun", "B_venus"]]);
    assert!(found.iter().all(|t| !t.iter().any(|l| l == "A_moon")));
}

#[test]
fn test_unmarked_points_never_satisfy_every_origin() {
    let analysis = Analysis::synastry();
    let points: Vec<Point> = [("sun", 0u16), ("moon", 7_200), ("venus", 14_400)]
        .iter()
        .map(|&(label, m)| Point::new(label, Position::new(m).unwrap()))
        .collect();
    let outcome = analysis.run(&points, &ComputedOffsets::default());
    assert!(outcome.patterns.is_empty());
}

#[test]
fn test_contains_policy() {
    let config = AnalysisConfig::from_json_str(r#"{ "mixed_origin": { "Contains": "B" } }"#).unwrap();
    assert_eq!(config.mixed_origin, MixedOrigin::Contains(Origin::B));
    let analysis = Analysis::new(config).unwrap();
    let points = analysis.ingest_prefixed(kite_chart());
    let outcome = analysis.run(&points, &ComputedOffsets::default());

    assert!(outcome.patterns.matches("Grand Trine").is_empty());
    assert!(outcome.patterns.matches("Kite").is_empty());
    assert_eq!(outcome.patterns.matches("Minor Grand Trine").len(), 1);
}

#[test]
fn test_policy_off_keeps_everything() {
    let analysis = Analysis::single_chart();
    let points = analysis.ingest_prefixed(kite_chart());
    let outcome = analysis.run(&points, &ComputedOffsets::default());

    assert_eq!(
        tuples(&outcome, "Grand Trine"),
        vec![vec!["A_mars", "A_moon", "A_sun"]]
    );
    assert_eq!(outcome.patterns.matches("Kite").len(), 1);
}
