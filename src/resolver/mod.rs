//! # Aspect Resolver
//!
//! Classifies the angular relationship between two positions.
//!
//! ```text
//! d = circular_distance(p1, p2)
//! d <= conjunction tolerance  → Conjunction, stop
//! otherwise, per family:        target = lookup_target(p1, variant)
//!                               delta  = circular_distance(target, p2)
//!                               delta <= tolerance → emit family
//! ```
//!
//! The offset table is the seam to the external reference sheet. A family
//! whose columns are all missing is skipped for the whole run.

pub mod offsets;

use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::graph::RelationGraph;
use crate::model::*;

pub use offsets::{ComputedOffsets, SparseOffsetTable};

// ============================================================================
// OffsetTable trait
// ============================================================================

/// Position → target lookup, one column per aspect variant.
///
/// `None` from `lookup_target` means "no match for this variant here",
/// never an error.
pub trait OffsetTable {
    fn lookup_target(&self, position: Position, column: &str) -> Option<Position>;

    fn has_column(&self, column: &str) -> bool;
}

// ============================================================================
// Resolved aspect
// ============================================================================

/// One aspect found between two positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAspect {
    pub kind: AspectKind,
    /// Deviation from exact, minute units.
    pub orb_minutes: u16,
}

impl ResolvedAspect {
    /// Orb in degrees.
    pub fn orb(&self) -> f64 {
        self.orb_minutes as f64 / 60.0
    }
}

/// Most pairs resolve to zero or one aspect.
pub type Resolved = SmallVec<[ResolvedAspect; 2]>;

struct ActiveFamily {
    definition: AspectDefinition,
    variants: SmallVec<[AspectVariant; 2]>,
}

// ============================================================================
// AspectResolver
// ============================================================================

pub struct AspectResolver<'t> {
    table: &'t dyn OffsetTable,
    conjunction_tolerance: u16,
    families: Vec<ActiveFamily>,
    skipped: Vec<AspectKind>,
}

impl<'t> AspectResolver<'t> {
    /// Bind an aspect table to an offset table. Families are enumerated once
    /// here; columns absent from `table` are dropped up front.
    pub fn new(aspects: &AspectTable, table: &'t dyn OffsetTable) -> Self {
        let mut families = Vec::new();
        let mut skipped = Vec::new();

        for definition in aspects.families() {
            let variants: SmallVec<[AspectVariant; 2]> = definition
                .variants()
                .into_iter()
                .filter(|v| table.has_column(&v.column))
                .collect();

            if variants.is_empty() {
                warn!(aspect = %definition.kind, "offset table has no column for aspect family; skipping");
                skipped.push(definition.kind);
                continue;
            }
            families.push(ActiveFamily { definition: *definition, variants });
        }

        Self {
            table,
            conjunction_tolerance: aspects.conjunction_tolerance(),
            families,
            skipped,
        }
    }

    /// Families skipped because the offset table lacks their columns.
    pub fn skipped(&self) -> &[AspectKind] {
        &self.skipped
    }

    /// Aspects holding from `p1` to `p2`.
    pub fn resolve(&self, p1: Position, p2: Position) -> Resolved {
        let mut found = Resolved::new();

        let d = circular_distance(p1, p2);
        if d <= self.conjunction_tolerance {
            found.push(ResolvedAspect { kind: AspectKind::Conjunction, orb_minutes: d });
            return found;
        }

        for family in &self.families {
            // tightest variant wins; one emission per family
            let best = family
                .variants
                .iter()
                .filter_map(|v| self.table.lookup_target(p1, &v.column))
                .map(|target| circular_distance(target, p2))
                .min();

            if let Some(delta) = best {
                if delta <= family.definition.orb_tolerance {
                    found.push(ResolvedAspect { kind: family.definition.kind, orb_minutes: delta });
                }
            }
        }
        found
    }

    /// Resolve every unordered pair of `points`, in input order.
    pub fn resolve_points(&self, points: &[Point]) -> Vec<AspectEdge> {
        let mut edges = Vec::new();
        for (i, a) in points.iter().enumerate() {
            for b in &points[i + 1..] {
                for r in self.resolve(a.position, b.position) {
                    edges.push(AspectEdge::new(a.label.clone(), b.label.clone(), r.kind, r.orb()));
                }
            }
        }
        debug!(points = points.len(), edges = edges.len(), "resolved aspects");
        edges
    }

    /// Register `points` in `graph` and add every resolved aspect.
    /// Returns the number of edges actually inserted (after dedup).
    pub fn populate(&self, points: &[Point], graph: &mut RelationGraph) -> usize {
        for p in points {
            graph.register(p);
        }
        self.resolve_points(points)
            .into_iter()
            .filter(|e| graph.add(&e.a, &e.b, e.aspect, e.orb))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pos(m: u16) -> Position {
        Position::new(m).unwrap()
    }

    fn kinds(r: &Resolved) -> Vec<AspectKind> {
        r.iter().map(|a| a.kind).collect()
    }

    #[test]
    fn test_conjunction_is_exclusive() {
        let offsets = ComputedOffsets::default();
        let resolver = AspectResolver::new(&AspectTable::canonical(), &offsets);
        let r = resolver.resolve(pos(100), pos(400));
        assert_eq!(kinds(&r), vec![AspectKind::Conjunction]);
        assert_eq!(r[0].orb_minutes, 300);
        assert_eq!(r[0].orb(), 5.0);
    }

    #[test]
    fn test_trine_either_direction() {
        let offsets = ComputedOffsets::default();
        let resolver = AspectResolver::new(&AspectTable::canonical(), &offsets);
        // 117° forward and 117° backward
        assert_eq!(kinds(&resolver.resolve(pos(0), pos(7_020))), vec![AspectKind::Trine]);
        assert_eq!(kinds(&resolver.resolve(pos(0), pos(21_600 - 7_020))), vec![AspectKind::Trine]);
        assert_eq!(resolver.resolve(pos(0), pos(7_020))[0].orb(), 3.0);
    }

    #[test]
    fn test_variants_share_one_band() {
        let offsets = ComputedOffsets::default();
        let table = AspectTable::canonical().with_tolerance(AspectKind::Trine, 120);
        let resolver = AspectResolver::new(&table, &offsets);
        // 122° on either side, from either point
        for (a, b) in [(0, 7_320), (7_320, 0), (0, 14_280), (14_280, 0)] {
            let r = resolver.resolve(pos(a), pos(b));
            assert_eq!(kinds(&r), vec![AspectKind::Trine], "{a} -> {b}");
            assert_eq!(r[0].orb_minutes, 120);
        }
        for (a, b) in [(0, 7_321), (7_321, 0), (0, 14_279), (14_279, 0)] {
            assert!(resolver.resolve(pos(a), pos(b)).is_empty(), "{a} -> {b}");
        }
    }

    #[test]
    fn test_outside_every_band() {
        let offsets = ComputedOffsets::default();
        let resolver = AspectResolver::new(&AspectTable::canonical(), &offsets);
        // 20° matches nothing
        assert!(resolver.resolve(pos(0), pos(1_200)).is_empty());
    }

    #[test]
    fn test_orb_boundary_inclusive() {
        let offsets = ComputedOffsets::default();
        let resolver = AspectResolver::new(&AspectTable::canonical(), &offsets);
        assert_eq!(kinds(&resolver.resolve(pos(0), pos(3_600 + 240))), vec![AspectKind::Sextile]);
        assert!(resolver.resolve(pos(0), pos(3_600 + 241)).is_empty());
        assert_eq!(kinds(&resolver.resolve(pos(0), pos(480))), vec![AspectKind::Conjunction]);
    }

    #[test]
    fn test_missing_columns_skip_family() {
        let offsets = ComputedOffsets::default()
            .without_column("Trine1")
            .without_column("Trine2");
        let resolver = AspectResolver::new(&AspectTable::canonical(), &offsets);
        assert_eq!(resolver.skipped(), &[AspectKind::Trine]);
        assert!(resolver.resolve(pos(0), pos(7_200)).is_empty());
        assert_eq!(kinds(&resolver.resolve(pos(0), pos(5_400))), vec![AspectKind::Square]);
    }

    #[test]
    fn test_single_variant_column_still_resolves_one_side() {
        let offsets = ComputedOffsets::default().without_column("Square2");
        let resolver = AspectResolver::new(&AspectTable::canonical(), &offsets);
        assert!(resolver.skipped().is_empty());
        assert_eq!(kinds(&resolver.resolve(pos(0), pos(5_400))), vec![AspectKind::Square]);
        assert!(resolver.resolve(pos(0), pos(21_600 - 5_400)).is_empty());
    }

    #[test]
    fn test_sparse_table_absent_cell_is_no_match() {
        let mut sparse = SparseOffsetTable::new();
        sparse.insert("Trine1", pos(0), pos(7_200)).unwrap();
        let resolver = AspectResolver::new(&AspectTable::only(&[AspectKind::Trine]), &sparse);
        assert_eq!(kinds(&resolver.resolve(pos(0), pos(7_200))), vec![AspectKind::Trine]);
        assert!(resolver.resolve(pos(60), pos(7_260)).is_empty());
    }

    #[test]
    fn test_populate_dedups_and_registers() {
        let offsets = ComputedOffsets::default();
        let resolver = AspectResolver::new(&AspectTable::canonical(), &offsets);
        let points = vec![
            Point::new("A_sun", pos(0)).with_origin(Origin::A),
            Point::new("B_moon", pos(7_200)).with_origin(Origin::B),
        ];
        let mut graph = RelationGraph::new();
        assert_eq!(resolver.populate(&points, &mut graph), 1);
        assert_eq!(resolver.populate(&points, &mut graph), 0);
        assert_eq!(graph.origin("B_moon"), Some(Origin::B));
    }

    proptest! {
        #[test]
        fn prop_resolution_is_symmetric(a in 0u16..FULL_CIRCLE, b in 0u16..FULL_CIRCLE) {
            let offsets = ComputedOffsets::default();
            let resolver = AspectResolver::new(&AspectTable::canonical(), &offsets);
            prop_assert_eq!(resolver.resolve(pos(a), pos(b)), resolver.resolve(pos(b), pos(a)));
        }

        #[test]
        fn prop_conjunction_excludes_everything_else(a in 0u16..FULL_CIRCLE, d in 0u16..=480) {
            let offsets = ComputedOffsets::default();
            let resolver = AspectResolver::new(&AspectTable::canonical(), &offsets);
            let r = resolver.resolve(pos(a), pos(a).rotate(d));
            prop_assert_eq!(kinds(&r), vec![AspectKind::Conjunction]);
        }

        #[test]
        fn prop_orb_within_tolerance(a in 0u16..FULL_CIRCLE, b in 0u16..FULL_CIRCLE) {
            let table = AspectTable::canonical();
            let offsets = ComputedOffsets::default();
            let resolver = AspectResolver::new(&table, &offsets);
            for r in resolver.resolve(pos(a), pos(b)) {
                prop_assert!(r.orb_minutes <= table.get(r.kind).unwrap().orb_tolerance);
            }
        }
    }
}
