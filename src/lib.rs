//! # aspect-graph: Aspect Resolution & Pattern Matching
//!
//! Classifies the angular relationships ("aspects") between labeled points
//! of one or two charts, then searches the resulting relation graph for named
//! multi-point configurations such as Grand Trine, T-Square or Kite.
//!
//! ## Design Principles
//!
//! 1. **Data, not detectors**: every pattern is a row in a `PatternCatalog`;
//!    one generic `PatternMatcher` runs them all
//! 2. **Explicit origin**: a `Point` carries its subject (A/B) from ingestion on
//! 3. **Indexed graph**: `RelationGraph::has_aspect` is a hash probe, not a scan
//! 4. **Lenient run**: malformed points and missing table columns shrink the
//!    result; they never abort it
//!
//! ## Quick Start
//!
//! ```rust
//! use aspect_graph::{Analysis, AnalysisConfig, ComputedOffsets, Point, Position};
//!
//! # fn example() -> aspect_graph::Result<()> {
//! let analysis = Analysis::new(AnalysisConfig::default())?;
//! let points = vec![
//!     Point::new("A_sun", Position::new(0)?),
//!     Point::new("A_moon", Position::new(7_200)?),
//!     Point::new("A_venus", Position::new(14_400)?),
//! ];
//!
//! let outcome = analysis.run(&points, &ComputedOffsets::default());
//! assert_eq!(outcome.patterns.matches("Grand Trine").len(), 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Pipeline
//!
//! | Stage | Module | Description |
//! |-------|--------|-------------|
//! | Positions | `model` | Arc-minute positions, circular distance |
//! | Aspects | `resolver` | Tolerance-band classification via an offset table |
//! | Graph | `graph` | Deduplicated edges, O(1) pair lookup |
//! | Patterns | `catalog`, `matcher` | Declarative templates, subset search |
//! | Output | `report` | Major/Minor grouped results, JSON |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod resolver;
pub mod graph;
pub mod catalog;
pub mod matcher;
pub mod report;
pub mod config;

use std::collections::HashSet;
use std::io::Write;

use serde::Serialize;
use tracing::{debug, info, warn};

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Point, Origin, Position, RawPosition, AspectKind, AspectDefinition, AspectTable, AspectEdge,
    OriginTagger, PrefixTagger, NoOrigin, circular_distance,
};

// ============================================================================
// Re-exports: Pipeline stages
// ============================================================================

pub use resolver::{AspectResolver, OffsetTable, ComputedOffsets, SparseOffsetTable, ResolvedAspect};
pub use graph::{RelationGraph, NodeIdx};
pub use catalog::{PatternCatalog, PatternTemplate, Category, Requirement};
pub use matcher::{PatternMatcher, PatternMatch, MixedOrigin};
pub use report::{PatternReport, PatternResult};
pub use config::AnalysisConfig;

// ============================================================================
// Top-level Analysis handle
// ============================================================================

/// One labeled, unvalidated input point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPoint {
    pub label: String,
    pub position: RawPosition,
}

impl RawPoint {
    pub fn new(label: impl Into<String>, position: RawPosition) -> Self {
        Self { label: label.into(), position }
    }
}

/// Everything one run produced. Nothing outlives it.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub points: Vec<Point>,
    pub edges: Vec<AspectEdge>,
    /// Families skipped because the offset table lacks their columns.
    pub skipped_aspects: Vec<AspectKind>,
    pub patterns: PatternReport,
    #[serde(skip)]
    pub graph: RelationGraph,
}

impl AnalysisOutcome {
    /// Write points, edges and patterns as pretty JSON.
    pub fn write_json(&self, writer: &mut dyn Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writeln!(writer)?;
        Ok(())
    }
}

/// The primary entry point. Holds the aspect table and pattern catalog and
/// runs the full pipeline: resolve → graph → match.
#[derive(Debug, Clone)]
pub struct Analysis {
    config: AnalysisConfig,
    aspects: AspectTable,
    catalog: PatternCatalog,
}

impl Analysis {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let aspects = config.aspect_table();
        Ok(Self { config, aspects, catalog: PatternCatalog::standard() })
    }

    /// Single-chart analysis with default tolerances.
    pub fn single_chart() -> Self {
        let config = AnalysisConfig::default();
        Self { aspects: config.aspect_table(), config, catalog: PatternCatalog::standard() }
    }

    /// Two-subject analysis: every match must include A and B points.
    pub fn synastry() -> Self {
        let config = AnalysisConfig::synastry();
        Self { aspects: config.aspect_table(), config, catalog: PatternCatalog::standard() }
    }

    pub fn with_catalog(mut self, catalog: PatternCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn aspects(&self) -> &AspectTable {
        &self.aspects
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// Validate raw entries into points, tagging origins with `tagger`.
    ///
    /// Malformed positions are dropped, as are repeats of a label already
    /// seen. Both are logged, neither is an error.
    pub fn ingest<T>(&self, entries: impl IntoIterator<Item = RawPoint>, tagger: &T) -> Vec<Point>
    where
        T: OriginTagger + ?Sized,
    {
        let mut seen = HashSet::new();
        let mut points = Vec::new();
        for entry in entries {
            let position = match entry.position.resolve() {
                Ok(p) => p,
                Err(e) => {
                    debug!(label = %entry.label, error = %e, "dropping malformed point");
                    continue;
                }
            };
            if !seen.insert(entry.label.clone()) {
                warn!(label = %entry.label, "dropping duplicate point label");
                continue;
            }
            let origin = tagger.origin_of(&entry.label);
            points.push(Point::new(entry.label, position).with_origin(origin));
        }
        points
    }

    /// `ingest` with the configured label-prefix convention.
    pub fn ingest_prefixed(&self, entries: impl IntoIterator<Item = RawPoint>) -> Vec<Point> {
        self.ingest(entries, &self.config.origin_prefixes)
    }

    /// Resolve aspects among `points` into a fresh graph.
    pub fn build_graph(&self, points: &[Point], offsets: &dyn OffsetTable) -> (RelationGraph, Vec<AspectKind>) {
        let resolver = AspectResolver::new(&self.aspects, offsets);
        let mut graph = RelationGraph::new();
        let inserted = resolver.populate(points, &mut graph);
        debug!(points = points.len(), edges = inserted, "built relation graph");
        (graph, resolver.skipped().to_vec())
    }

    /// Search an existing graph with this analysis' catalog and policy.
    pub fn match_graph(&self, graph: &RelationGraph) -> PatternReport {
        PatternMatcher::new(graph, self.config.mixed_origin).match_catalog(&self.catalog)
    }

    /// Run the whole pipeline over `points`.
    pub fn run(&self, points: &[Point], offsets: &dyn OffsetTable) -> AnalysisOutcome {
        if points.len() > self.config.point_warning_threshold {
            warn!(
                points = points.len(),
                threshold = self.config.point_warning_threshold,
                "large point set; pattern search grows combinatorially",
            );
        }

        let (graph, skipped_aspects) = self.build_graph(points, offsets);
        let patterns = self.match_graph(&graph);
        info!(
            points = points.len(),
            edges = graph.edge_count(),
            patterns = patterns.total_matches(),
            "analysis complete",
        );

        AnalysisOutcome {
            points: points.to_vec(),
            edges: graph.edges(),
            skipped_aspects,
            patterns,
            graph,
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid position: {0}")]
    InvalidPosition(String),

    #[error("Unknown aspect: {0}")]
    UnknownAspect(String),

    #[error("Unknown pattern: {0}")]
    UnknownPattern(String),

    #[error("Invalid pattern template '{name}': {reason}")]
    InvalidTemplate { name: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
