//! Aspect kinds, their definitions, and classified aspect edges.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::position::{FULL_CIRCLE, MINUTES_PER_DEGREE};
use super::Position;
use crate::{Error, Result};

/// Named angular relationship between two points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AspectKind {
    Conjunction,
    Opposition,
    Trine,
    Square,
    Sextile,
    Quintile,
    #[serde(rename = "Bi-quintile")]
    BiQuintile,
    Octile,
    Sesquiquadrate,
    #[serde(rename = "Semi-sextile")]
    SemiSextile,
    Quincunx,
    Septile,
    #[serde(rename = "Bi-septile")]
    BiSeptile,
    #[serde(rename = "Tri-septile")]
    TriSeptile,
    Novile,
    #[serde(rename = "Bi-novile")]
    BiNovile,
    #[serde(rename = "Quad-novile")]
    QuadNovile,
    Decile,
    #[serde(rename = "Tri-decile")]
    TriDecile,
    Undecile,
}

impl AspectKind {
    pub const ALL: [AspectKind; 20] = [
        AspectKind::Conjunction,
        AspectKind::Opposition,
        AspectKind::Trine,
        AspectKind::Square,
        AspectKind::Sextile,
        AspectKind::Quintile,
        AspectKind::BiQuintile,
        AspectKind::Octile,
        AspectKind::Sesquiquadrate,
        AspectKind::SemiSextile,
        AspectKind::Quincunx,
        AspectKind::Septile,
        AspectKind::BiSeptile,
        AspectKind::TriSeptile,
        AspectKind::Novile,
        AspectKind::BiNovile,
        AspectKind::QuadNovile,
        AspectKind::Decile,
        AspectKind::TriDecile,
        AspectKind::Undecile,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AspectKind::Conjunction => "Conjunction",
            AspectKind::Opposition => "Opposition",
            AspectKind::Trine => "Trine",
            AspectKind::Square => "Square",
            AspectKind::Sextile => "Sextile",
            AspectKind::Quintile => "Quintile",
            AspectKind::BiQuintile => "Bi-quintile",
            AspectKind::Octile => "Octile",
            AspectKind::Sesquiquadrate => "Sesquiquadrate",
            AspectKind::SemiSextile => "Semi-sextile",
            AspectKind::Quincunx => "Quincunx",
            AspectKind::Septile => "Septile",
            AspectKind::BiSeptile => "Bi-septile",
            AspectKind::TriSeptile => "Tri-septile",
            AspectKind::Novile => "Novile",
            AspectKind::BiNovile => "Bi-novile",
            AspectKind::QuadNovile => "Quad-novile",
            AspectKind::Decile => "Decile",
            AspectKind::TriDecile => "Tri-decile",
            AspectKind::Undecile => "Undecile",
        }
    }

    /// Exact separation in minute units, measured forward from the first point.
    pub fn canonical_offset(self) -> u16 {
        match self {
            AspectKind::Conjunction => 0,
            AspectKind::Opposition => 10_800,
            AspectKind::Trine => 7_200,
            AspectKind::Square => 5_400,
            AspectKind::Sextile => 3_600,
            AspectKind::Quintile => 4_320,
            AspectKind::BiQuintile => 8_640,
            AspectKind::Octile => 2_700,
            AspectKind::Sesquiquadrate => 8_100,
            AspectKind::SemiSextile => 1_800,
            AspectKind::Quincunx => 9_000,
            // 360/7, 720/7, 1080/7 degrees rounded to the minute
            AspectKind::Septile => 3_086,
            AspectKind::BiSeptile => 6_171,
            AspectKind::TriSeptile => 9_257,
            AspectKind::Novile => 2_400,
            AspectKind::BiNovile => 4_800,
            AspectKind::QuadNovile => 9_600,
            AspectKind::Decile => 2_160,
            AspectKind::TriDecile => 6_480,
            // 360/11 degrees rounded to the minute
            AspectKind::Undecile => 1_964,
        }
    }

    /// Default orb tolerance in minute units.
    pub fn default_tolerance(self) -> u16 {
        match self {
            AspectKind::Conjunction | AspectKind::Opposition => 480,
            AspectKind::Trine | AspectKind::Square => 360,
            AspectKind::Sextile => 240,
            AspectKind::Quincunx => 180,
            AspectKind::Quintile
            | AspectKind::BiQuintile
            | AspectKind::Octile
            | AspectKind::Sesquiquadrate
            | AspectKind::SemiSextile => 120,
            AspectKind::Decile | AspectKind::TriDecile => 90,
            AspectKind::Septile
            | AspectKind::BiSeptile
            | AspectKind::TriSeptile
            | AspectKind::Novile
            | AspectKind::BiNovile
            | AspectKind::QuadNovile => 60,
            AspectKind::Undecile => 30,
        }
    }

    /// Resolve a table column name such as `"Trine1"` or `"Bi-quintile2"` to
    /// its family. The numeric variant suffix is ignored.
    pub fn from_variant_name(column: &str) -> Result<Self> {
        column.trim_end_matches(|c: char| c.is_ascii_digit()).parse()
    }
}

impl fmt::Display for AspectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AspectKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        AspectKind::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| Error::UnknownAspect(s.to_string()))
    }
}

/// One rotation of an aspect family; the unit the offset table is keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AspectVariant {
    pub kind: AspectKind,
    /// Column name in the offset table, e.g. `"Trine1"`.
    pub column: String,
    /// Forward offset in minute units.
    pub offset: u16,
}

impl AspectVariant {
    /// Target position that exactly satisfies this variant from `from`.
    pub fn target_from(&self, from: Position) -> Position {
        from.rotate(self.offset)
    }
}

/// Angular definition and tolerance band of an aspect family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AspectDefinition {
    pub kind: AspectKind,
    pub offset: u16,
    /// Maximum deviation in minute units.
    ///
    /// One band serves both variants. The `+offset` variant seen from one
    /// point is the `-offset` variant seen from the other, so separate bands
    /// would make `resolve(p1, p2)` and `resolve(p2, p1)` disagree.
    pub orb_tolerance: u16,
}

impl AspectDefinition {
    pub fn new(kind: AspectKind) -> Self {
        Self {
            kind,
            offset: kind.canonical_offset(),
            orb_tolerance: kind.default_tolerance(),
        }
    }

    /// Symmetric families have a single separation (`offset == -offset` on the circle).
    pub fn is_symmetric(&self) -> bool {
        (self.offset as u32 * 2) % FULL_CIRCLE as u32 == 0
    }

    /// The `+offset` and `-offset` rotations, suffixed `1` and `2`.
    ///
    /// Both are listed even for symmetric families so that external tables
    /// addressing either column resolve.
    pub fn variants(&self) -> [AspectVariant; 2] {
        let name = self.kind.name();
        [
            AspectVariant {
                kind: self.kind,
                column: format!("{name}1"),
                offset: self.offset,
            },
            AspectVariant {
                kind: self.kind,
                column: format!("{name}2"),
                offset: (FULL_CIRCLE - self.offset) % FULL_CIRCLE,
            },
        ]
    }

    pub fn tolerance_degrees(&self) -> f64 {
        self.orb_tolerance as f64 / MINUTES_PER_DEGREE as f64
    }
}

/// The set of aspect definitions active for a run, enumerated once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectTable {
    definitions: Vec<AspectDefinition>,
}

impl AspectTable {
    /// Every [`AspectKind`] at its default tolerance.
    pub fn canonical() -> Self {
        Self {
            definitions: AspectKind::ALL.iter().copied().map(AspectDefinition::new).collect(),
        }
    }

    /// Only the listed families (Conjunction is always kept).
    pub fn only(kinds: &[AspectKind]) -> Self {
        let mut table = Self::canonical();
        table
            .definitions
            .retain(|d| d.kind == AspectKind::Conjunction || kinds.contains(&d.kind));
        table
    }

    pub fn with_tolerance(mut self, kind: AspectKind, minutes: u16) -> Self {
        self.set_tolerance(kind, minutes);
        self
    }

    pub fn set_tolerance(&mut self, kind: AspectKind, minutes: u16) {
        if let Some(def) = self.definitions.iter_mut().find(|d| d.kind == kind) {
            def.orb_tolerance = minutes;
        }
    }

    pub fn get(&self, kind: AspectKind) -> Option<&AspectDefinition> {
        self.definitions.iter().find(|d| d.kind == kind)
    }

    pub fn conjunction_tolerance(&self) -> u16 {
        self.get(AspectKind::Conjunction)
            .map(|d| d.orb_tolerance)
            .unwrap_or_else(|| AspectKind::Conjunction.default_tolerance())
    }

    /// Non-conjunction families in table order.
    pub fn families(&self) -> impl Iterator<Item = &AspectDefinition> {
        self.definitions.iter().filter(|d| d.kind != AspectKind::Conjunction)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for AspectTable {
    fn default() -> Self {
        Self::canonical()
    }
}

/// A classified aspect between two labeled points. Unordered in `(a, b)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AspectEdge {
    pub a: String,
    pub b: String,
    pub aspect: AspectKind,
    /// Deviation from exact, in degrees.
    pub orb: f64,
}

impl AspectEdge {
    pub fn new(a: impl Into<String>, b: impl Into<String>, aspect: AspectKind, orb: f64) -> Self {
        Self { a: a.into(), b: b.into(), aspect, orb }
    }

    /// Whether this edge joins `x` and `y`, in either order.
    pub fn joins(&self, x: &str, y: &str) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }

    /// The other endpoint, if `from` is one of them.
    pub fn other_point(&self, from: &str) -> Option<&str> {
        if from == self.a {
            Some(&self.b)
        } else if from == self.b {
            Some(&self.a)
        } else {
            None
        }
    }
}
