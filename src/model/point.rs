//! Labeled point and its subject of origin.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Position;

/// Which subject a point belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum Origin {
    A,
    B,
    #[default]
    Unmarked,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::A => f.write_str("A"),
            Origin::B => f.write_str("B"),
            Origin::Unmarked => f.write_str("-"),
        }
    }
}

/// A labeled position. Labels are unique within one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub label: String,
    pub origin: Origin,
    pub position: Position,
}

impl Point {
    pub fn new(label: impl Into<String>, position: Position) -> Self {
        Self {
            label: label.into(),
            origin: Origin::Unmarked,
            position,
        }
    }

    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }
}

/// Assigns an origin to a point label at ingestion time.
pub trait OriginTagger {
    fn origin_of(&self, label: &str) -> Origin;
}

/// Label-prefix convention, e.g. `A_sun` / `B_moon`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixTagger {
    pub a_prefix: String,
    pub b_prefix: String,
}

impl PrefixTagger {
    pub fn new(a_prefix: impl Into<String>, b_prefix: impl Into<String>) -> Self {
        Self { a_prefix: a_prefix.into(), b_prefix: b_prefix.into() }
    }
}

impl Default for PrefixTagger {
    fn default() -> Self {
        Self::new("A_", "B_")
    }
}

impl OriginTagger for PrefixTagger {
    fn origin_of(&self, label: &str) -> Origin {
        if !self.a_prefix.is_empty() && label.starts_with(&self.a_prefix) {
            Origin::A
        } else if !self.b_prefix.is_empty() && label.starts_with(&self.b_prefix) {
            Origin::B
        } else {
            Origin::Unmarked
        }
    }
}

/// Explicit label → origin table. Unlisted labels are unmarked.
impl OriginTagger for HashMap<String, Origin> {
    fn origin_of(&self, label: &str) -> Origin {
        self.get(label).copied().unwrap_or_default()
    }
}

/// Every point unmarked (single-chart analysis).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOrigin;

impl OriginTagger for NoOrigin {
    fn origin_of(&self, _label: &str) -> Origin {
        Origin::Unmarked
    }
}
