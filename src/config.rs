//! Run configuration.
//!
//! Every field has a default, so a JSON document only needs the keys it
//! changes:
//!
//! ```json
//! { "mixed_origin": "EveryOrigin", "tolerances": { "Sextile": 300 } }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::matcher::MixedOrigin;
use crate::model::{AspectKind, AspectTable, PrefixTagger, HALF_CIRCLE};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Conjunction band in minute units (default 480 = 8°).
    pub conjunction_tolerance: u16,
    /// Per-family tolerance overrides in minute units.
    pub tolerances: BTreeMap<AspectKind, u16>,
    /// Families to evaluate; `None` means all of them.
    pub aspects: Option<Vec<AspectKind>>,
    /// Origin mix a pattern match must contain.
    pub mixed_origin: MixedOrigin,
    /// Label prefixes used by [`crate::Analysis::ingest_prefixed`].
    pub origin_prefixes: PrefixTagger,
    /// Log a warning above this many points; the search is combinatorial.
    pub point_warning_threshold: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            conjunction_tolerance: AspectKind::Conjunction.default_tolerance(),
            tolerances: BTreeMap::new(),
            aspects: None,
            mixed_origin: MixedOrigin::Off,
            origin_prefixes: PrefixTagger::default(),
            point_warning_threshold: 40,
        }
    }
}

impl AnalysisConfig {
    /// Two-subject analysis: matches must include both A and B points.
    pub fn synastry() -> Self {
        Self { mixed_origin: MixedOrigin::EveryOrigin, ..Self::default() }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.conjunction_tolerance > HALF_CIRCLE {
            return Err(Error::Config(format!(
                "conjunction_tolerance {} exceeds {HALF_CIRCLE}",
                self.conjunction_tolerance
            )));
        }
        for (kind, &minutes) in &self.tolerances {
            if minutes > HALF_CIRCLE {
                return Err(Error::Config(format!("tolerance {minutes} for {kind} exceeds {HALF_CIRCLE}")));
            }
        }
        if self.aspects.as_ref().is_some_and(|a| a.is_empty()) {
            return Err(Error::Config("aspects list is empty; omit it to use every family".into()));
        }
        Ok(())
    }

    /// The aspect table this configuration describes.
    pub fn aspect_table(&self) -> AspectTable {
        let mut table = match &self.aspects {
            Some(kinds) => AspectTable::only(kinds),
            None => AspectTable::canonical(),
        };
        table.set_tolerance(AspectKind::Conjunction, self.conjunction_tolerance);
        for (&kind, &minutes) in &self.tolerances {
            table.set_tolerance(kind, minutes);
        }
        table
    }
}
