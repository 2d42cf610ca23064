//! Pattern search results as handed to a presentation layer.
//!
//! Results are grouped Major first, then Minor; within a group they keep
//! catalog order, and each pattern's matches keep enumeration order.

use std::collections::HashMap;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::catalog::Category;
use crate::matcher::PatternMatch;
use crate::Result;

/// Matches of one template, with its display metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternResult {
    pub name: String,
    pub category: Category,
    pub keyword: String,
    pub matches: Vec<PatternMatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatternReport {
    results: Vec<PatternResult>,
}

impl PatternReport {
    pub fn new(results: Vec<PatternResult>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[PatternResult] {
        &self.results
    }

    pub fn get(&self, name: &str) -> Option<&PatternResult> {
        self.results.iter().find(|r| r.name == name)
    }

    /// Matches for `name`; empty for unknown patterns.
    pub fn matches(&self, name: &str) -> &[PatternMatch] {
        self.get(name).map(|r| r.matches.as_slice()).unwrap_or(&[])
    }

    pub fn by_category(&self, category: Category) -> impl Iterator<Item = &PatternResult> {
        self.results.iter().filter(move |r| r.category == category)
    }

    /// Only patterns with at least one match.
    pub fn found(&self) -> impl Iterator<Item = &PatternResult> {
        self.results.iter().filter(|r| !r.matches.is_empty())
    }

    pub fn total_matches(&self) -> usize {
        self.results.iter().map(|r| r.matches.len()).sum()
    }

    /// True when no pattern matched anything. Not an error.
    pub fn is_empty(&self) -> bool {
        self.total_matches() == 0
    }

    /// Pattern name → matches.
    pub fn to_map(&self) -> HashMap<String, Vec<PatternMatch>> {
        self.results
            .iter()
            .map(|r| (r.name.clone(), r.matches.clone()))
            .collect()
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, writer: &mut dyn Write) -> Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writeln!(writer)?;
        Ok(())
    }
}
