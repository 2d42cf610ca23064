//! Offset-lookup tables.
//!
//! `ComputedOffsets` derives every target arithmetically and is the reference
//! implementation. `SparseOffsetTable` holds rows loaded from an external
//! reference table, one row per absolute position and one column per
//! aspect variant. Absent cells mean "no target at this position".

use hashbrown::HashMap;

use crate::model::{AspectTable, AspectKind, Position};
use crate::Result;
use super::OffsetTable;

// ============================================================================
// ComputedOffsets
// ============================================================================

/// Offset table computed from canonical offsets: `target = position + offset`.
#[derive(Debug, Clone)]
pub struct ComputedOffsets {
    /// column name → forward offset in minute units
    columns: HashMap<String, u16>,
}

impl ComputedOffsets {
    /// Columns for every variant of every non-conjunction family in `aspects`.
    pub fn from_table(aspects: &AspectTable) -> Self {
        let columns = aspects
            .families()
            .flat_map(|def| def.variants())
            .map(|v| (v.column, v.offset))
            .collect();
        Self { columns }
    }

    /// Drop a column, as when an external sheet lacks it.
    pub fn without_column(mut self, column: &str) -> Self {
        self.columns.remove(column);
        self
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

impl Default for ComputedOffsets {
    fn default() -> Self {
        Self::from_table(&AspectTable::canonical())
    }
}

impl OffsetTable for ComputedOffsets {
    fn lookup_target(&self, position: Position, column: &str) -> Option<Position> {
        self.columns.get(column).map(|&offset| position.rotate(offset))
    }

    fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }
}

// ============================================================================
// SparseOffsetTable
// ============================================================================

/// Externally supplied lookup rows. Cells may be missing.
#[derive(Debug, Clone, Default)]
pub struct SparseOffsetTable {
    columns: HashMap<String, HashMap<u16, Position>>,
}

impl SparseOffsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a column without any cells.
    pub fn add_column(&mut self, column: impl Into<String>) {
        self.columns.entry(column.into()).or_default();
    }

    /// Set one cell. Column names must resolve to a known aspect family.
    pub fn insert(&mut self, column: &str, position: Position, target: Position) -> Result<()> {
        AspectKind::from_variant_name(column)?;
        self.columns
            .entry(column.to_string())
            .or_default()
            .insert(position.minutes(), target);
        Ok(())
    }

    /// Load `(position, column, target)` rows, raw minute units.
    ///
    /// The whole load fails on the first bad row so a truncated sheet is noticed.
    pub fn from_rows<I, S>(rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = (u16, S, u16)>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for (position, column, target) in rows {
            table.insert(column.as_ref(), Position::new(position)?, Position::new(target)?)?;
        }
        Ok(table)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

impl OffsetTable for SparseOffsetTable {
    fn lookup_target(&self, position: Position, column: &str) -> Option<Position> {
        self.columns.get(column)?.get(&position.minutes()).copied()
    }

    fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(m: u16) -> Position {
        Position::new(m).unwrap()
    }

    #[test]
    fn test_computed_targets_wrap() {
        let table = ComputedOffsets::default();
        assert_eq!(table.lookup_target(pos(18_000), "Trine1"), Some(pos(3_600)));
        assert_eq!(table.lookup_target(pos(0), "Trine2"), Some(pos(14_400)));
        assert_eq!(table.lookup_target(pos(0), "Conjunction1"), None);
        assert!(table.has_column("Quincunx2"));
    }

    #[test]
    fn test_computed_without_column() {
        let table = ComputedOffsets::default().without_column("Sextile1");
        assert!(!table.has_column("Sextile1"));
        assert!(table.has_column("Sextile2"));
        assert_eq!(table.column_count(), ComputedOffsets::default().column_count() - 1);
    }

    #[test]
    fn test_sparse_rows() {
        let table = SparseOffsetTable::from_rows([
            (0u16, "Trine1", 7_200u16),
            (0, "Trine2", 14_400),
        ])
        .unwrap();
        assert_eq!(table.lookup_target(pos(0), "Trine1"), Some(pos(7_200)));
        // present column, absent cell
        assert_eq!(table.lookup_target(pos(1), "Trine1"), None);
        assert!(!table.has_column("Square1"));
    }

    #[test]
    fn test_sparse_rejects_bad_rows() {
        assert!(SparseOffsetTable::from_rows([(21_600u16, "Trine1", 0u16)]).is_err());
        assert!(SparseOffsetTable::from_rows([(0u16, "Hexile1", 0u16)]).is_err());
    }
}
