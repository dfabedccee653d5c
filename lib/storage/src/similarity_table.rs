//! Precomputed item-item similarity table
//!
//! Each parent id maps to its candidates in descending score order. The
//! raw matrix includes the self-similarity cell; [`SimilarityTable::top_candidates`]
//! skips it so callers never see the parent in its own candidate list.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use shelfmate_core::{Error, ProductId, Result, SimilarityEntry, SimilarityTableProvider};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// One parent row, used by snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityRow {
    pub parent: ProductId,
    pub entries: Vec<SimilarityEntry>,
}

#[derive(Debug, Clone, Default)]
pub struct SimilarityTable {
    rows: AHashMap<ProductId, Vec<SimilarityEntry>>,
}

impl SimilarityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the row for `parent`.
    ///
    /// Entries are sorted by descending score; the sort is stable so equal
    /// scores keep their insertion order. NaN scores are dropped.
    pub fn insert_row(&mut self, parent: impl Into<ProductId>, mut entries: Vec<SimilarityEntry>) {
        entries.retain(|e| !e.score.is_nan());
        entries.sort_by(|a, b| b.score.total_cmp(&a.score));
        self.rows.insert(parent.into(), entries);
    }

    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = SimilarityRow>,
    {
        let mut table = Self::new();
        for row in rows {
            table.insert_row(row.parent, row.entries);
        }
        table
    }

    /// Load the column-per-product JSON layout:
    /// `{ "parent": { "candidate": score | null, ... }, ... }`.
    /// Null cells are skipped; ties keep ascending candidate-id order.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let matrix: BTreeMap<String, BTreeMap<String, Option<f32>>> =
            serde_json::from_reader(reader)
                .map_err(|e| Error::Serialization(format!("{}: {}", path.display(), e)))?;

        let mut table = Self::new();
        for (parent, column) in matrix {
            let entries = column
                .into_iter()
                .filter_map(|(candidate, score)| {
                    score.map(|s| SimilarityEntry::new(candidate, s))
                })
                .collect();
            table.insert_row(parent, entries);
        }

        tracing::info!("Loaded similarity table from {:?}: {} rows", path, table.len());
        Ok(table)
    }

    /// Full row including the self-similarity entry
    pub fn row(&self, parent: &ProductId) -> Option<&[SimilarityEntry]> {
        self.rows.get(parent).map(Vec::as_slice)
    }

    /// Whether the table has a row for `parent`
    pub fn contains(&self, parent: &ProductId) -> bool {
        self.rows.contains_key(parent)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows sorted by parent id, for deterministic snapshots
    pub fn to_rows(&self) -> Vec<SimilarityRow> {
        let mut rows: Vec<SimilarityRow> = self
            .rows
            .iter()
            .map(|(parent, entries)| SimilarityRow {
                parent: parent.clone(),
                entries: entries.clone(),
            })
            .collect();
        rows.sort_by(|a, b| a.parent.cmp(&b.parent));
        rows
    }
}

impl SimilarityTableProvider for SimilarityTable {
    fn top_candidates(&self, id: &ProductId, k: usize) -> Vec<ProductId> {
        match self.rows.get(id) {
            Some(entries) => entries
                .iter()
                .filter(|e| &e.candidate != id)
                .take(k)
                .map(|e| e.candidate.clone())
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ids(values: &[&str]) -> Vec<ProductId> {
        values.iter().map(|v| ProductId::from(*v)).collect()
    }

    fn sample_table() -> SimilarityTable {
        let mut table = SimilarityTable::new();
        table.insert_row(
            "P1",
            vec![
                SimilarityEntry::new("C3", 0.7),
                SimilarityEntry::new("P1", 1.0),
                SimilarityEntry::new("C1", 0.9),
                SimilarityEntry::new("C4", 0.6),
                SimilarityEntry::new("C2", 0.8),
            ],
        );
        table
    }

    #[test]
    fn test_rows_sorted_descending() {
        let table = sample_table();
        let row = table.row(&"P1".into()).unwrap();
        let order: Vec<&str> = row.iter().map(|e| e.candidate.as_str()).collect();
        assert_eq!(order, vec!["P1", "C1", "C2", "C3", "C4"]);
    }

    #[test]
    fn test_top_candidates_excludes_self() {
        let table = sample_table();
        assert_eq!(table.top_candidates(&"P1".into(), 3), ids(&["C1", "C2", "C3"]));
        assert_eq!(table.top_candidates(&"P1".into(), 10), ids(&["C1", "C2", "C3", "C4"]));
    }

    #[test]
    fn test_unknown_parent_is_empty() {
        let table = sample_table();
        assert!(table.top_candidates(&"P2".into(), 10).is_empty());
        assert!(!table.contains(&"P2".into()));
    }

    #[test]
    fn test_equal_scores_keep_insertion_order() {
        let mut table = SimilarityTable::new();
        table.insert_row(
            "P",
            vec![
                SimilarityEntry::new("B", 0.5),
                SimilarityEntry::new("A", 0.5),
                SimilarityEntry::new("C", f32::NAN),
            ],
        );
        assert_eq!(table.top_candidates(&"P".into(), 5), ids(&["B", "A"]));
    }

    #[test]
    fn test_load_json_skips_nulls() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"P1": {{"P1": 1.0, "C1": 0.4, "C2": null, "C3": 0.9}}, "P2": {{}}}}"#
        )
        .unwrap();

        let table = SimilarityTable::load_json(file.path()).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.top_candidates(&"P1".into(), 10), ids(&["C3", "C1"]));
        assert!(table.contains(&"P2".into()));
        assert!(table.top_candidates(&"P2".into(), 10).is_empty());
    }
}
