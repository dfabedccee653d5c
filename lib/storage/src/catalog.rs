//! In-memory product catalog
//!
//! Loads product records from JSON Lines and collapses every flavor of
//! missing text (null, empty list, blank string) into a single
//! `Option<ProductDescription>` at this boundary.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use shelfmate_core::{CatalogLookup, Error, ProductDescription, ProductId, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Raw catalog row as exported by the ingestion pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub product_id: ProductId,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<RawDescription>,
}

/// The description column shows up as a list, a plain string, or a
/// JSON-encoded list inside a string depending on the export path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDescription {
    List(Vec<Option<String>>),
    Text(String),
}

impl RawDescription {
    /// First element of the description list, or empty
    fn first_paragraph(&self) -> String {
        match self {
            RawDescription::List(items) => items
                .first()
                .and_then(|item| item.as_deref())
                .map(clean_text)
                .unwrap_or_default(),
            RawDescription::Text(text) => {
                let cleaned = clean_text(text);
                if cleaned.starts_with('[') && cleaned.ends_with(']') {
                    if let Ok(items) = serde_json::from_str::<Vec<Option<String>>>(&cleaned) {
                        return RawDescription::List(items).first_paragraph();
                    }
                }
                cleaned
            }
        }
    }
}

impl CatalogRecord {
    /// Resolve the record into a description; `None` when it carries no text at all
    pub fn to_description(&self) -> Option<ProductDescription> {
        let title = self.title.as_deref().map(clean_text).unwrap_or_default();
        let body = self
            .description
            .as_ref()
            .map(RawDescription::first_paragraph)
            .unwrap_or_default();

        if title.is_empty() && body.is_empty() {
            None
        } else {
            Some(ProductDescription { title, body })
        }
    }
}

/// Replace non-breaking spaces and trim
fn clean_text(text: &str) -> String {
    text.replace('\u{a0}', " ").trim().to_string()
}

/// Read-only catalog keyed by product id
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    descriptions: AHashMap<ProductId, ProductDescription>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw records. The first record wins for duplicate ids;
    /// records without any text are dropped.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = CatalogRecord>,
    {
        let mut catalog = Self::new();
        for record in records {
            if catalog.descriptions.contains_key(&record.product_id) {
                continue;
            }
            if let Some(description) = record.to_description() {
                catalog.descriptions.insert(record.product_id, description);
            }
        }
        catalog
    }

    /// Load a JSON Lines export; blank lines are skipped
    pub fn load_jsonl<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);

        let mut records = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: CatalogRecord = serde_json::from_str(&line).map_err(|e| {
                Error::Serialization(format!(
                    "{}:{}: {}",
                    path.display(),
                    line_no + 1,
                    e
                ))
            })?;
            records.push(record);
        }

        let total = records.len();
        let catalog = Self::from_records(records);
        tracing::info!(
            "Loaded catalog from {:?}: {} records, {} with text",
            path,
            total,
            catalog.len()
        );
        Ok(catalog)
    }

    pub fn insert(&mut self, id: impl Into<ProductId>, description: ProductDescription) {
        self.descriptions.insert(id.into(), description);
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }

    /// Entries sorted by id, for deterministic snapshots
    pub fn entries(&self) -> Vec<(&ProductId, &ProductDescription)> {
        let mut entries: Vec<_> = self.descriptions.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        entries
    }
}

impl CatalogLookup for InMemoryCatalog {
    fn describe(&self, id: &ProductId) -> Option<ProductDescription> {
        self.descriptions.get(id).cloned()
    }
}
