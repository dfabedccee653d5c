use shelfmate_core::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use crate::catalog::InMemoryCatalog;
use crate::similarity_table::SimilarityTable;
use crate::snapshot::{CatalogEntry, DatasetSnapshot, SnapshotDescription, SnapshotManager};

/// Catalog export file inside the data directory
pub const CATALOG_FILE: &str = "catalog.jsonl";
/// Similarity matrix file inside the data directory
pub const SIMILARITY_FILE: &str = "item_sim.json";
/// Snapshot subdirectory inside the data directory
pub const SNAPSHOT_DIR: &str = "snapshots";

/// Where the loaded data came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Snapshot(String),
    RawFiles,
    InMemory,
}

/// Owns the read-only catalog and similarity table for the process lifetime
pub struct DataStore {
    catalog: Arc<InMemoryCatalog>,
    similarity: Arc<SimilarityTable>,
    data_dir: Option<PathBuf>,
    source: DataSource,
}

impl DataStore {
    /// Load from `data_dir`, preferring the newest snapshot over the raw files.
    ///
    /// The raw files win when the snapshot cannot be loaded or when either
    /// raw file was modified after the snapshot was written.
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        let snapshot_dir = data_dir.join(SNAPSHOT_DIR);

        if snapshot_dir.is_dir() {
            match Self::open_latest_snapshot(&data_dir, &snapshot_dir) {
                Ok(Some(store)) => return Ok(store),
                Ok(None) => {}
                Err(e) => tracing::warn!("Snapshot unusable ({}), loading raw files", e),
            }
        }

        Self::open_raw(data_dir)
    }

    fn open_latest_snapshot(data_dir: &Path, snapshot_dir: &Path) -> anyhow::Result<Option<Self>> {
        let snapshots = SnapshotManager::new(snapshot_dir)?;
        let Some(latest) = snapshots.latest_snapshot()? else {
            return Ok(None);
        };

        if raw_files_newer_than(data_dir, &snapshot_dir.join(&latest.name)) {
            tracing::info!("Raw data files are newer than snapshot {}", latest.name);
            return Ok(None);
        }

        tracing::info!("Loading snapshot {}", latest.name);
        let data = snapshots.load_snapshot(&latest.name)?;
        let mut store = Self::from_snapshot(data);
        store.data_dir = Some(data_dir.to_path_buf());
        store.source = DataSource::Snapshot(latest.name);
        Ok(Some(store))
    }

    /// Load only from the raw catalog and similarity files
    pub fn open_raw<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        let catalog_path = data_dir.join(CATALOG_FILE);
        let similarity_path = data_dir.join(SIMILARITY_FILE);

        for path in [&catalog_path, &similarity_path] {
            if !path.exists() {
                return Err(Error::Storage(format!("missing data file {:?}", path)));
            }
        }

        let catalog = InMemoryCatalog::load_jsonl(&catalog_path)?;
        let similarity = SimilarityTable::load_json(&similarity_path)?;

        Ok(Self {
            catalog: Arc::new(catalog),
            similarity: Arc::new(similarity),
            data_dir: Some(data_dir),
            source: DataSource::RawFiles,
        })
    }

    pub fn from_parts(catalog: InMemoryCatalog, similarity: SimilarityTable) -> Self {
        Self {
            catalog: Arc::new(catalog),
            similarity: Arc::new(similarity),
            data_dir: None,
            source: DataSource::InMemory,
        }
    }

    pub fn from_snapshot(data: DatasetSnapshot) -> Self {
        let mut catalog = InMemoryCatalog::new();
        for entry in data.catalog {
            catalog.insert(entry.product_id, entry.description);
        }
        let similarity = SimilarityTable::from_rows(data.similarity);
        Self::from_parts(catalog, similarity)
    }

    pub fn to_snapshot(&self) -> DatasetSnapshot {
        DatasetSnapshot {
            created_at: chrono::Utc::now().timestamp(),
            catalog: self
                .catalog
                .entries()
                .into_iter()
                .map(|(id, desc)| CatalogEntry {
                    product_id: id.clone(),
                    description: desc.clone(),
                })
                .collect(),
            similarity: self.similarity.to_rows(),
        }
    }

    /// Write the current data as a snapshot under `<data_dir>/snapshots`
    pub fn create_snapshot(&self) -> Result<SnapshotDescription> {
        let data_dir = self.data_dir.as_ref().ok_or_else(|| {
            Error::Storage("data store has no data directory".to_string())
        })?;
        let snapshots = SnapshotManager::new(data_dir.join(SNAPSHOT_DIR))
            .map_err(|e| Error::Storage(e.to_string()))?;
        snapshots
            .create_snapshot(&self.to_snapshot())
            .map_err(|e| Error::Storage(e.to_string()))
    }

    #[inline]
    pub fn catalog(&self) -> Arc<InMemoryCatalog> {
        self.catalog.clone()
    }

    #[inline]
    pub fn similarity(&self) -> Arc<SimilarityTable> {
        self.similarity.clone()
    }

    #[inline]
    pub fn source(&self) -> &DataSource {
        &self.source
    }
}

fn raw_files_newer_than(data_dir: &Path, snapshot_path: &Path) -> bool {
    let Ok(snapshot_time) = fs::metadata(snapshot_path).and_then(|m| m.modified()) else {
        return false;
    };
    [CATALOG_FILE, SIMILARITY_FILE].iter().any(|file| {
        fs::metadata(data_dir.join(file))
            .and_then(|m| m.modified())
            .map(|modified| modified > snapshot_time)
            .unwrap_or(false)
    })
}
