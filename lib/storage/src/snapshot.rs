// Dataset snapshots: gzip-compressed JSON bundles of the catalog and the
// similarity table, written atomically with a SHA-256 sidecar.
use anyhow::{anyhow, bail, Result};
use atomicwrites::{AtomicFile, OverwriteBehavior};
use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shelfmate_core::{ProductDescription, ProductId};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::similarity_table::SimilarityRow;

const SNAPSHOT_EXTENSION: &str = "snapshot";
const CHECKSUM_EXTENSION: &str = "sha256";

/// Snapshot metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDescription {
    pub name: String,
    pub creation_time: Option<String>,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub product_id: ProductId,
    #[serde(flatten)]
    pub description: ProductDescription,
}

/// Everything needed to rebuild a data store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSnapshot {
    /// Unix seconds
    pub created_at: i64,
    pub catalog: Vec<CatalogEntry>,
    pub similarity: Vec<SimilarityRow>,
}

pub struct SnapshotManager {
    snapshot_dir: PathBuf,
}

impl SnapshotManager {
    pub fn new<P: AsRef<Path>>(snapshot_dir: P) -> Result<Self> {
        let snapshot_dir = snapshot_dir.as_ref().to_path_buf();
        fs::create_dir_all(&snapshot_dir)?;
        Ok(Self { snapshot_dir })
    }

    pub fn snapshot_dir(&self) -> &Path {
        &self.snapshot_dir
    }

    fn generate_snapshot_name() -> String {
        let now: DateTime<Utc> = Utc::now();
        format!(
            "dataset-{}.{}",
            now.format("%Y-%m-%d-%H-%M-%S-%3f"),
            SNAPSHOT_EXTENSION
        )
    }

    fn checksum_path(&self, snapshot_name: &str) -> PathBuf {
        self.snapshot_dir
            .join(format!("{}.{}", snapshot_name, CHECKSUM_EXTENSION))
    }

    fn format_timestamp(secs: i64) -> Option<String> {
        DateTime::from_timestamp(secs, 0).map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
    }

    /// Write a new snapshot and its checksum
    pub fn create_snapshot(&self, data: &DatasetSnapshot) -> Result<SnapshotDescription> {
        let snapshot_name = Self::generate_snapshot_name();
        let snapshot_path = self.snapshot_dir.join(&snapshot_name);

        let json_data = serde_json::to_vec(data)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json_data)?;
        let compressed = encoder.finish()?;

        let checksum = format!("{:x}", Sha256::digest(&compressed));

        AtomicFile::new(&snapshot_path, OverwriteBehavior::AllowOverwrite)
            .write(|f| f.write_all(&compressed))?;
        AtomicFile::new(self.checksum_path(&snapshot_name), OverwriteBehavior::AllowOverwrite)
            .write(|f| f.write_all(checksum.as_bytes()))?;

        tracing::info!(
            "Created snapshot {} ({} catalog entries, {} similarity rows)",
            snapshot_name,
            data.catalog.len(),
            data.similarity.len()
        );

        Ok(SnapshotDescription {
            name: snapshot_name,
            creation_time: Self::format_timestamp(data.created_at),
            size: compressed.len() as u64,
            checksum: Some(checksum),
        })
    }

    /// All snapshots, newest first
    pub fn list_snapshots(&self) -> Result<Vec<SnapshotDescription>> {
        let mut snapshots = Vec::new();
        for entry in fs::read_dir(&self.snapshot_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|s| s.to_str()) != Some(SNAPSHOT_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let metadata = fs::metadata(&path)?;
            let creation_time = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .and_then(|d| Self::format_timestamp(d.as_secs() as i64));
            let checksum = fs::read_to_string(self.checksum_path(name))
                .ok()
                .map(|s| s.trim().to_string());

            snapshots.push(SnapshotDescription {
                name: name.to_string(),
                creation_time,
                size: metadata.len(),
                checksum,
            });
        }

        // Names embed the timestamp
        snapshots.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(snapshots)
    }

    pub fn latest_snapshot(&self) -> Result<Option<SnapshotDescription>> {
        Ok(self.list_snapshots()?.into_iter().next())
    }

    /// Load a snapshot, verifying its checksum when a sidecar exists
    pub fn load_snapshot(&self, snapshot_name: &str) -> Result<DatasetSnapshot> {
        let snapshot_path = self.snapshot_dir.join(snapshot_name);
        if !snapshot_path.exists() {
            return Err(anyhow!("Snapshot '{}' not found", snapshot_name));
        }

        let compressed = fs::read(&snapshot_path)?;
        if let Ok(expected) = fs::read_to_string(self.checksum_path(snapshot_name)) {
            let actual = format!("{:x}", Sha256::digest(&compressed));
            if expected.trim() != actual {
                bail!(
                    "Checksum mismatch for snapshot '{}': expected {}, got {}",
                    snapshot_name,
                    expected.trim(),
                    actual
                );
            }
        }

        let mut decoder = GzDecoder::new(compressed.as_slice());
        let mut json_data = Vec::new();
        decoder.read_to_end(&mut json_data)?;

        let data: DatasetSnapshot = serde_json::from_slice(&json_data)?;
        Ok(data)
    }

    pub fn delete_snapshot(&self, snapshot_name: &str) -> Result<bool> {
        let snapshot_path = self.snapshot_dir.join(snapshot_name);
        if !snapshot_path.exists() {
            return Ok(false);
        }
        fs::remove_file(&snapshot_path)?;
        let checksum_path = self.checksum_path(snapshot_name);
        if checksum_path.exists() {
            fs::remove_file(checksum_path)?;
        }
        Ok(true)
    }
}
