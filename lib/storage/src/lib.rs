pub mod catalog;
pub mod manager;
pub mod similarity_table;
pub mod snapshot;

pub use catalog::{CatalogRecord, InMemoryCatalog, RawDescription};
pub use manager::{DataSource, DataStore, CATALOG_FILE, SIMILARITY_FILE, SNAPSHOT_DIR};
pub use similarity_table::{SimilarityRow, SimilarityTable};
pub use snapshot::{CatalogEntry, DatasetSnapshot, SnapshotDescription, SnapshotManager};
