// ==========================================
// Marketplace sales ETL - master dataset store
// ==========================================
// JSON snapshot of the master dataset on disk. Commit writes the whole
// snapshot to a temp file in the target directory and renames it over
// the old one, so a crash mid-write never leaves a torn dataset.
// ==========================================

use crate::domain::record::{CanonicalRecord, MasterDataset};
use crate::etl::error::{EtlError, EtlResult};
use crate::etl::week_importer_trait::DatasetStore;
use std::io::Write;
use std::path::PathBuf;
use tracing::{info, warn};

pub struct JsonDatasetStore {
    path: PathBuf,
}

impl JsonDatasetStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl DatasetStore for JsonDatasetStore {
    /// A missing snapshot is a first run, not an error.
    fn load(&self) -> EtlResult<MasterDataset> {
        if !self.path.exists() {
            warn!(path = %self.path.display(), "no master dataset yet, starting empty");
            return Ok(MasterDataset::new());
        }
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| EtlError::StoreLoad(format!("{}: {}", self.path.display(), e)))?;
        let records: Vec<CanonicalRecord> = serde_json::from_str(&text)
            .map_err(|e| EtlError::StoreLoad(format!("{}: {}", self.path.display(), e)))?;
        let dataset = MasterDataset::from_records(records);
        info!(path = %self.path.display(), records = dataset.len(), "master dataset loaded");
        Ok(dataset)
    }

    fn commit(&self, dataset: &MasterDataset) -> EtlResult<()> {
        let records: Vec<&CanonicalRecord> = dataset.records().collect();
        let text = serde_json::to_string_pretty(&records)
            .map_err(|e| EtlError::StoreCommit(e.to_string()))?;

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&dir)
            .map_err(|e| EtlError::StoreCommit(format!("{}: {}", dir.display(), e)))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .map_err(|e| EtlError::StoreCommit(e.to_string()))?;
        tmp.write_all(text.as_bytes())
            .map_err(|e| EtlError::StoreCommit(e.to_string()))?;
        tmp.persist(&self.path)
            .map_err(|e| EtlError::StoreCommit(e.to_string()))?;

        info!(path = %self.path.display(), records = dataset.len(), "master dataset committed");
        Ok(())
    }
}
