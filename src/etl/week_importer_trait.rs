// ==========================================
// Marketplace sales ETL - pipeline seams
// ==========================================
// Trait boundaries between the pipeline and the outside world (files,
// mapping configuration, the master dataset, report output). Production
// wiring lives in codec/ and store/; tests substitute in-memory fakes.
// ==========================================

use crate::domain::record::{CanonicalRecord, MasterDataset, MergeResult, RawRow, RunBatchInfo};
use crate::domain::types::Platform;
use crate::etl::error::EtlResult;
use crate::etl::mapping::MappingRule;
use crate::etl::summary::SummaryReport;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Reads one source spreadsheet into raw rows.
pub trait RowReader {
    fn read_rows(&self, path: &Path, platform: Platform) -> EtlResult<Vec<RawRow>>;

    /// Source files for one platform under the input directory, in a
    /// stable order.
    fn discover_files(&self, input_dir: &Path, platform: Platform) -> EtlResult<Vec<PathBuf>>;
}

/// Supplies the per-platform column mapping tables.
pub trait MappingSource {
    fn load_rules(&self) -> EtlResult<HashMap<Platform, Vec<MappingRule>>>;
}

/// Durable storage for the master dataset.
pub trait DatasetStore {
    fn load(&self) -> EtlResult<MasterDataset>;
    fn commit(&self, dataset: &MasterDataset) -> EtlResult<()>;
}

/// Destination for the run summary and the optional dataset export.
pub trait ReportSink {
    /// Returns the path the summary was written to.
    fn write_report(
        &self,
        report: &SummaryReport,
        merge: &MergeResult,
        info: &RunBatchInfo,
    ) -> EtlResult<PathBuf>;

    /// Returns the path the dataset rows were exported to.
    fn export_dataset(
        &self,
        records: &mut dyn Iterator<Item = &CanonicalRecord>,
        info: &RunBatchInfo,
    ) -> EtlResult<PathBuf>;
}
