// ==========================================
// Marketplace sales ETL - core library
// ==========================================
// Weekly consolidation of marketplace sales exports (Ozon, Wildberries,
// Yandex Market) into one master dataset plus a run summary report.
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain layer - records, keys, weeks
pub mod domain;

// Pipeline layer - normalize, validate, merge, summarize
pub mod etl;

// Input codecs - CSV / Excel readers
pub mod codec;

// Persistence - dataset snapshots and report output
pub mod store;

// Run configuration and mapping tables
pub mod config;

// Logging
pub mod logging;

// ==========================================
// Core type re-exports
// ==========================================

pub use domain::record::{
    CanonicalRecord, MasterDataset, MergeResult, RawRow, RecordKey, RunBatchInfo,
    ValidationOutcome, Violation, WeeklyBatch,
};
pub use domain::types::{Platform, Strictness, WeekId, WeekWindow};

pub use etl::{
    BatchMerger, EtlError, EtlResult, MappingRegistry, MappingRule, NormalizationError,
    ProductCatalog, RowNormalizer, RunReport, SummaryReport, Validator, WeekImporter,
};

pub use codec::UniversalRowReader;
pub use config::{JsonMappingSource, RunParams};
pub use store::{FileReportSink, JsonDatasetStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "Marketplace Sales ETL";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_present() {
        assert!(!VERSION.is_empty());
    }
}
