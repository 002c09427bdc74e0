// ==========================================
// Marketplace sales ETL - domain layer
// ==========================================

pub mod record;
pub mod types;

pub use record::{
    CanonicalRecord, MasterDataset, MergeResult, RawRow, RecordKey, RunBatchInfo,
    ValidationOutcome, Violation, WeeklyBatch,
};
pub use types::{Platform, Strictness, WeekId, WeekWindow};
