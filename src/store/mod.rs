// ==========================================
// Marketplace sales ETL - persistence
// ==========================================

pub mod dataset_store;
pub mod report_writer;

pub use dataset_store::JsonDatasetStore;
pub use report_writer::FileReportSink;
