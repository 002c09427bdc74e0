// ==========================================
// Marketplace sales ETL - pipeline modules
// ==========================================

pub mod catalog;
pub mod error;
pub mod mapping;
pub mod merger;
pub mod normalizer;
pub mod summary;
pub mod validator;
pub mod week_importer;
pub mod week_importer_trait;

pub use catalog::ProductCatalog;
pub use error::{EtlError, EtlResult, NormalizationError, NormalizationReason};
pub use mapping::{CanonicalField, ColumnLocator, MappingRegistry, MappingRule, Transform};
pub use merger::BatchMerger;
pub use normalizer::{normalize_article, normalize_header, RowNormalizer};
pub use summary::{PlatformActivity, SummaryBuilder, SummaryReport};
pub use validator::Validator;
pub use week_importer::{RunReport, WeekImporter};
pub use week_importer_trait::{DatasetStore, MappingSource, ReportSink, RowReader};
