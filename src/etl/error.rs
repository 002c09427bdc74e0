// ==========================================
// Marketplace sales ETL - pipeline error types
// ==========================================

use crate::domain::types::Platform;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Pipeline error taxonomy.
///
/// Configuration and store errors are fatal and abort the run before or
/// without any dataset mutation; normalization errors are recovered per
/// row and collected into the batch instead of being raised.
#[derive(Error, Debug)]
pub enum EtlError {
    // ===== Configuration errors (fatal, pre-row) =====
    #[error("no mapping rules registered for platform: {0}")]
    UnknownPlatform(String),

    #[error("invalid mapping for platform {platform}, field {field}: {message}")]
    InvalidMapping {
        platform: Platform,
        field: String,
        message: String,
    },

    #[error("invalid run parameters: {0}")]
    InvalidParams(String),

    // ===== File errors =====
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported file format: {0} (expected .xlsx/.xls/.csv)")]
    UnsupportedFormat(String),

    #[error("file read failed: {0}")]
    FileRead(String),

    #[error("excel parse failed: {0}")]
    ExcelParse(String),

    #[error("csv parse failed: {0}")]
    CsvParse(String),

    // ===== Store errors (fatal, no partial commit) =====
    #[error("master dataset load failed: {0}")]
    StoreLoad(String),

    #[error("master dataset commit failed: {0}")]
    StoreCommit(String),

    #[error("report write failed: {0}")]
    ReportWrite(String),

    // ===== Everything else =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for EtlError {
    fn from(err: std::io::Error) -> Self {
        EtlError::FileRead(err.to_string())
    }
}

impl From<csv::Error> for EtlError {
    fn from(err: csv::Error) -> Self {
        EtlError::CsvParse(err.to_string())
    }
}

impl From<calamine::Error> for EtlError {
    fn from(err: calamine::Error) -> Self {
        EtlError::ExcelParse(err.to_string())
    }
}

/// Result alias for the pipeline.
pub type EtlResult<T> = Result<T, EtlError>;

// ==========================================
// NormalizationError - one row that could not
// be normalized; recovered, never fatal
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{source_file} row {row_index} ({platform}): {reason}")]
pub struct NormalizationError {
    pub platform: Platform,
    pub source_file: String,
    pub row_index: usize,
    pub reason: NormalizationReason,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NormalizationReason {
    #[error("source column not found: {column}")]
    MissingColumn { column: String },

    #[error("cannot convert field {field} from {value:?}: {message}")]
    Transform {
        field: String,
        value: String,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization_error_display() {
        let err = NormalizationError {
            platform: Platform::Ozon,
            source_file: "sales.csv".to_string(),
            row_index: 3,
            reason: NormalizationReason::Transform {
                field: "quantity".to_string(),
                value: "abc".to_string(),
                message: "not an integer".to_string(),
            },
        };
        let text = err.to_string();
        assert!(text.contains("sales.csv"));
        assert!(text.contains("row 3"));
        assert!(text.contains("quantity"));
    }
}
