// ==========================================
// Marketplace sales ETL - input codecs
// ==========================================
// Format-specific readers plus the extension-dispatching reader the
// pipeline is wired with. Input layout: one subdirectory per platform
// under the input directory, holding that platform's exports.
// ==========================================

pub mod csv_reader;
pub mod excel_reader;

use crate::domain::record::RawRow;
use crate::domain::types::Platform;
use crate::etl::error::{EtlError, EtlResult};
use crate::etl::week_importer_trait::RowReader;
use std::path::{Path, PathBuf};

pub use csv_reader::CsvRowReader;
pub use excel_reader::ExcelRowReader;

const EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

/// File label carried on every row: platform directory plus file name,
/// stable across machines unlike an absolute path.
pub(crate) fn source_label(path: &Path) -> String {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    match path.parent().and_then(|p| p.file_name()) {
        Some(dir) => format!("{}/{}", dir.to_string_lossy(), file),
        None => file,
    }
}

// ==========================================
// UniversalRowReader - dispatch by extension
// ==========================================
pub struct UniversalRowReader;

impl RowReader for UniversalRowReader {
    fn read_rows(&self, path: &Path, platform: Platform) -> EtlResult<Vec<RawRow>> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "csv" => CsvRowReader.read(path, platform),
            "xlsx" | "xls" => ExcelRowReader.read(path, platform),
            _ => Err(EtlError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Spreadsheets under `<input_dir>/<platform>/`, sorted by file name
    /// so multi-file platforms always merge in the same order.
    fn discover_files(&self, input_dir: &Path, platform: Platform) -> EtlResult<Vec<PathBuf>> {
        let dir = input_dir.join(platform.input_dir_name());
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_lowercase();
            if path.is_file() && EXTENSIONS.contains(&ext.as_str()) {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_source_label_keeps_platform_dir() {
        assert_eq!(
            source_label(Path::new("/data/in/ozon/sales.csv")),
            "ozon/sales.csv"
        );
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let ozon = dir.path().join("ozon");
        fs::create_dir(&ozon).unwrap();
        fs::write(ozon.join("b.csv"), "a,b\n").unwrap();
        fs::write(ozon.join("a.xlsx"), "").unwrap();
        fs::write(ozon.join("notes.txt"), "").unwrap();

        let files = UniversalRowReader
            .discover_files(dir.path(), Platform::Ozon)
            .unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.xlsx", "b.csv"]);
    }

    #[test]
    fn test_discover_missing_platform_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let files = UniversalRowReader
            .discover_files(dir.path(), Platform::Wildberries)
            .unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = UniversalRowReader
            .read_rows(Path::new("/tmp/data.parquet"), Platform::Ozon)
            .unwrap_err();
        assert!(matches!(err, EtlError::UnsupportedFormat(_)));
    }
}
