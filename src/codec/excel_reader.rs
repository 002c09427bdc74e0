// ==========================================
// Marketplace sales ETL - Excel reader
// ==========================================
// Reads the first worksheet: header row first, data rows after, blank
// rows skipped without disturbing row numbering.
// ==========================================

use crate::codec::source_label;
use crate::domain::record::RawRow;
use crate::domain::types::Platform;
use crate::etl::error::{EtlError, EtlResult};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::Path;
use tracing::debug;

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}

pub struct ExcelRowReader;

impl ExcelRowReader {
    pub fn read(&self, path: &Path, platform: Platform) -> EtlResult<Vec<RawRow>> {
        if !path.exists() {
            return Err(EtlError::FileNotFound(path.display().to_string()));
        }

        let mut workbook = open_workbook_auto(path)?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| EtlError::ExcelParse("workbook has no sheets".to_string()))?;
        debug!(file = %path.display(), sheet = %sheet_name, "reading excel");

        let range = workbook.worksheet_range(&sheet_name)?;
        let mut sheet_rows = range.rows();
        let header_row = sheet_rows
            .next()
            .ok_or_else(|| EtlError::ExcelParse("worksheet has no header row".to_string()))?;
        let headers: Vec<String> = header_row.iter().map(cell_text).collect();

        let source_file = source_label(path);
        let mut rows = Vec::new();
        for (idx, data_row) in sheet_rows.enumerate() {
            let cells: Vec<(String, String)> = headers
                .iter()
                .enumerate()
                .map(|(col, header)| {
                    let value = data_row.get(col).map(cell_text).unwrap_or_default();
                    (header.clone(), value)
                })
                .collect();

            if cells.iter().all(|(_, v)| v.is_empty()) {
                continue;
            }

            rows.push(RawRow {
                platform,
                source_file: source_file.clone(),
                row_index: idx + 2,
                cells,
            });
        }
        Ok(rows)
    }
}
