// ==========================================
// Marketplace sales ETL - CSV reader
// ==========================================
// Marketplace CSV exports disagree on delimiter and often start with a
// UTF-8 BOM; both are handled here so mapping rules never see them.
// ==========================================

use crate::codec::source_label;
use crate::domain::record::RawRow;
use crate::domain::types::Platform;
use crate::etl::error::{EtlError, EtlResult};
use std::fs;
use std::path::Path;
use tracing::debug;

const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Pick the candidate delimiter occurring most often in the header line.
fn sniff_delimiter(header_line: &str) -> u8 {
    let mut best = b',';
    let mut best_count = 0usize;
    for candidate in DELIMITER_CANDIDATES {
        let count = header_line.bytes().filter(|b| *b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

pub struct CsvRowReader;

impl CsvRowReader {
    pub fn read(&self, path: &Path, platform: Platform) -> EtlResult<Vec<RawRow>> {
        if !path.exists() {
            return Err(EtlError::FileNotFound(path.display().to_string()));
        }

        let raw = fs::read_to_string(path)?;
        let text = raw.strip_prefix('\u{feff}').unwrap_or(&raw);
        let delimiter = sniff_delimiter(text.lines().next().unwrap_or(""));
        let shown = delimiter as char;
        debug!(file = %path.display(), delimiter = %shown, "reading csv");

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let source_file = source_label(path);
        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let cells: Vec<(String, String)> = headers
                .iter()
                .enumerate()
                .map(|(col, header)| {
                    let value = record.get(col).unwrap_or_default().trim().to_string();
                    (header.clone(), value)
                })
                .collect();

            // Fully blank rows are skipped but still occupy their line
            // number, so reported row indexes match the spreadsheet.
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
