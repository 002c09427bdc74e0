// ==========================================
// Marketplace sales ETL - row normalizer
// ==========================================
// Generic interpreter over a platform's mapping rules. Pure and total
// over a fixed rule set: the same RawRow always normalizes to the same
// result. Fixed transform order per rule: locate source cell -> trim ->
// coerce -> assign to the canonical field.
// ==========================================

use crate::domain::record::{CanonicalRecord, RawRow};
use crate::domain::types::WeekId;
use crate::etl::error::{NormalizationError, NormalizationReason};
use crate::etl::mapping::{CanonicalField, ColumnLocator, MappingRule, Transform};
use chrono::NaiveDate;
use tracing::warn;

// ==========================================
// Header normalization
// ==========================================
// Platforms disagree on case, spacing and punctuation in column headers;
// both rule aliases and source labels are compared in this form.
pub fn normalize_header(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut last_sep = true;
    for ch in label.trim().chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            last_sep = false;
        } else if !last_sep {
            out.push('_');
            last_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

// ==========================================
// Value transforms
// ==========================================

/// Normalize an article code to NNNN-NNN-NN. At least nine digits must
/// be present anywhere in the value; the first nine form the code.
pub fn normalize_article(value: &str) -> Option<String> {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).take(9).collect();
    if digits.len() < 9 {
        return None;
    }
    Some(format!(
        "{}-{}-{}",
        &digits[0..4],
        &digits[4..7],
        &digits[7..9]
    ))
}

/// Integer count; empty cells and the "-" placeholder coerce to 0.
fn parse_quantity(value: &str) -> Result<i64, String> {
    let cleaned: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() || cleaned == "-" {
        return Ok(0);
    }
    cleaned
        .parse::<i64>()
        .map_err(|_| format!("not an integer: {}", value.trim()))
}

/// Monetary amount. Tolerates comma decimal separators, grouping spaces
/// and ruble suffixes; empty cells coerce to 0.
fn parse_currency(value: &str) -> Result<f64, String> {
    let mut cleaned: String = value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .replace(',', ".");
    for suffix in ["₽", "руб.", "руб", "RUB", "rub", "р."] {
        if let Some(stripped) = cleaned.strip_suffix(suffix) {
            cleaned = stripped.to_string();
            break;
        }
    }
    if cleaned.is_empty() || cleaned == "-" {
        return Ok(0.0);
    }
    cleaned
        .parse::<f64>()
        .map_err(|_| format!("not a number: {}", value.trim()))
}

/// Date cell -> ISO year-week. Accepts the formats the three platforms
/// actually export.
fn parse_date_week(value: &str) -> Result<WeekId, String> {
    let trimmed = value.trim();
    let parsed = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d.%m.%Y"))
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%Y%m%d"))
        .map_err(|_| format!("not a date: {}", trimmed))?;
    Ok(WeekId::from_date(parsed))
}

// ==========================================
// RowNormalizer
// ==========================================
pub struct RowNormalizer {
    /// Week stamped on records whose platform carries no date column.
    batch_week: WeekId,
}

/// Output of normalizing one file's rows: successes and failures side by
/// side, so one malformed row never hides the rest.
#[derive(Debug, Default)]
pub struct NormalizedRows {
    pub records: Vec<CanonicalRecord>,
    pub failures: Vec<NormalizationError>,
}

impl RowNormalizer {
    pub fn new(batch_week: WeekId) -> Self {
        Self { batch_week }
    }

    /// Normalize one raw row against its platform's rule table.
    ///
    /// Rules targeting required fields fail the row when their source
    /// column is absent; rules for optional fields simply yield nothing.
    /// An article value that cannot be normalized is kept trimmed as-is
    /// for the validator to classify: a malformed identifier is a
    /// validation question, not a normalization failure.
    pub fn normalize(
        &self,
        row: &RawRow,
        rules: &[MappingRule],
    ) -> Result<CanonicalRecord, NormalizationError> {
        let mut article = String::new();
        let mut store_sku = None;
        let mut quantity = 0i64;
        let mut revenue = 0.0f64;
        let mut week = self.batch_week;
        let mut product_name = None;

        for rule in rules {
            let cell = match self.locate(row, &rule.source) {
                Some(value) => value.trim().to_string(),
                None => {
                    if rule.field.is_required() {
                        return Err(self.fail_missing(row, &rule.source));
                    }
                    continue;
                }
            };

            match (rule.field, rule.transform()) {
                (CanonicalField::Article, _) => {
                    article = normalize_article(&cell).unwrap_or(cell);
                }
                (CanonicalField::StoreSku, _) => {
                    if !cell.is_empty() {
                        store_sku = Some(cell);
                    }
                }
                (CanonicalField::ProductName, _) => {
                    if !cell.is_empty() {
                        product_name = Some(cell);
                    }
                }
                (CanonicalField::Quantity, Transform::Integer) => {
                    quantity = parse_quantity(&cell)
                        .map_err(|message| self.fail_transform(row, rule.field, &cell, message))?;
                }
                (CanonicalField::Revenue, Transform::Currency) => {
                    revenue = parse_currency(&cell)
                        .map_err(|message| self.fail_transform(row, rule.field, &cell, message))?;
                }
                (CanonicalField::Week, Transform::DateToWeek) => {
                    if !cell.is_empty() {
                        week = parse_date_week(&cell).map_err(|message| {
                            self.fail_transform(row, rule.field, &cell, message)
                        })?;
                    }
                }
                (field, transform) => {
                    // A numeric field mapped with a text transform still
                    // has to produce a number.
                    return Err(self.fail_transform(
                        row,
                        field,
                        &cell,
                        format!("transform {:?} not applicable to {}", transform, field.name()),
                    ));
                }
            }
        }

        Ok(CanonicalRecord {
            platform: row.platform,
            article,
            store_sku,
            week,
            quantity,
            revenue,
            product_name,
            flagged: false,
            source_file: row.source_file.clone(),
        })
    }

    /// Normalize a whole file, collecting failures alongside successes.
    pub fn normalize_rows(&self, rows: &[RawRow], rules: &[MappingRule]) -> NormalizedRows {
        let mut out = NormalizedRows::default();
        for row in rows {
            match self.normalize(row, rules) {
                Ok(record) => out.records.push(record),
                Err(failure) => {
                    warn!(
                        file = %failure.source_file,
                        row = failure.row_index,
                        reason = %failure.reason,
                        "row rejected during normalization"
                    );
                    out.failures.push(failure);
                }
            }
        }
        out
    }

    fn locate<'a>(&self, row: &'a RawRow, source: &ColumnLocator) -> Option<&'a str> {
        match source {
            ColumnLocator::Names(aliases) => {
                for alias in aliases {
                    let wanted = normalize_header(alias);
                    if let Some(value) = row
                        .cells
                        .iter()
                        .find(|(label, _)| normalize_header(label) == wanted)
                        .map(|(_, v)| v.as_str())
                    {
                        return Some(value);
                    }
                }
                None
            }
            ColumnLocator::Index(index) => row.cells.get(*index).map(|(_, v)| v.as_str()),
        }
    }

    fn fail_missing(&self, row: &RawRow, source: &ColumnLocator) -> NormalizationError {
        let column = match source {
            ColumnLocator::Names(aliases) => aliases.join(" | "),
            ColumnLocator::Index(index) => format!("#{}", index),
        };
        NormalizationError {
            platform: row.platform,
            source_file: row.source_file.clone(),
            row_index: row.row_index,
            reason: NormalizationReason::MissingColumn { column },
        }
    }

    fn fail_transform(
        &self,
        row: &RawRow,
        field: CanonicalField,
        value: &str,
        message: String,
    ) -> NormalizationError {
        NormalizationError {
            platform: row.platform,
            source_file: row.source_file.clone(),
            row_index: row.row_index,
            reason: NormalizationReason::Transform {
                field: field.name().to_string(),
                value: value.to_string(),
                message,
            },
        }
    }
}

/// Source columns with no mapping rule. They are ignored by the
/// normalizer but reported so new export columns get noticed.
pub fn unmapped_columns(labels: &[String], rules: &[MappingRule]) -> Vec<String> {
    let mapped: Vec<String> = rules
        .iter()
        .flat_map(|rule| match &rule.source {
            ColumnLocator::Names(aliases) => {
                aliases.iter().map(|a| normalize_header(a)).collect::<Vec<_>>()
            }
            ColumnLocator::Index(_) => Vec::new(),
        })
        .collect();
    let indexed: Vec<usize> = rules
        .iter()
        .filter_map(|rule| match &rule.source {
            ColumnLocator::Index(i) => Some(*i),
            ColumnLocator::Names(_) => None,
        })
        .collect();

    labels
        .iter()
        .enumerate()
        .filter(|(i, label)| {
            !indexed.contains(i) && !mapped.contains(&normalize_header(label))
        })
        .map(|(_, label)| label.clone())
        .collect()
}
