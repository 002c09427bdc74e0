// ==========================================
// Marketplace sales ETL - record domain model
// ==========================================
// RawRow is the codec output, CanonicalRecord the normalized shape all
// platforms converge to, MasterDataset the persistent accumulation.
// ==========================================

use crate::domain::types::{Platform, Strictness, WeekId, WeekWindow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ==========================================
// RawRow - one row as read from a source file
// ==========================================
// Cells keep the original column label and order; consumed once by the
// normalizer and then discarded.
#[derive(Debug, Clone)]
pub struct RawRow {
    pub platform: Platform,
    pub source_file: String,
    /// 1-based data row index in the source file (header excluded),
    /// counting blank rows so error reports point at the real row.
    pub row_index: usize,
    pub cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(l, _)| l.as_str())
    }
}

// ==========================================
// RecordKey - (platform, article, week)
// ==========================================
// Uniquely identifies one logical weekly fact; two records with the same
// key are conflicting observations and are reconciled, never duplicated.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub platform: Platform,
    pub article: String,
    pub week: WeekId,
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.platform, self.article, self.week)
    }
}

// ==========================================
// CanonicalRecord - the unified record shape
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub platform: Platform,
    /// Normalized article code (NNNN-NNN-NN) when the source value could
    /// be normalized, otherwise the trimmed raw value for the validator
    /// to judge.
    pub article: String,
    /// Platform-native store SKU, kept verbatim.
    pub store_sku: Option<String>,
    pub week: WeekId,
    pub quantity: i64,
    pub revenue: f64,
    /// Filled from the product catalog when one is configured.
    pub product_name: Option<String>,
    /// Set when the record was merged under the lenient policy despite
    /// an article-code violation.
    pub flagged: bool,
    pub source_file: String,
}

impl CanonicalRecord {
    pub fn key(&self) -> RecordKey {
        RecordKey {
            platform: self.platform,
            article: self.article.clone(),
            week: self.week,
        }
    }
}

// ==========================================
// Violation - one violated validation rule
// ==========================================
// Article violations are policy-controlled; everything else indicates
// corrupt input and always blocks the merge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    #[error("article code missing")]
    ArticleMissing,

    #[error("article code does not match NNNN-NNN-NN: {value}")]
    ArticleShape { value: String },

    #[error("revenue is not a finite number: {value}")]
    RevenueNotFinite { value: f64 },

    #[error("negative quantity without returns allowance: {quantity}")]
    NegativeQuantity { quantity: i64 },

    #[error("negative revenue without returns allowance: {revenue}")]
    NegativeRevenue { revenue: f64 },

    #[error("quantity {quantity} and revenue {revenue} have inconsistent signs")]
    SignMismatch { quantity: i64, revenue: f64 },

    #[error("week {week} outside requested range [{first}, {last}]")]
    WeekOutOfRange {
        week: WeekId,
        first: WeekId,
        last: WeekId,
    },
}

impl Violation {
    /// Whether the strictness policy decides this violation's fate.
    /// Only article-code shape problems are negotiable.
    pub fn policy_controlled(&self) -> bool {
        matches!(self, Violation::ArticleMissing | Violation::ArticleShape { .. })
    }
}

// ==========================================
// ValidationOutcome - record + verdict
// ==========================================
// Never silently dropped: every outcome is carried in the WeeklyBatch
// and surfaced in the summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub record: CanonicalRecord,
    pub violations: Vec<Violation>,
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Whether this record is excluded from the merge under the given
    /// strictness. Non-policy violations always block.
    pub fn blocks_merge(&self, strictness: Strictness) -> bool {
        self.violations.iter().any(|v| {
            !v.policy_controlled() || strictness == Strictness::Strict
        })
    }

    /// Merged but carrying a policy violation: flagged under lenient.
    pub fn merge_flagged(&self, strictness: Strictness) -> bool {
        strictness == Strictness::Lenient
            && !self.violations.is_empty()
            && self.violations.iter().all(|v| v.policy_controlled())
    }
}

// ==========================================
// WeeklyBatch - one invocation's output
// ==========================================
#[derive(Debug, Clone)]
pub struct WeeklyBatch {
    pub week: WeekId,
    pub window: WeekWindow,
    pub outcomes: Vec<ValidationOutcome>,
    pub failures: Vec<crate::etl::error::NormalizationError>,
}

// ==========================================
// MasterDataset - persistent accumulation
// ==========================================
// All mutation goes through the merger's upsert; readers get iteration
// and lookups only. BTreeMap keeps iteration deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MasterDataset {
    records: BTreeMap<RecordKey, CanonicalRecord>,
}

impl MasterDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a stored snapshot; on key collision the later record
    /// wins, preserving the key-uniqueness invariant.
    pub fn from_records(records: Vec<CanonicalRecord>) -> Self {
        let mut dataset = Self::new();
        for record in records {
            dataset.records.insert(record.key(), record);
        }
        dataset
    }

    pub fn get(&self, key: &RecordKey) -> Option<&CanonicalRecord> {
        self.records.get(key)
    }

    pub fn contains(&self, key: &RecordKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RecordKey, &CanonicalRecord)> {
        self.records.iter()
    }

    pub fn records(&self) -> impl Iterator<Item = &CanonicalRecord> {
        self.records.values()
    }

    /// Insert-or-overwrite; returns true when the key already existed.
    /// Restricted to the merger.
    pub(crate) fn upsert(&mut self, record: CanonicalRecord) -> bool {
        self.records.insert(record.key(), record).is_some()
    }
}

// ==========================================
// MergeResult - upsert counts for one batch
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MergeResult {
    pub inserted: usize,
    pub updated: usize,
    pub rejected: usize,
}

// ==========================================
// RunBatchInfo - metadata for one invocation
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunBatchInfo {
    pub batch_id: String,
    pub week: WeekId,
    pub started_at: DateTime<Utc>,
    pub dry_run: bool,
    pub strictness: Strictness,
    pub total_rows: usize,
    pub elapsed_ms: u64,
}
