// ==========================================
// Marketplace sales ETL - batch merger
// ==========================================
// Upsert of a validated weekly batch into the master dataset, keyed by
// (platform, article, week). Last write wins per key, within and across
// batches: a batch is always the latest, presumably corrected, export
// for its week, so reprocessing an unchanged week is idempotent.
// ==========================================

use crate::domain::record::{CanonicalRecord, MasterDataset, MergeResult, RecordKey, WeeklyBatch};
use crate::domain::types::Strictness;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub struct BatchMerger {
    strictness: Strictness,
}

impl BatchMerger {
    pub fn new(strictness: Strictness) -> Self {
        Self { strictness }
    }

    /// Merge the batch into the dataset, returning upsert counts.
    ///
    /// Mergeable records are ordered by (platform, source file) before
    /// the upsert; the sort is stable, so row order inside a file is
    /// preserved and counts are reproducible whatever order the files
    /// were read in. Within-batch key duplicates collapse to the last
    /// occurrence before counting.
    pub fn merge(&self, dataset: &mut MasterDataset, batch: &WeeklyBatch) -> MergeResult {
        let mut result = MergeResult::default();

        // Rows lost to normalization count as rejections too.
        result.rejected = batch.failures.len();

        let mut mergeable: Vec<CanonicalRecord> = Vec::new();
        for outcome in &batch.outcomes {
            if outcome.blocks_merge(self.strictness) {
                result.rejected += 1;
                continue;
            }
            let mut record = outcome.record.clone();
            if outcome.merge_flagged(self.strictness) {
                record.flagged = true;
            }
            mergeable.push(record);
        }

        mergeable.sort_by(|a, b| (a.platform, &a.source_file).cmp(&(b.platform, &b.source_file)));

        // Collapse within-batch duplicates, later occurrence winning.
        let mut collapsed: BTreeMap<RecordKey, CanonicalRecord> = BTreeMap::new();
        for record in mergeable {
            collapsed.insert(record.key(), record);
        }

        for (key, record) in collapsed {
            if dataset.upsert(record) {
                debug!(%key, "record updated");
                result.updated += 1;
            } else {
                debug!(%key, "record inserted");
                result.inserted += 1;
            }
        }

        info!(
            inserted = result.inserted,
            updated = result.updated,
            rejected = result.rejected,
            "batch merged"
        );
        result
    }

    /// Compute the counts a real merge would produce without mutating
    /// the dataset. Runs the exact same merge code against a scratch
    /// copy, so the preview is truthful by construction.
    pub fn dry_run(&self, dataset: &MasterDataset, batch: &WeeklyBatch) -> MergeResult {
        let mut scratch = dataset.clone();
        let result = self.merge(&mut scratch, batch);
        debug!("dry-run merge complete, dataset untouched");
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{ValidationOutcome, Violation};
    use crate::domain::types::{Platform, WeekId, WeekWindow};
    use chrono::NaiveDate;

    fn record(platform: Platform, article: &str, qty: i64, rev: f64) -> CanonicalRecord {
        CanonicalRecord {
            platform,
            article: article.to_string(),
            store_sku: None,
            week: WeekId(202536),
            quantity: qty,
            revenue: rev,
            product_name: None,
            flagged: false,
            source_file: "sales.csv".to_string(),
        }
    }

    fn batch(outcomes: Vec<ValidationOutcome>) -> WeeklyBatch {
        WeeklyBatch {
            week: WeekId(202536),
            window: WeekWindow::new(NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(), None),
            outcomes,
            failures: Vec::new(),
        }
    }

    fn valid(record: CanonicalRecord) -> ValidationOutcome {
        ValidationOutcome {
            record,
            violations: Vec::new(),
        }
    }

    #[test]
    fn test_merge_worked_example() {
        // Duplicate Ozon key (later row wins) + missing Wildberries
        // article under strict policy.
        let merger = BatchMerger::new(Strictness::Strict);
        let mut dataset = MasterDataset::new();
        let batch = batch(vec![
            valid(record(Platform::Ozon, "A100", 5, 500.0)),
            valid(record(Platform::Ozon, "A100", 7, 700.0)),
            ValidationOutcome {
                record: record(Platform::Wildberries, "", 2, 20.0),
                violations: vec![Violation::ArticleMissing],
            },
        ]);

        let result = merger.merge(&mut dataset, &batch);

        assert_eq!(result.inserted, 1);
        assert_eq!(result.updated, 0);
        assert_eq!(result.rejected, 1);
        let key = RecordKey {
            platform: Platform::Ozon,
            article: "A100".to_string(),
            week: WeekId(202536),
        };
        let stored = dataset.get(&key).unwrap();
        assert_eq!(stored.quantity, 7);
        assert_eq!(stored.revenue, 700.0);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let merger = BatchMerger::new(Strictness::Strict);
        let mut dataset = MasterDataset::new();
        let batch = batch(vec![
            valid(record(Platform::Ozon, "1000-100-10", 5, 500.0)),
            valid(record(Platform::Wildberries, "1000-100-11", 3, 300.0)),
        ]);

        let first = merger.merge(&mut dataset, &batch);
        let snapshot = dataset.clone();
        let second = merger.merge(&mut dataset, &batch);

        assert_eq!(first.inserted, 2);
        assert_eq!(second.inserted, 0);
        assert_eq!(second.updated, 2);
        assert_eq!(dataset, snapshot);
    }

    #[test]
    fn test_dry_run_fidelity() {
        let merger = BatchMerger::new(Strictness::Strict);
        let mut dataset = MasterDataset::new();
        dataset.upsert(record(Platform::Ozon, "1000-100-10", 1, 10.0));
        let batch = batch(vec![
            valid(record(Platform::Ozon, "1000-100-10", 5, 500.0)),
            valid(record(Platform::Ozon, "1000-100-12", 2, 200.0)),
        ]);

        let before = dataset.clone();
        let preview = merger.dry_run(&dataset, &batch);
        assert_eq!(dataset, before);

        let real = merger.merge(&mut dataset, &batch);
        assert_eq!(preview, real);
    }

    #[test]
    fn test_strictness_toggle() {
        let flawed = ValidationOutcome {
            record: record(Platform::Ozon, "A100", 5, 500.0),
            violations: vec![Violation::ArticleShape {
                value: "A100".to_string(),
            }],
        };

        let mut strict_dataset = MasterDataset::new();
        let strict_result =
            BatchMerger::new(Strictness::Strict).merge(&mut strict_dataset, &batch(vec![flawed.clone()]));
        assert_eq!(strict_result.rejected, 1);
        assert_eq!(strict_dataset.len(), 0);

        let mut lenient_dataset = MasterDataset::new();
        let lenient_result =
            BatchMerger::new(Strictness::Lenient).merge(&mut lenient_dataset, &batch(vec![flawed]));
        assert_eq!(lenient_result.inserted, 1);
        assert_eq!(lenient_result.rejected, 0);
        let stored = lenient_dataset.records().next().unwrap();
        assert!(stored.flagged);
    }

    #[test]
    fn test_corrupt_rows_rejected_even_lenient() {
        let merger = BatchMerger::new(Strictness::Lenient);
        let mut dataset = MasterDataset::new();
        let result = merger.merge(
            &mut dataset,
            &batch(vec![ValidationOutcome {
                record: record(Platform::Ozon, "1000-100-10", -5, 500.0),
                violations: vec![Violation::SignMismatch {
                    quantity: -5,
                    revenue: 500.0,
                }],
            }]),
        );
        assert_eq!(result.rejected, 1);
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_no_duplicate_keys_after_merge() {
        let merger = BatchMerger::new(Strictness::Strict);
        let mut dataset = MasterDataset::new();
        let batch = batch(vec![
            valid(record(Platform::Ozon, "1000-100-10", 1, 10.0)),
            valid(record(Platform::Ozon, "1000-100-10", 2, 20.0)),
            valid(record(Platform::Ozon, "1000-100-10", 3, 30.0)),
        ]);
        merger.merge(&mut dataset, &batch);
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.records().next().unwrap().quantity, 3);
    }
}
