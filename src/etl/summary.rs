// ==========================================
// Marketplace sales ETL - summary builder
// ==========================================
// Pure aggregation of one processed batch into per-platform and
// per-article totals. Sums are grouped through BTreeMaps, so the report
// is identical whatever order the input rows arrived in.
// ==========================================

use crate::domain::record::{MergeResult, RunBatchInfo, WeeklyBatch};
use crate::domain::types::{Platform, Strictness, WeekId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-platform file/row counters collected while reading input.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlatformActivity {
    pub files: usize,
    pub rows_read: usize,
    pub new_columns: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PlatformTotals {
    pub files: usize,
    pub rows_read: usize,
    /// Records accepted for merge.
    pub loaded: usize,
    pub rejected: usize,
    pub quantity: i64,
    pub revenue: f64,
    pub new_columns: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArticleTotals {
    pub quantity: i64,
    pub revenue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    pub week: WeekId,
    pub by_platform: BTreeMap<Platform, PlatformTotals>,
    pub by_article: BTreeMap<String, ArticleTotals>,
    /// Human-readable reason per rejected row, in source order.
    pub rejections: Vec<String>,
    pub unmatched_products: usize,
}

pub struct SummaryBuilder {
    strictness: Strictness,
}

impl SummaryBuilder {
    pub fn new(strictness: Strictness) -> Self {
        Self { strictness }
    }

    pub fn summarize(
        &self,
        batch: &WeeklyBatch,
        activity: &BTreeMap<Platform, PlatformActivity>,
        unmatched_products: usize,
    ) -> SummaryReport {
        let mut by_platform: BTreeMap<Platform, PlatformTotals> = BTreeMap::new();
        let mut by_article: BTreeMap<String, ArticleTotals> = BTreeMap::new();
        let mut rejections = Vec::new();

        for (platform, counters) in activity {
            let totals = by_platform.entry(*platform).or_default();
            totals.files = counters.files;
            totals.rows_read = counters.rows_read;
            totals.new_columns = counters.new_columns;
        }

        for failure in &batch.failures {
            by_platform.entry(failure.platform).or_default().rejected += 1;
            rejections.push(failure.to_string());
        }

        for outcome in &batch.outcomes {
            let totals = by_platform.entry(outcome.record.platform).or_default();
            if outcome.blocks_merge(self.strictness) {
                totals.rejected += 1;
                let reasons: Vec<String> =
                    outcome.violations.iter().map(|v| v.to_string()).collect();
                rejections.push(format!(
                    "{} row ({}, {}): {}",
                    outcome.record.source_file,
                    outcome.record.platform,
                    outcome.record.article,
                    reasons.join("; ")
                ));
                continue;
            }
            totals.loaded += 1;
            totals.quantity += outcome.record.quantity;
            totals.revenue += outcome.record.revenue;

            let article = by_article.entry(outcome.record.article.clone()).or_default();
            article.quantity += outcome.record.quantity;
            article.revenue += outcome.record.revenue;
        }

        SummaryReport {
            week: batch.week,
            by_platform,
            by_article,
            rejections,
            unmatched_products,
        }
    }
}

impl SummaryReport {
    pub fn total_loaded(&self) -> usize {
        self.by_platform.values().map(|t| t.loaded).sum()
    }

    pub fn total_rejected(&self) -> usize {
        self.by_platform.values().map(|t| t.rejected).sum()
    }

    /// Render the run summary document.
    pub fn to_markdown(&self, merge: &MergeResult, info: &RunBatchInfo) -> String {
        let mut lines = vec![
            "# Run Summary".to_string(),
            String::new(),
            format!("- Week: {}", self.week),
            format!("- Batch: {}", info.batch_id),
            format!("- Started: {}", info.started_at.format("%Y-%m-%d %H:%M:%S")),
            format!("- Strictness: {}", info.strictness),
            format!("- Dry run: {}", info.dry_run),
            String::new(),
            "## Platforms".to_string(),
            String::new(),
            "| Platform | Files | Rows | Loaded | Rejected | Quantity | Revenue | New columns |"
                .to_string(),
            "|---|---|---|---|---|---|---|---|".to_string(),
        ];
        for (platform, totals) in &self.by_platform {
            lines.push(format!(
                "| {} | {} | {} | {} | {} | {} | {:.2} | {} |",
                platform,
                totals.files,
                totals.rows_read,
                totals.loaded,
                totals.rejected,
                totals.quantity,
                totals.revenue,
                totals.new_columns
            ));
        }
        lines.extend([
            String::new(),
            "## Merge".to_string(),
            String::new(),
            format!("- Inserted: {}", merge.inserted),
            format!("- Updated: {}", merge.updated),
            format!("- Rejected: {}", merge.rejected),
            format!("- Unmatched products: {}", self.unmatched_products),
            format!("- Elapsed: {} ms", info.elapsed_ms),
        ]);
        if !self.rejections.is_empty() {
            lines.push(String::new());
            lines.push("## Rejections".to_string());
            lines.push(String::new());
            for reason in &self.rejections {
                lines.push(format!("- {}", reason));
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{CanonicalRecord, ValidationOutcome, Violation};
    use crate::domain::types::WeekWindow;
    use chrono::NaiveDate;

    fn outcome(
        platform: Platform,
        article: &str,
        qty: i64,
        rev: f64,
        violations: Vec<Violation>,
    ) -> ValidationOutcome {
        ValidationOutcome {
            record: CanonicalRecord {
                platform,
                article: article.to_string(),
                store_sku: None,
                week: WeekId(202536),
                quantity: qty,
                revenue: rev,
                product_name: None,
                flagged: false,
                source_file: "sales.csv".to_string(),
            },
            violations,
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

    #[test]
    fn test_totals_grouped_by_platform_and_article() {
        let builder = SummaryBuilder::new(Strictness::Strict);
        let report = builder.summarize(
            &batch(vec![
                outcome(Platform::Ozon, "1000-100-10", 5, 500.0, vec![]),
                outcome(Platform::Ozon, "1000-100-11", 3, 300.0, vec![]),
                outcome(Platform::Wildberries, "1000-100-10", 2, 200.0, vec![]),
                outcome(Platform::Ozon, "", 9, 900.0, vec![Violation::ArticleMissing]),
            ]),
            &BTreeMap::new(),
            0,
        );

        let ozon = &report.by_platform[&Platform::Ozon];
        assert_eq!(ozon.loaded, 2);
        assert_eq!(ozon.rejected, 1);
        assert_eq!(ozon.quantity, 8);
        assert_eq!(report.by_article["1000-100-10"].quantity, 7);
        assert_eq!(report.total_loaded(), 3);
        assert_eq!(report.total_rejected(), 1);
        assert_eq!(report.rejections.len(), 1);
    }

    #[test]
    fn test_summary_invariant_to_row_order() {
        let builder = SummaryBuilder::new(Strictness::Strict);
        let rows = vec![
            outcome(Platform::Ozon, "1000-100-10", 5, 500.0, vec![]),
            outcome(Platform::Wildberries, "1000-100-11", 3, 300.0, vec![]),
            outcome(Platform::YandexMarket, "1000-100-12", 2, 200.0, vec![]),
        ];
        let mut reversed = rows.clone();
        reversed.reverse();

        let a = builder.summarize(&batch(rows), &BTreeMap::new(), 0);
        let b = builder.summarize(&batch(reversed), &BTreeMap::new(), 0);

        assert_eq!(
            serde_json::to_value(&a.by_platform).unwrap(),
            serde_json::to_value(&b.by_platform).unwrap()
        );
        assert_eq!(
            serde_json::to_value(&a.by_article).unwrap(),
            serde_json::to_value(&b.by_article).unwrap()
        );
    }

    #[test]
    fn test_markdown_contains_counts() {
        let builder = SummaryBuilder::new(Strictness::Strict);
        let report = builder.summarize(
            &batch(vec![outcome(Platform::Ozon, "1000-100-10", 5, 500.0, vec![])]),
            &BTreeMap::new(),
            0,
        );
        let info = RunBatchInfo {
            batch_id: "test-batch".to_string(),
            week: WeekId(202536),
            started_at: chrono::Utc::now(),
            dry_run: false,
            strictness: Strictness::Strict,
            total_rows: 1,
            elapsed_ms: 12,
        };
        let merge = MergeResult {
            inserted: 1,
            updated: 0,
            rejected: 0,
        };
        let text = report.to_markdown(&merge, &info);
        assert!(text.contains("| ozon | "));
        assert!(text.contains("- Inserted: 1"));
        assert!(text.contains("202536"));
    }
}
