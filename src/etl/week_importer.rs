// ==========================================
// Marketplace sales ETL - weekly import pipeline
// ==========================================
// Orchestrates one run end to end: discover and read the platform
// exports, normalize and validate each row, enrich from the product
// catalog, merge into the master dataset, then summarize. The dataset
// is committed only after every batch step succeeded; a dry run goes
// through the identical merge code against a scratch copy.
// ==========================================

use crate::config::RunParams;
use crate::domain::record::{MergeResult, RawRow, RunBatchInfo, WeeklyBatch};
use crate::domain::types::Platform;
use crate::etl::catalog::ProductCatalog;
use crate::etl::error::EtlResult;
use crate::etl::mapping::MappingRegistry;
use crate::etl::merger::BatchMerger;
use crate::etl::normalizer::{unmapped_columns, NormalizedRows, RowNormalizer};
use crate::etl::summary::{PlatformActivity, SummaryBuilder, SummaryReport};
use crate::etl::validator::Validator;
use crate::etl::week_importer_trait::{DatasetStore, MappingSource, ReportSink, RowReader};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Everything one run produced, for the caller and for tests.
#[derive(Debug)]
pub struct RunReport {
    pub info: RunBatchInfo,
    pub merge: MergeResult,
    pub summary: SummaryReport,
    pub report_path: PathBuf,
    pub export_path: Option<PathBuf>,
    pub dataset_len: usize,
}

pub struct WeekImporter<S: DatasetStore> {
    store: S,
    reader: Box<dyn RowReader>,
    sink: Box<dyn ReportSink>,
    registry: MappingRegistry,
}

impl<S: DatasetStore> WeekImporter<S> {
    /// Wire the pipeline. Mapping tables are loaded and checked here, so
    /// a broken mapping fails the run before any file is read.
    pub fn new(
        store: S,
        reader: Box<dyn RowReader>,
        sink: Box<dyn ReportSink>,
        mappings: &dyn MappingSource,
    ) -> EtlResult<Self> {
        let registry = MappingRegistry::new(mappings.load_rules()?)?;
        Ok(Self {
            store,
            reader,
            sink,
            registry,
        })
    }

    pub fn run(&self, params: &RunParams) -> EtlResult<RunReport> {
        params.validate()?;
        let started = Instant::now();
        let started_at = chrono::Utc::now();
        let batch_id = Uuid::new_v4().to_string();
        let week = params.week();
        let window = params.window();

        info!(
            batch_id = %batch_id,
            week = %week,
            input_dir = %params.input_dir.display(),
            dry_run = params.dry_run,
            "weekly import started"
        );

        debug!("step 1: load master dataset");
        let mut dataset = self.store.load()?;
        info!(records = dataset.len(), "master dataset loaded");

        debug!("step 2: read and normalize platform files");
        let normalizer = RowNormalizer::new(week);
        let mut normalized = NormalizedRows::default();
        let mut activity: BTreeMap<Platform, PlatformActivity> = BTreeMap::new();
        let mut total_rows = 0usize;

        // Platforms are visited in canonical declaration order so the
        // run is reproducible whatever order the caller listed them in.
        for platform in Platform::ALL {
            if !params.platforms.contains(&platform) {
                continue;
            }
            let rules = self.registry.rules_for(platform)?;
            let files = self.reader.discover_files(&params.input_dir, platform)?;
            if files.is_empty() {
                warn!(platform = %platform, "no input files found");
            }

            let counters = activity.entry(platform).or_default();
            let mut seen_columns: BTreeSet<String> = BTreeSet::new();
            for path in &files {
                let rows = self.reader.read_rows(path, platform)?;
                info!(platform = %platform, file = %path.display(), rows = rows.len(), "file read");
                counters.files += 1;
                counters.rows_read += rows.len();
                total_rows += rows.len();

                if let Some(first) = rows.first() {
                    let labels: Vec<String> = first.labels().map(str::to_string).collect();
                    for label in unmapped_columns(&labels, rules) {
                        seen_columns.insert(label);
                    }
                }
                self.collect(&mut normalized, &normalizer, &rows, rules);
            }
            counters.new_columns = seen_columns.len();
            if !seen_columns.is_empty() {
                info!(
                    platform = %platform,
                    columns = ?seen_columns,
                    "source columns without a mapping rule"
                );
            }
        }
        info!(
            records = normalized.records.len(),
            failures = normalized.failures.len(),
            "normalization complete"
        );

        debug!("step 3: product catalog enrichment");
        let unmatched_products = match &params.catalog_path {
            Some(path) => {
                let catalog = ProductCatalog::load(path)?;
                catalog.apply(&mut normalized.records)
            }
            None => 0,
        };

        debug!("step 4: validate records");
        let validator = Validator::new(window, params.returns_allowed);
        let outcomes = validator.validate_all(&normalized.records);
        let flawed = outcomes.iter().filter(|o| !o.is_valid()).count();
        info!(records = outcomes.len(), flawed = flawed, "validation complete");

        let batch = WeeklyBatch {
            week,
            window,
            outcomes,
            failures: normalized.failures,
        };

        debug!("step 5: merge into master dataset");
        let merger = BatchMerger::new(params.strictness);
        let merge = if params.dry_run {
            merger.dry_run(&dataset, &batch)
        } else {
            merger.merge(&mut dataset, &batch)
        };

        debug!("step 6: build run summary");
        let summary =
            SummaryBuilder::new(params.strictness).summarize(&batch, &activity, unmatched_products);

        let info = RunBatchInfo {
            batch_id,
            week,
            started_at,
            dry_run: params.dry_run,
            strictness: params.strictness,
            total_rows,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };

        debug!("step 7: write report");
        let report_path = self.sink.write_report(&summary, &merge, &info)?;
        // Export only what was actually committed; a dry run merges into
        // a scratch copy, so there is no new dataset state to export.
        let export_path = if params.export_dataset && !params.dry_run {
            Some(self.sink.export_dataset(&mut dataset.records(), &info)?)
        } else {
            if params.export_dataset {
                warn!("dry run, dataset export skipped");
            }
            None
        };

        if params.dry_run {
            info!("dry run, master dataset not committed");
        } else {
            debug!("step 8: commit master dataset");
            self.store.commit(&dataset)?;
            info!(records = dataset.len(), "master dataset committed");
        }

        info!(
            batch_id = %info.batch_id,
            inserted = merge.inserted,
            updated = merge.updated,
            rejected = merge.rejected,
            elapsed_ms = info.elapsed_ms,
            "weekly import finished"
        );

        Ok(RunReport {
            info,
            merge,
            summary,
            report_path,
            export_path,
            dataset_len: dataset.len(),
        })
    }

    fn collect(
        &self,
        out: &mut NormalizedRows,
        normalizer: &RowNormalizer,
        rows: &[RawRow],
        rules: &[crate::etl::mapping::MappingRule],
    ) {
        let mut result = normalizer.normalize_rows(rows, rules);
        out.records.append(&mut result.records);
        out.failures.append(&mut result.failures);
    }
}
