// ==========================================
// Marketplace sales ETL - report output
// ==========================================
// Writes the markdown run summary and the optional flat CSV export of
// the master dataset into the output directory, named by week.
// ==========================================

use crate::domain::record::{CanonicalRecord, MergeResult, RunBatchInfo};
use crate::etl::error::{EtlError, EtlResult};
use crate::etl::summary::SummaryReport;
use crate::etl::week_importer_trait::ReportSink;
use std::path::PathBuf;
use tracing::info;

pub struct FileReportSink {
    output_dir: PathBuf,
}

impl FileReportSink {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    fn ensure_output_dir(&self) -> EtlResult<()> {
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| EtlError::ReportWrite(format!("{}: {}", self.output_dir.display(), e)))
    }
}

impl ReportSink for FileReportSink {
    fn write_report(
        &self,
        report: &SummaryReport,
        merge: &MergeResult,
        info: &RunBatchInfo,
    ) -> EtlResult<PathBuf> {
        self.ensure_output_dir()?;
        let path = self
            .output_dir
            .join(format!("run_summary_{}.md", report.week));
        std::fs::write(&path, report.to_markdown(merge, info))
            .map_err(|e| EtlError::ReportWrite(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "run summary written");
        Ok(path)
    }

    fn export_dataset(
        &self,
        records: &mut dyn Iterator<Item = &CanonicalRecord>,
        info: &RunBatchInfo,
    ) -> EtlResult<PathBuf> {
        self.ensure_output_dir()?;
        let path = self.output_dir.join(format!("master_{}.csv", info.week));

        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record([
            "platform",
            "article",
            "store_sku",
            "week",
            "quantity",
            "revenue",
            "product_name",
            "flagged",
            "source_file",
        ])?;
        let mut count = 0usize;
        for record in records {
            let week = record.week.to_string();
            let quantity = record.quantity.to_string();
            let revenue = format!("{:.2}", record.revenue);
            writer.write_record([
                record.platform.as_str(),
                record.article.as_str(),
                record.store_sku.as_deref().unwrap_or(""),
                week.as_str(),
                quantity.as_str(),
                revenue.as_str(),
                record.product_name.as_deref().unwrap_or(""),
                if record.flagged { "1" } else { "0" },
                record.source_file.as_str(),
            ])?;
            count += 1;
        }
        writer.flush().map_err(|e| EtlError::ReportWrite(e.to_string()))?;

        info!(path = %path.display(), records = count, "dataset exported");
        Ok(path)
    }
}
