// ==========================================
// Marketplace sales ETL - CLI entry point
// ==========================================

use clap::Parser;
use sales_etl::{
    logging, FileReportSink, JsonDatasetStore, JsonMappingSource, Platform, RunParams, Strictness,
    UniversalRowReader, WeekImporter,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "sales-etl")]
#[command(about = "Weekly marketplace sales consolidation")]
#[command(version)]
struct Args {
    /// First day of the reporting week (YYYY-MM-DD)
    #[arg(long)]
    start: chrono::NaiveDate,

    /// Last day of the reporting period (default: start + 6 days)
    #[arg(long)]
    end: Option<chrono::NaiveDate>,

    /// Week token override, YYYYWW (default: ISO week of start)
    #[arg(long)]
    week: Option<sales_etl::WeekId>,

    /// Platforms to process (default: all)
    #[arg(long, value_delimiter = ',')]
    platforms: Vec<Platform>,

    /// Reject rows with missing or malformed article codes
    #[arg(long)]
    strict: bool,

    /// Compute merge counts without touching the master dataset
    #[arg(long)]
    dry_run: bool,

    /// Also export the merged dataset as CSV (skipped on dry runs)
    #[arg(long)]
    export: bool,

    /// Accept matched negative quantity/revenue pairs (refund weeks)
    #[arg(long)]
    allow_returns: bool,

    /// Directory with one subdirectory of exports per platform
    #[arg(long, env = "SALES_ETL_INPUT_DIR")]
    input_dir: PathBuf,

    /// Master dataset snapshot file
    #[arg(long, default_value = "master_dataset.json", env = "SALES_ETL_DATASET")]
    dataset: PathBuf,

    /// Directory for the run summary and exports
    #[arg(long, default_value = "reports", env = "SALES_ETL_OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Column mapping file (default: built-in tables)
    #[arg(long)]
    mapping: Option<PathBuf>,

    /// Product catalog CSV for name enrichment
    #[arg(long)]
    catalog: Option<PathBuf>,
}

fn run(args: Args) -> sales_etl::EtlResult<()> {
    let params = RunParams {
        start: args.start,
        end: args.end,
        week: args.week,
        platforms: if args.platforms.is_empty() {
            Platform::ALL.to_vec()
        } else {
            args.platforms
        },
        strictness: if args.strict {
            Strictness::Strict
        } else {
            Strictness::Lenient
        },
        dry_run: args.dry_run,
        export_dataset: args.export,
        returns_allowed: args.allow_returns,
        input_dir: args.input_dir,
        catalog_path: args.catalog,
    };

    let importer = WeekImporter::new(
        JsonDatasetStore::new(args.dataset),
        Box::new(UniversalRowReader),
        Box::new(FileReportSink::new(args.output_dir)),
        &JsonMappingSource::new(args.mapping),
    )?;

    let report = importer.run(&params)?;
    info!(
        week = %report.info.week,
        inserted = report.merge.inserted,
        updated = report.merge.updated,
        rejected = report.merge.rejected,
        dataset_records = report.dataset_len,
        report = %report.report_path.display(),
        "run complete"
    );
    Ok(())
}

fn main() -> ExitCode {
    logging::init();

    info!("{} v{}", sales_etl::APP_NAME, sales_etl::VERSION);

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "run failed");
            ExitCode::FAILURE
        }
    }
}
