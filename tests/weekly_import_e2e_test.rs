// ==========================================
// E2E: weekly import over real files
// ==========================================
// Full pipeline with the production wiring: CSV fixtures on disk,
// JSON dataset snapshots, markdown reports.
// ==========================================

use chrono::NaiveDate;
use sales_etl::{
    logging, EtlResult, FileReportSink, JsonDatasetStore, JsonMappingSource, Platform, RunParams,
    RunReport, Strictness, UniversalRowReader, WeekImporter,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

struct Workspace {
    root: TempDir,
}

impl Workspace {
    fn new() -> Self {
        logging::init_test();
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    fn input_dir(&self) -> std::path::PathBuf {
        self.root.path().join("input")
    }

    fn write_export(&self, platform: &str, file: &str, content: &str) {
        let dir = self.input_dir().join(platform);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), content).unwrap();
    }

    fn params(&self) -> RunParams {
        RunParams {
            start: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            end: None,
            week: None,
            platforms: Platform::ALL.to_vec(),
            strictness: Strictness::Strict,
            dry_run: false,
            export_dataset: false,
            returns_allowed: false,
            input_dir: self.input_dir(),
            catalog_path: None,
        }
    }

    fn run(&self, params: &RunParams) -> EtlResult<RunReport> {
        fs::create_dir_all(self.input_dir()).unwrap();
        let importer = WeekImporter::new(
            JsonDatasetStore::new(self.root.path().join("master.json")),
            Box::new(UniversalRowReader),
            Box::new(FileReportSink::new(self.root.path().join("reports"))),
            &JsonMappingSource::new(None),
        )?;
        importer.run(params)
    }

    fn dataset_json(&self) -> serde_json::Value {
        let text = fs::read_to_string(self.root.path().join("master.json")).unwrap();
        serde_json::from_str(&text).unwrap()
    }
}

fn ozon_csv() -> &'static str {
    "Артикул,\"Заказано, шт\",Заказано на сумму\n\
     1000-100-10,5,500\n\
     1000-100-10,7,700\n"
}

#[test]
fn test_full_run_writes_dataset_and_report() {
    let ws = Workspace::new();
    ws.write_export("ozon", "sales.csv", ozon_csv());
    ws.write_export(
        "wildberries",
        "sales.csv",
        "Артикул поставщика;Выкупили, шт;К перечислению за товар\n\
         ;2;20\n",
    );

    let report = ws.run(&ws.params()).unwrap();

    // Duplicate Ozon key collapses to the later row; the WB row has no
    // article and is rejected under strict policy.
    assert_eq!(report.info.week.to_string(), "202536");
    assert_eq!(report.merge.inserted, 1);
    assert_eq!(report.merge.updated, 0);
    assert_eq!(report.merge.rejected, 1);
    assert_eq!(report.dataset_len, 1);

    let stored = &ws.dataset_json()[0];
    assert_eq!(stored["platform"], "ozon");
    assert_eq!(stored["article"], "1000-100-10");
    assert_eq!(stored["quantity"], 7);
    assert_eq!(stored["revenue"], 700.0);

    let summary = fs::read_to_string(&report.report_path).unwrap();
    assert!(summary.contains("# Run Summary"));
    assert!(summary.contains("202536"));
    assert!(summary.contains("- Rejected: 1"));
}

#[test]
fn test_rerun_of_same_week_is_idempotent() {
    let ws = Workspace::new();
    ws.write_export("ozon", "sales.csv", ozon_csv());

    let first = ws.run(&ws.params()).unwrap();
    let snapshot = ws.dataset_json();
    let second = ws.run(&ws.params()).unwrap();

    assert_eq!(first.merge.inserted, 1);
    assert_eq!(second.merge.inserted, 0);
    assert_eq!(second.merge.updated, 1);
    assert_eq!(ws.dataset_json(), snapshot);
}

#[test]
fn test_corrected_export_overwrites_same_key() {
    let ws = Workspace::new();
    ws.write_export(
        "ozon",
        "sales.csv",
        "Артикул,\"Заказано, шт\",Заказано на сумму\n1000-100-10,5,500\n",
    );
    ws.run(&ws.params()).unwrap();

    ws.write_export(
        "ozon",
        "sales.csv",
        "Артикул,\"Заказано, шт\",Заказано на сумму\n1000-100-10,6,612.34\n",
    );
    let report = ws.run(&ws.params()).unwrap();

    assert_eq!(report.merge.updated, 1);
    assert_eq!(report.dataset_len, 1);
    assert_eq!(ws.dataset_json()[0]["quantity"], 6);
}

#[test]
fn test_dry_run_leaves_no_dataset_behind() {
    let ws = Workspace::new();
    ws.write_export("ozon", "sales.csv", ozon_csv());

    let mut params = ws.params();
    params.dry_run = true;
    let report = ws.run(&params).unwrap();

    assert_eq!(report.merge.inserted, 1);
    assert!(!ws.root.path().join("master.json").exists());
    // The summary is still written so the numbers can be reviewed.
    assert!(report.report_path.exists());
}

#[test]
fn test_lenient_run_merges_flagged_articles() {
    let ws = Workspace::new();
    ws.write_export(
        "ozon",
        "sales.csv",
        "Артикул,\"Заказано, шт\",Заказано на сумму\nA100,5,500\n",
    );

    let mut params = ws.params();
    params.strictness = Strictness::Lenient;
    let report = ws.run(&params).unwrap();

    assert_eq!(report.merge.inserted, 1);
    assert_eq!(report.merge.rejected, 0);
    assert_eq!(ws.dataset_json()[0]["flagged"], true);
}

#[test]
fn test_export_produces_csv_of_dataset() {
    let ws = Workspace::new();
    ws.write_export("ozon", "sales.csv", ozon_csv());

    let mut params = ws.params();
    params.export_dataset = true;
    let report = ws.run(&params).unwrap();

    let export_path = report.export_path.unwrap();
    assert!(export_path.ends_with(Path::new("master_202536.csv")));
    let text = fs::read_to_string(export_path).unwrap();
    assert!(text.lines().next().unwrap().starts_with("platform,article"));
    assert!(text.contains("ozon,1000-100-10"));
}

#[test]
fn test_malformed_rows_do_not_sink_the_batch() {
    let ws = Workspace::new();
    ws.write_export(
        "ozon",
        "sales.csv",
        "Артикул,\"Заказано, шт\",Заказано на сумму\n\
         1000-100-10,abc,500\n\
         1000-100-11,3,300\n",
    );

    let report = ws.run(&ws.params()).unwrap();

    assert_eq!(report.merge.inserted, 1);
    assert_eq!(report.merge.rejected, 1);
    let summary = fs::read_to_string(&report.report_path).unwrap();
    assert!(summary.contains("## Rejections"));
    assert!(summary.contains("quantity"));
}

#[test]
fn test_empty_input_dir_is_a_clean_noop() {
    let ws = Workspace::new();
    let report = ws.run(&ws.params()).unwrap();

    assert_eq!(report.merge.inserted, 0);
    assert_eq!(report.merge.rejected, 0);
    assert_eq!(report.dataset_len, 0);
    assert!(report.report_path.exists());
}
