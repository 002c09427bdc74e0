// ==========================================
// Marketplace sales ETL - run configuration
// ==========================================
// Run parameters checked once before any file is touched, and the
// mapping source that supplies per-platform column rule tables either
// from a JSON file or from the built-in defaults.
// ==========================================

use crate::domain::types::{Platform, Strictness, WeekId, WeekWindow};
use crate::etl::error::{EtlError, EtlResult};
use crate::etl::mapping::{CanonicalField, ColumnLocator, MappingRule};
use crate::etl::week_importer_trait::MappingSource;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::info;

// ==========================================
// RunParams - one pipeline invocation
// ==========================================
#[derive(Debug, Clone)]
pub struct RunParams {
    pub start: NaiveDate,
    /// Defaults to six days after start (a full reporting week).
    pub end: Option<NaiveDate>,
    /// Week token override; derived from the start date when absent.
    pub week: Option<WeekId>,
    pub platforms: Vec<Platform>,
    pub strictness: Strictness,
    pub dry_run: bool,
    pub export_dataset: bool,
    pub returns_allowed: bool,
    pub input_dir: PathBuf,
    pub catalog_path: Option<PathBuf>,
}

impl RunParams {
    pub fn window(&self) -> WeekWindow {
        WeekWindow::new(self.start, self.end)
    }

    /// Week token of the run: the explicit override when given,
    /// otherwise the ISO week of the start date.
    pub fn week(&self) -> WeekId {
        self.week.unwrap_or_else(|| WeekId::from_date(self.start))
    }

    pub fn validate(&self) -> EtlResult<()> {
        if let Some(end) = self.end {
            if end < self.start {
                return Err(EtlError::InvalidParams(format!(
                    "end date {} precedes start date {}",
                    end, self.start
                )));
            }
        }
        if self.platforms.is_empty() {
            return Err(EtlError::InvalidParams(
                "no platforms selected".to_string(),
            ));
        }
        if !self.input_dir.is_dir() {
            return Err(EtlError::FileNotFound(
                self.input_dir.display().to_string(),
            ));
        }
        Ok(())
    }
}

// ==========================================
// JsonMappingSource - rule tables from disk
// ==========================================
// The file maps platform names to rule lists:
//   { "ozon": [ { "field": "article", "source": ["Артикул"] }, ... ] }
// Without a file the built-in tables for the three platforms apply.
pub struct JsonMappingSource {
    path: Option<PathBuf>,
}

impl JsonMappingSource {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

#[derive(Deserialize)]
struct MappingFile(HashMap<String, Vec<MappingRule>>);

impl MappingSource for JsonMappingSource {
    fn load_rules(&self) -> EtlResult<HashMap<Platform, Vec<MappingRule>>> {
        let Some(path) = &self.path else {
            info!("using built-in mapping tables");
            return Ok(builtin_rules());
        };
        let text = std::fs::read_to_string(path)?;
        let file: MappingFile = serde_json::from_str(&text)
            .map_err(|e| EtlError::InvalidParams(format!("mapping file: {}", e)))?;

        let mut rules = HashMap::new();
        for (name, platform_rules) in file.0 {
            let platform = Platform::from_str(&name)
                .map_err(|_| EtlError::UnknownPlatform(name.clone()))?;
            rules.insert(platform, platform_rules);
        }
        info!(path = %path.display(), platforms = rules.len(), "mapping tables loaded");
        Ok(rules)
    }
}

fn named(field: CanonicalField, aliases: &[&str]) -> MappingRule {
    MappingRule {
        field,
        source: ColumnLocator::Names(aliases.iter().map(|a| a.to_string()).collect()),
        transform: None,
    }
}

/// Default rule tables matching the column layouts the three
/// marketplaces currently export.
pub fn builtin_rules() -> HashMap<Platform, Vec<MappingRule>> {
    let mut rules = HashMap::new();
    rules.insert(
        Platform::Ozon,
        vec![
            named(CanonicalField::Article, &["Артикул", "articul", "Артикул продавца"]),
            named(CanonicalField::StoreSku, &["Ozon ID", "SKU"]),
            named(CanonicalField::Quantity, &["Заказано, шт", "Количество"]),
            named(CanonicalField::Revenue, &["Заказано на сумму", "Сумма заказов"]),
            named(CanonicalField::ProductName, &["Название товара", "Товар"]),
        ],
    );
    rules.insert(
        Platform::Wildberries,
        vec![
            named(CanonicalField::Article, &["Артикул поставщика", "Артикул продавца"]),
            named(CanonicalField::StoreSku, &["Код номенклатуры", "Артикул WB"]),
            named(CanonicalField::Quantity, &["Выкупили, шт", "Заказали, шт"]),
            named(CanonicalField::Revenue, &["К перечислению за товар", "Сумма продаж"]),
            named(CanonicalField::ProductName, &["Предмет", "Название"]),
        ],
    );
    rules.insert(
        Platform::YandexMarket,
        vec![
            named(CanonicalField::Article, &["Ваш SKU", "Артикул"]),
            named(CanonicalField::StoreSku, &["SKU на Маркете"]),
            named(CanonicalField::Quantity, &["Количество товаров", "Заказано, шт"]),
            named(CanonicalField::Revenue, &["Стоимость товаров", "Сумма"]),
            named(CanonicalField::ProductName, &["Название товара"]),
        ],
    );
    rules
}
