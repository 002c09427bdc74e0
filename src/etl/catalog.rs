// ==========================================
// Marketplace sales ETL - product catalog enrichment
// ==========================================
// Optional lookup of product names by article code, loaded from a CSV
// catalog. Records with no catalog entry keep their source-provided
// name (or none) and are counted, not rejected.
// ==========================================

use crate::domain::record::CanonicalRecord;
use crate::etl::error::EtlResult;
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default)]
pub struct ProductCatalog {
    names: HashMap<String, String>,
}

impl ProductCatalog {
    /// Load an article -> product name catalog from a CSV file with
    /// `article` and `name` columns (header required, extra columns
    /// ignored). Later duplicates of an article win.
    pub fn load(path: &Path) -> EtlResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let headers = reader.headers()?.clone();
        let article_col = headers.iter().position(|h| h.eq_ignore_ascii_case("article"));
        let name_col = headers.iter().position(|h| h.eq_ignore_ascii_case("name"));

        let mut names = HashMap::new();
        if let (Some(article_col), Some(name_col)) = (article_col, name_col) {
            for row in reader.records() {
                let row = row?;
                let article = row.get(article_col).unwrap_or_default().trim();
                let name = row.get(name_col).unwrap_or_default().trim();
                if !article.is_empty() && !name.is_empty() {
                    names.insert(article.to_string(), name.to_string());
                }
            }
        } else {
            warn!(path = %path.display(), "catalog has no article/name columns, skipping");
        }

        info!(path = %path.display(), entries = names.len(), "product catalog loaded");
        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name_for(&self, article: &str) -> Option<&str> {
        self.names.get(article).map(String::as_str)
    }

    /// Fill in product names on records that lack one, returning how
    /// many records found no catalog match. Names already present from
    /// the source file are never overwritten.
    pub fn apply(&self, records: &mut [CanonicalRecord]) -> usize {
        let mut unmatched = 0;
        for record in records.iter_mut() {
            match self.name_for(&record.article) {
                Some(name) => {
                    if record.product_name.is_none() {
                        record.product_name = Some(name.to_string());
                    }
                }
                None => unmatched += 1,
            }
        }
        unmatched
    }
}
