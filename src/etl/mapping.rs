// ==========================================
// Marketplace sales ETL - declarative mapping registry
// ==========================================
// One rule table per platform translates its native column layout into
// canonical fields. New marketplaces are added as rule data, not code:
// a single generic interpreter (the normalizer) evaluates every table.
// ==========================================

use crate::domain::types::Platform;
use crate::etl::error::{EtlError, EtlResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// CanonicalField - target fields of a rule
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Article,
    StoreSku,
    Quantity,
    Revenue,
    Week,
    ProductName,
}

impl CanonicalField {
    pub const REQUIRED: [CanonicalField; 3] = [
        CanonicalField::Article,
        CanonicalField::Quantity,
        CanonicalField::Revenue,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CanonicalField::Article => "article",
            CanonicalField::StoreSku => "store_sku",
            CanonicalField::Quantity => "quantity",
            CanonicalField::Revenue => "revenue",
            CanonicalField::Week => "week",
            CanonicalField::ProductName => "product_name",
        }
    }

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }

    /// Default transform when the rule does not name one.
    pub fn default_transform(&self) -> Transform {
        match self {
            CanonicalField::Article => Transform::ArticleCode,
            CanonicalField::Quantity => Transform::Integer,
            CanonicalField::Revenue => Transform::Currency,
            CanonicalField::Week => Transform::DateToWeek,
            CanonicalField::StoreSku | CanonicalField::ProductName => Transform::Text,
        }
    }
}

// ==========================================
// ColumnLocator - where the source value lives
// ==========================================
// Either a list of acceptable header names (platforms rename columns
// between export versions, so aliases are first-class) or a 0-based
// position for headerless exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnLocator {
    Names(Vec<String>),
    Index(usize),
}

// ==========================================
// Transform - value coercion applied to the cell
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transform {
    /// Trim only.
    Text,
    /// Digits extracted and reformatted as NNNN-NNN-NN.
    ArticleCode,
    /// Integer count; empty and "-" coerce to 0.
    Integer,
    /// Decimal amount; comma decimal separator and currency suffixes
    /// tolerated; empty coerces to 0.
    Currency,
    /// Date in the cell, converted to its ISO year-week.
    DateToWeek,
}

// ==========================================
// MappingRule - one canonical field for one platform
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRule {
    pub field: CanonicalField,
    pub source: ColumnLocator,
    #[serde(default)]
    pub transform: Option<Transform>,
}

impl MappingRule {
    pub fn transform(&self) -> Transform {
        self.transform.unwrap_or_else(|| self.field.default_transform())
    }
}

// ==========================================
// MappingRegistry - immutable per-run rule tables
// ==========================================
// Built once at process start; construction fails fast when a required
// canonical field has zero or more than one rule for a platform, so no
// row is ever processed against a broken mapping.
#[derive(Debug, Clone)]
pub struct MappingRegistry {
    rules: HashMap<Platform, Vec<MappingRule>>,
}

impl MappingRegistry {
    pub fn new(rules: HashMap<Platform, Vec<MappingRule>>) -> EtlResult<Self> {
        for (platform, platform_rules) in &rules {
            Self::check_platform_rules(*platform, platform_rules)?;
        }
        Ok(Self { rules })
    }

    fn check_platform_rules(platform: Platform, rules: &[MappingRule]) -> EtlResult<()> {
        let mut counts: HashMap<CanonicalField, usize> = HashMap::new();
        for rule in rules {
            *counts.entry(rule.field).or_default() += 1;
        }
        for field in CanonicalField::REQUIRED {
            if counts.get(&field).copied().unwrap_or(0) == 0 {
                return Err(EtlError::InvalidMapping {
                    platform,
                    field: field.name().to_string(),
                    message: "required field has no mapping rule".to_string(),
                });
            }
        }
        // No field, required or optional, may be mapped twice.
        for (field, count) in counts {
            if count > 1 {
                return Err(EtlError::InvalidMapping {
                    platform,
                    field: field.name().to_string(),
                    message: format!("field has {} mapping rules, expected 1", count),
                });
            }
        }
        Ok(())
    }

    /// Rule table for one platform, in declaration order.
    pub fn rules_for(&self, platform: Platform) -> EtlResult<&[MappingRule]> {
        self.rules
            .get(&platform)
            .map(|r| r.as_slice())
            .ok_or_else(|| EtlError::UnknownPlatform(platform.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(field: CanonicalField, column: &str) -> MappingRule {
        MappingRule {
            field,
            source: ColumnLocator::Names(vec![column.to_string()]),
            transform: None,
        }
    }

    fn full_rules() -> Vec<MappingRule> {
        vec![
            rule(CanonicalField::Article, "Артикул"),
            rule(CanonicalField::Quantity, "Заказано, шт"),
            rule(CanonicalField::Revenue, "Заказано на сумму"),
        ]
    }

    #[test]
    fn test_registry_accepts_complete_rules() {
        let mut rules = HashMap::new();
        rules.insert(Platform::Ozon, full_rules());
        let registry = MappingRegistry::new(rules).unwrap();
        assert_eq!(registry.rules_for(Platform::Ozon).unwrap().len(), 3);
    }

    #[test]
    fn test_registry_rejects_missing_required_field() {
        let mut rules = HashMap::new();
        rules.insert(
            Platform::Ozon,
            vec![
                rule(CanonicalField::Article, "Артикул"),
                rule(CanonicalField::Quantity, "Заказано, шт"),
            ],
        );
        let err = MappingRegistry::new(rules).unwrap_err();
        assert!(matches!(err, EtlError::InvalidMapping { field, .. } if field == "revenue"));
    }

    #[test]
    fn test_registry_rejects_duplicate_rule() {
        let mut rules = full_rules();
        rules.push(rule(CanonicalField::Quantity, "Количество"));
        let mut map = HashMap::new();
        map.insert(Platform::Wildberries, rules);
        let err = MappingRegistry::new(map).unwrap_err();
        assert!(matches!(err, EtlError::InvalidMapping { field, .. } if field == "quantity"));
    }

    #[test]
    fn test_unknown_platform() {
        let mut rules = HashMap::new();
        rules.insert(Platform::Ozon, full_rules());
        let registry = MappingRegistry::new(rules).unwrap();
        let err = registry.rules_for(Platform::Wildberries).unwrap_err();
        assert!(matches!(err, EtlError::UnknownPlatform(_)));
    }

    #[test]
    fn test_default_transforms() {
        assert_eq!(
            rule(CanonicalField::Article, "x").transform(),
            Transform::ArticleCode
        );
        assert_eq!(
            rule(CanonicalField::Revenue, "x").transform(),
            Transform::Currency
        );
        let explicit = MappingRule {
            field: CanonicalField::Quantity,
            source: ColumnLocator::Index(2),
            transform: Some(Transform::Text),
        };
        assert_eq!(explicit.transform(), Transform::Text);
    }
}
