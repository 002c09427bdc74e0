// ==========================================
// Marketplace sales ETL - record validator
// ==========================================
// Rules are evaluated in a fixed order and every violation is collected,
// not just the first. Whether a violation blocks the merge is decided
// later, at merge time, against the run's strictness policy.
// ==========================================

use crate::domain::record::{CanonicalRecord, ValidationOutcome, Violation};
use crate::domain::types::WeekWindow;

// Canonical article shape: NNNN-NNN-NN.
fn article_shape_ok(article: &str) -> bool {
    let bytes = article.as_bytes();
    if bytes.len() != 11 {
        return false;
    }
    bytes.iter().enumerate().all(|(i, b)| match i {
        4 | 8 => *b == b'-',
        _ => b.is_ascii_digit(),
    })
}

pub struct Validator {
    window: WeekWindow,
    /// When set, a refund week may carry matching negative quantity and
    /// revenue; mixed signs are still rejected.
    returns_allowed: bool,
}

impl Validator {
    pub fn new(window: WeekWindow, returns_allowed: bool) -> Self {
        Self {
            window,
            returns_allowed,
        }
    }

    /// Evaluate all rules against one record.
    ///
    /// 1. Article code present and canonically shaped (policy-controlled).
    /// 2. Revenue finite; quantity/revenue signs consistent (always blocks).
    /// 3. Week inside the requested window (always blocks).
    pub fn validate(&self, record: &CanonicalRecord) -> ValidationOutcome {
        let mut violations = Vec::new();

        // Rule 1: article identifier
        if record.article.is_empty() {
            violations.push(Violation::ArticleMissing);
        } else if !article_shape_ok(&record.article) {
            violations.push(Violation::ArticleShape {
                value: record.article.clone(),
            });
        }

        // Rule 2: numeric sanity
        if !record.revenue.is_finite() {
            violations.push(Violation::RevenueNotFinite {
                value: record.revenue,
            });
        } else {
            let qty_neg = record.quantity < 0;
            let rev_neg = record.revenue < 0.0;
            if qty_neg != rev_neg && record.quantity != 0 && record.revenue != 0.0 {
                violations.push(Violation::SignMismatch {
                    quantity: record.quantity,
                    revenue: record.revenue,
                });
            } else if !self.returns_allowed {
                if qty_neg {
                    violations.push(Violation::NegativeQuantity {
                        quantity: record.quantity,
                    });
                }
                if rev_neg {
                    violations.push(Violation::NegativeRevenue {
                        revenue: record.revenue,
                    });
                }
            }
        }

        // Rule 3: reporting period
        if !self.window.contains_week(record.week) {
            violations.push(Violation::WeekOutOfRange {
                week: record.week,
                first: self.window.first_week(),
                last: self.window.last_week(),
            });
        }

        ValidationOutcome {
            record: record.clone(),
            violations,
        }
    }

    pub fn validate_all(&self, records: &[CanonicalRecord]) -> Vec<ValidationOutcome> {
        records.iter().map(|r| self.validate(r)).collect()
    }
}
