// ==========================================
// Marketplace sales ETL - core domain types
// ==========================================

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// Platform - source marketplace
// ==========================================
// Declaration order is the canonical merge order; batches are always
// merged platform by platform in this order so counts are reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Ozon,
    Wildberries,
    YandexMarket,
}

impl Platform {
    pub const ALL: [Platform; 3] = [
        Platform::Ozon,
        Platform::Wildberries,
        Platform::YandexMarket,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Ozon => "ozon",
            Platform::Wildberries => "wildberries",
            Platform::YandexMarket => "yandex_market",
        }
    }

    /// Directory name under the input root holding this platform's files.
    pub fn input_dir_name(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ozon" => Ok(Platform::Ozon),
            "wildberries" | "wb" => Ok(Platform::Wildberries),
            "yandex_market" | "yandex-market" | "yandex" | "ym" => Ok(Platform::YandexMarket),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

// ==========================================
// WeekId - ISO year-week token (YYYYWW)
// ==========================================
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct WeekId(pub u32);

impl WeekId {
    /// ISO week of the given date, e.g. 2025-09-01 -> 202536.
    pub fn from_date(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        WeekId(iso.year() as u32 * 100 + iso.week())
    }

    pub fn year(&self) -> u32 {
        self.0 / 100
    }

    pub fn week(&self) -> u32 {
        self.0 % 100
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06}", self.0)
    }
}

impl FromStr for WeekId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|_| format!("week must be YYYYWW, got: {}", s))?;
        if !(1..=53).contains(&(value % 100)) {
            return Err(format!("week number out of range in: {}", s));
        }
        Ok(WeekId(value))
    }
}

// ==========================================
// WeekWindow - requested reporting period
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl WeekWindow {
    /// End defaults to start + 6 days (one reporting week).
    pub fn new(start: NaiveDate, end: Option<NaiveDate>) -> Self {
        WeekWindow {
            start,
            end: end.unwrap_or(start + chrono::Duration::days(6)),
        }
    }

    pub fn first_week(&self) -> WeekId {
        WeekId::from_date(self.start)
    }

    pub fn last_week(&self) -> WeekId {
        WeekId::from_date(self.end)
    }

    pub fn contains_week(&self, week: WeekId) -> bool {
        week >= self.first_week() && week <= self.last_week()
    }
}

// ==========================================
// Strictness - article-code violation policy
// ==========================================
// The single policy knob the pipeline exposes: whether a record with a
// malformed article code is excluded from the merge or merged flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    Strict,
    #[default]
    Lenient,
}

impl fmt::Display for Strictness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strictness::Strict => write!(f, "strict"),
            Strictness::Lenient => write!(f, "lenient"),
        }
    }
}
