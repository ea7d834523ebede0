//! Optional per-run overrides, loaded from TOML by the CLI.

use serde::Deserialize;

use crate::period::YearMonth;

/// Key column for the channel pipeline.
pub const CHANNEL_KEY_COLUMN: &str = "Target";

/// Traffic-source columns expected in a channel export.
pub const DEFAULT_CHANNEL_COLUMNS: [&str; 8] = [
    "Direct",
    "Referral",
    "Organic Search",
    "Paid Search",
    "Organic Social",
    "Paid Social",
    "Email",
    "Display Ads",
];

pub const DEFAULT_KEYWORD_COLUMNS: [&str; 5] = [
    "Keyword",
    "Traffic",
    "Search Volume",
    "Timestamp",
    "Keyword Intents",
];

pub const DEFAULT_VALID_INTENTS: [&str; 4] = [
    "commercial",
    "informational",
    "transactional",
    "navigational",
];

pub const DEFAULT_BRAND_KEYWORDS: [&str; 2] = ["flavour blaster", "flavourblaster"];

/// Inclusive month window for the keyword pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct MonthRange {
    pub start: YearMonth,
    pub end: YearMonth,
}

/// All fields optional; a default config reproduces the built-in behavior.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisConfig {
    pub required_columns: Option<Vec<String>>,
    pub numeric_columns: Option<Vec<String>>,
    pub valid_intents: Option<Vec<String>>,
    pub brand_keywords: Option<Vec<String>>,
    pub date_range: Option<MonthRange>,
}

impl AnalysisConfig {
    pub fn channel_required_columns(&self) -> Vec<String> {
        self.required_columns.clone().unwrap_or_else(|| {
            std::iter::once(CHANNEL_KEY_COLUMN)
                .chain(DEFAULT_CHANNEL_COLUMNS)
                .map(String::from)
                .collect()
        })
    }

    pub fn channel_numeric_columns(&self) -> Vec<String> {
        self.numeric_columns
            .clone()
            .unwrap_or_else(|| DEFAULT_CHANNEL_COLUMNS.map(String::from).to_vec())
    }

    pub fn keyword_required_columns(&self) -> Vec<String> {
        self.required_columns
            .clone()
            .unwrap_or_else(|| DEFAULT_KEYWORD_COLUMNS.map(String::from).to_vec())
    }

    /// Accepted intent labels, normalized to lowercase.
    pub fn keyword_valid_intents(&self) -> Vec<String> {
        self.valid_intents
            .as_deref()
            .map(|intents| {
                intents
                    .iter()
                    .map(|i| i.trim().to_lowercase())
                    .collect()
            })
            .unwrap_or_else(|| DEFAULT_VALID_INTENTS.map(String::from).to_vec())
    }

    /// Substrings that mark a keyword as branded, normalized to lowercase.
    pub fn keyword_brand_terms(&self) -> Vec<String> {
        self.brand_keywords
            .as_deref()
            .map(|terms| terms.iter().map(|t| t.trim().to_lowercase()).collect())
            .unwrap_or_else(|| DEFAULT_BRAND_KEYWORDS.map(String::from).to_vec())
    }
}
