//! Keyword performance analysis: monthly reconciliation, intent explosion,
//! and branded vs non-branded classification.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use serde::Serialize;
use trafficlens_charts::{render_donut, render_grouped_bars, CategoryMatrix, LabelledSeries};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::ingest;
use crate::outcome::{AnalysisOutcome, Artifact, SummaryDateRange};
use crate::period::YearMonth;

const KEYWORD_COLUMN: &str = "Keyword";
const TRAFFIC_COLUMN: &str = "Traffic";
const VOLUME_COLUMN: &str = "Search Volume";
const TIMESTAMP_COLUMN: &str = "Timestamp";
const INTENTS_COLUMN: &str = "Keyword Intents";

const BRANDED: &str = "branded";
const NON_BRANDED: &str = "non-branded";

const TRAFFIC_BY_CATEGORY_PNG: &str = "traffic_by_category.png";
const BRANDED_SPLIT_PNG: &str = "branded_split.png";
const INTENT_DISTRIBUTION_PNG: &str = "intent_distribution.png";
const PROCESSED_CSV: &str = "keyword_analysis.csv";

#[derive(Debug, Clone, Serialize)]
pub struct KeywordSummary {
    pub total_keywords: usize,
    pub branded_traffic: i64,
    pub non_branded_traffic: i64,
    pub intent_breakdown: BTreeMap<String, i64>,
    pub date_range: SummaryDateRange,
}

/// One keyword observation after reconciliation and intent explosion.
#[derive(Debug, Clone)]
struct KeywordRow {
    keyword: String,
    month: YearMonth,
    traffic: i64,
    volume: i64,
    intent: String,
    category: &'static str,
}

pub fn run_analysis(
    input_file: &Path,
    output_dir: &Path,
    config: &AnalysisConfig,
) -> AnalysisOutcome<KeywordSummary> {
    let mut artifacts = Vec::new();
    match execute(input_file, output_dir, config, &mut artifacts) {
        Ok(summary) => AnalysisOutcome::completed(artifacts, summary),
        Err(err) => {
            tracing::warn!(input = %input_file.display(), error = %err, "keyword analysis failed");
            AnalysisOutcome::from_error(err, artifacts)
        }
    }
}

fn execute(
    input_file: &Path,
    output_dir: &Path,
    config: &AnalysisConfig,
    artifacts: &mut Vec<Artifact>,
) -> Result<KeywordSummary, AnalysisError> {
    let required = config.keyword_required_columns();
    let valid_intents: HashSet<String> = config.keyword_valid_intents().into_iter().collect();
    let brand_terms = config.keyword_brand_terms();

    let raw = ingest::read_csv_frame(input_file)?;
    let errors = validate(&raw, &required);
    if !errors.is_empty() {
        return Err(AnalysisError::Validation { errors });
    }

    let rows = clean(&raw, &valid_intents, &brand_terms)?;
    tracing::info!(rows = rows.len(), "cleaned keyword dataset");

    let (window_start, window_end) = month_window(config, &rows)?;
    let rows: Vec<KeywordRow> = rows
        .into_iter()
        .filter(|row| row.month >= window_start && row.month <= window_end)
        .collect();

    fs::create_dir_all(output_dir)?;
    let palette = trafficlens_charts::style::google_palette();

    let path = output_dir.join(TRAFFIC_BY_CATEGORY_PNG);
    render_grouped_bars(
        &path,
        "Branded vs Non-branded Traffic over time",
        "Year-Month",
        "Traffic",
        &monthly_category_matrix(&rows),
        &palette,
    )?;
    artifacts.push(Artifact::chart(output_dir, TRAFFIC_BY_CATEGORY_PNG));

    let category_totals = deduped_category_totals(&rows);
    let path = output_dir.join(BRANDED_SPLIT_PNG);
    render_donut(
        &path,
        "Branded vs Non-Branded Traffic",
        &to_slices(&category_totals),
        &palette,
    )?;
    artifacts.push(Artifact::chart(output_dir, BRANDED_SPLIT_PNG));

    let intent_totals = deduped_intent_totals(&rows);
    let path = output_dir.join(INTENT_DISTRIBUTION_PNG);
    render_donut(
        &path,
        "Traffic by Intent",
        &to_slices(&intent_totals),
        &palette,
    )?;
    artifacts.push(Artifact::chart(output_dir, INTENT_DISTRIBUTION_PNG));

    let summary = build_summary(
        &rows,
        &category_totals,
        intent_totals,
        window_start,
        window_end,
    );

    let mut frame = to_frame(&rows)?;
    ingest::write_csv_artifact(&mut frame, &output_dir.join(PROCESSED_CSV))?;
    artifacts.push(Artifact::csv(output_dir, PROCESSED_CSV));

    Ok(summary)
}

fn validate(df: &DataFrame, required: &[String]) -> Vec<String> {
    let mut errors = Vec::new();

    let present: HashSet<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
    let missing: Vec<&str> = required
        .iter()
        .map(String::as_str)
        .filter(|c| !present.contains(c))
        .collect();
    if !missing.is_empty() {
        errors.push(format!("Missing columns: {}", missing.join(", ")));
        return errors;
    }

    for name in [TRAFFIC_COLUMN, VOLUME_COLUMN] {
        if let Ok(column) = df.column(name) {
            if !ingest::is_numeric_dtype(column.dtype()) {
                errors.push(format!("'{name}' column must contain only numbers."));
            }
        }
    }

    if let Ok(column) = df.column(TIMESTAMP_COLUMN) {
        match column.str() {
            Ok(values) => {
                if let Some(bad) = values
                    .into_iter()
                    .flatten()
                    .find(|v| parse_timestamp(v).is_none())
                {
                    errors.push(format!(
                        "'{TIMESTAMP_COLUMN}' column contains invalid dates: unable to parse '{bad}'"
                    ));
                }
            }
            Err(_) => {
                if column.null_count() < column.len() {
                    errors.push(format!(
                        "'{TIMESTAMP_COLUMN}' column contains invalid dates: column is not text"
                    ));
                }
            }
        }
    }
    errors
}

/// Accepts RFC 3339 timestamps, naive datetimes with optional fractional
/// seconds, and bare `YYYY-MM-DD` dates.
fn parse_timestamp(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Normalizes, reconciles duplicate (keyword, month, intents) rows, then
/// explodes the comma-separated intents list into one row per valid intent.
fn clean(
    df: &DataFrame,
    valid_intents: &HashSet<String>,
    brand_terms: &[String],
) -> Result<Vec<KeywordRow>, AnalysisError> {
    let keywords = ingest::text_trimmed_lower(df.column(KEYWORD_COLUMN)?)?;
    let traffic = ingest::numeric_i64_lossy(df.column(TRAFFIC_COLUMN)?)?;
    let volume = ingest::numeric_i64_lossy(df.column(VOLUME_COLUMN)?)?;
    let timestamps = ingest::text_raw(df.column(TIMESTAMP_COLUMN)?)?;
    let intents = ingest::text_raw(df.column(INTENTS_COLUMN)?)?;

    let mut kw_col = Vec::new();
    let mut month_col = Vec::new();
    let mut intents_col = Vec::new();
    let mut traffic_col = Vec::new();
    let mut volume_col = Vec::new();
    for row in 0..df.height() {
        let Some(keyword) = &keywords[row] else {
            continue;
        };
        let Some(date) = timestamps[row].as_deref().and_then(parse_timestamp) else {
            continue;
        };
        kw_col.push(keyword.clone());
        month_col.push(YearMonth::from_date(date).to_string());
        intents_col.push(intents[row].clone().unwrap_or_default());
        traffic_col.push(traffic[row]);
        volume_col.push(volume[row]);
    }

    let interim = df!(
        KEYWORD_COLUMN => kw_col,
        "YearMonth" => month_col,
        INTENTS_COLUMN => intents_col,
        TRAFFIC_COLUMN => traffic_col,
        VOLUME_COLUMN => volume_col,
    )?;

    // Duplicate observations of the same keyword/month/intents triple are
    // summed for traffic and maxed for search volume, then ordered by
    // traffic and volume descending.
    let reconciled = interim
        .lazy()
        .group_by_stable([col(KEYWORD_COLUMN), col("YearMonth"), col(INTENTS_COLUMN)])
        .agg([col(TRAFFIC_COLUMN).sum(), col(VOLUME_COLUMN).max()])
        .sort(
            [TRAFFIC_COLUMN, VOLUME_COLUMN],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .collect()?;

    let keywords = reconciled.column(KEYWORD_COLUMN)?.str()?;
    let months = reconciled.column("YearMonth")?.str()?;
    let intent_lists = reconciled.column(INTENTS_COLUMN)?.str()?;
    let traffic = reconciled.column(TRAFFIC_COLUMN)?.i64()?;
    let volume = reconciled.column(VOLUME_COLUMN)?.i64()?;

    let mut rows = Vec::new();
    let mut dropped_intents = 0usize;
    for idx in 0..reconciled.height() {
        let (Some(keyword), Some(month), Some(intent_list)) =
            (keywords.get(idx), months.get(idx), intent_lists.get(idx))
        else {
            continue;
        };
        let month: YearMonth = month
            .parse()
            .map_err(|e| AnalysisError::Data(format!("internal period column: {e}")))?;
        let category = categorize(keyword, brand_terms);

        for part in intent_list.split(',') {
            let intent = part.trim().to_lowercase();
            if !valid_intents.contains(&intent) {
                if !intent.is_empty() {
                    dropped_intents += 1;
                }
                continue;
            }
            rows.push(KeywordRow {
                keyword: keyword.to_string(),
                month,
                traffic: traffic.get(idx).unwrap_or(0),
                volume: volume.get(idx).unwrap_or(0),
                intent,
                category,
            });
        }
    }

    if dropped_intents > 0 {
        tracing::warn!(count = dropped_intents, "discarded unrecognized intent labels");
    }
    Ok(rows)
}

fn categorize(keyword: &str, brand_terms: &[String]) -> &'static str {
    if brand_terms.iter().any(|term| keyword.contains(term.as_str())) {
        BRANDED
    } else {
        NON_BRANDED
    }
}

/// Configured window, or the six months ending at the latest observation.
fn month_window(
    config: &AnalysisConfig,
    rows: &[KeywordRow],
) -> Result<(YearMonth, YearMonth), AnalysisError> {
    if let Some(range) = &config.date_range {
        return Ok((range.start, range.end));
    }
    let end = rows
        .iter()
        .map(|row| row.month)
        .max()
        .ok_or_else(|| AnalysisError::Data("no keyword rows remain after cleaning".to_string()))?;
    Ok((end.minus_months(5), end))
}

fn monthly_category_matrix(rows: &[KeywordRow]) -> CategoryMatrix {
    let mut totals: BTreeMap<YearMonth, BTreeMap<&str, i64>> = BTreeMap::new();
    let mut categories: BTreeSet<&str> = BTreeSet::new();
    for row in rows {
        categories.insert(row.category);
        *totals
            .entry(row.month)
            .or_default()
            .entry(row.category)
            .or_insert(0) += row.traffic;
    }

    let months: Vec<YearMonth> = totals.keys().copied().collect();
    let series = categories
        .iter()
        .map(|category| {
            LabelledSeries::new(
                *category,
                months
                    .iter()
                    .map(|m| totals[m].get(category).copied().unwrap_or(0) as f64)
                    .collect(),
            )
        })
        .collect();
    CategoryMatrix::new(months.iter().map(YearMonth::to_string).collect(), series)
}

/// One observation per (keyword, month), highest-traffic row first, then
/// traffic summed per category.
fn deduped_category_totals(rows: &[KeywordRow]) -> BTreeMap<String, i64> {
    let mut seen = HashSet::new();
    let mut totals = BTreeMap::new();
    for row in rows {
        if seen.insert((row.keyword.as_str(), row.month)) {
            *totals.entry(row.category.to_string()).or_insert(0) += row.traffic;
        }
    }
    totals
}

fn deduped_intent_totals(rows: &[KeywordRow]) -> BTreeMap<String, i64> {
    let mut seen = HashSet::new();
    let mut totals = BTreeMap::new();
    for row in rows {
        if seen.insert((row.keyword.as_str(), row.month, row.intent.as_str())) {
            *totals.entry(row.intent.clone()).or_insert(0) += row.traffic;
        }
    }
    totals
}

fn to_slices(totals: &BTreeMap<String, i64>) -> Vec<(String, f64)> {
    totals
        .iter()
        .map(|(label, value)| (label.clone(), *value as f64))
        .collect()
}

fn build_summary(
    rows: &[KeywordRow],
    category_totals: &BTreeMap<String, i64>,
    intent_breakdown: BTreeMap<String, i64>,
    window_start: YearMonth,
    window_end: YearMonth,
) -> KeywordSummary {
    let unique_keywords: HashSet<&str> = rows.iter().map(|row| row.keyword.as_str()).collect();
    KeywordSummary {
        total_keywords: unique_keywords.len(),
        branded_traffic: category_totals.get(BRANDED).copied().unwrap_or(0),
        non_branded_traffic: category_totals.get(NON_BRANDED).copied().unwrap_or(0),
        intent_breakdown,
        date_range: SummaryDateRange {
            start: window_start.to_string(),
            end: window_end.to_string(),
        },
    }
}

fn to_frame(rows: &[KeywordRow]) -> Result<DataFrame, AnalysisError> {
    let keywords: Vec<&str> = rows.iter().map(|r| r.keyword.as_str()).collect();
    let months: Vec<String> = rows.iter().map(|r| r.month.to_string()).collect();
    let traffic: Vec<i64> = rows.iter().map(|r| r.traffic).collect();
    let volume: Vec<i64> = rows.iter().map(|r| r.volume).collect();
    let intents: Vec<&str> = rows.iter().map(|r| r.intent.as_str()).collect();
    let categories: Vec<&str> = rows.iter().map(|r| r.category).collect();

    let columns: Vec<Column> = vec![
        Series::new(KEYWORD_COLUMN.into(), keywords).into(),
        Series::new("YearMonth".into(), months).into(),
        Series::new(TRAFFIC_COLUMN.into(), traffic).into(),
        Series::new(VOLUME_COLUMN.into(), volume).into(),
        Series::new("Intent".into(), intents).into(),
        Series::new("Category".into(), categories).into(),
    ];
    DataFrame::new(columns).map_err(AnalysisError::from)
}
