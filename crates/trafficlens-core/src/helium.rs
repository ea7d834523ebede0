//! Helium time-series analysis: six SEO metrics sampled across dated
//! columns, rolled up to monthly totals over the last year of data.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::Serialize;
use trafficlens_charts::{render_dual_axis_lines, render_multi_lines, LabelledSeries};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::ingest;
use crate::outcome::{AnalysisOutcome, Artifact, SummaryDateRange};
use crate::period::YearMonth;

const METRIC_COLUMN: &str = "Metric";
const EXPECTED_ROWS: usize = 6;
const MIN_DATE_COLUMNS: usize = 3;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Lowercase label in the export paired with the canonical display name.
const REQUIRED_METRICS: [(&str, &str); 6] = [
    ("organic traffic", "Organic Traffic"),
    ("organic keywords", "Organic Keywords"),
    ("organic traffic cost", "Organic Traffic Cost"),
    ("paid traffic", "Paid Traffic"),
    ("paid keywords", "Paid Keywords"),
    ("paid traffic cost", "Paid Traffic Cost"),
];

const ORGANIC_CHART_PNG: &str = "organic_traffic_vs_keywords.png";
const PAID_CHART_PNG: &str = "paid_metrics.png";
const PROCESSED_CSV: &str = "processed_monthly_data.csv";

#[derive(Debug, Clone, Serialize)]
pub struct HeliumSummary {
    pub total_organic_traffic: i64,
    pub total_paid_traffic: i64,
    pub avg_monthly_organic: f64,
    pub avg_monthly_paid: f64,
    pub date_range: SummaryDateRange,
}

pub fn run_analysis(
    input_file: &Path,
    output_dir: &Path,
    _config: &AnalysisConfig,
) -> AnalysisOutcome<HeliumSummary> {
    let mut artifacts = Vec::new();
    match execute(input_file, output_dir, &mut artifacts) {
        Ok(summary) => AnalysisOutcome::completed(artifacts, summary),
        Err(err) => {
            tracing::warn!(input = %input_file.display(), error = %err, "helium analysis failed");
            AnalysisOutcome::from_error(err, artifacts)
        }
    }
}

fn execute(
    input_file: &Path,
    output_dir: &Path,
    artifacts: &mut Vec<Artifact>,
) -> Result<HeliumSummary, AnalysisError> {
    let raw = ingest::read_csv_frame(input_file)?;
    let errors = validate(&raw);
    if !errors.is_empty() {
        return Err(AnalysisError::Validation { errors });
    }

    let table = reshape(&raw)?;
    tracing::info!(
        months = table.months.len(),
        start = %table.window_start,
        end = %table.window_end,
        "built monthly metric table"
    );

    fs::create_dir_all(output_dir)?;

    let x_labels: Vec<String> = table.months.iter().map(YearMonth::to_string).collect();
    let organic_traffic = table.series("Organic Traffic")?;
    let organic_keywords = table.series("Organic Keywords")?;
    let paid_traffic = table.series("Paid Traffic")?;
    let paid_cost = table.series("Paid Traffic Cost")?;
    let paid_keywords = table.series("Paid Keywords")?;

    let path = output_dir.join(ORGANIC_CHART_PNG);
    render_dual_axis_lines(
        &path,
        "Organic Traffic vs Organic Keywords",
        &x_labels,
        &organic_traffic,
        &organic_keywords,
        trafficlens_charts::style::BRAND_NAVY,
        trafficlens_charts::style::BRAND_RED,
    )?;
    artifacts.push(Artifact::chart(output_dir, ORGANIC_CHART_PNG));

    let path = output_dir.join(PAID_CHART_PNG);
    render_multi_lines(
        &path,
        "Paid Traffic, Paid Traffic Cost vs Paid Keywords",
        "Value",
        &x_labels,
        &[paid_traffic.clone(), paid_cost, paid_keywords],
        &trafficlens_charts::style::helium_palette(),
    )?;
    artifacts.push(Artifact::chart(output_dir, PAID_CHART_PNG));

    let summary = build_summary(&table, &organic_traffic, &paid_traffic);

    let mut frame = table.to_frame()?;
    ingest::write_csv_artifact(&mut frame, &output_dir.join(PROCESSED_CSV))?;
    artifacts.push(Artifact::csv(output_dir, PROCESSED_CSV));

    Ok(summary)
}

fn validate(df: &DataFrame) -> Vec<String> {
    let mut errors = Vec::new();

    if df.height() != EXPECTED_ROWS {
        errors.push(format!(
            "File must have exactly {EXPECTED_ROWS} rows, but it has {}.",
            df.height()
        ));
    }

    let names: Vec<&str> = df.get_column_names().iter().map(|n| n.as_str()).collect();
    if !names.contains(&METRIC_COLUMN) {
        errors.push(format!(
            "File is missing the required '{METRIC_COLUMN}' column."
        ));
    }

    let date_columns: Vec<&str> = names
        .iter()
        .copied()
        .filter(|n| parse_column_date(n).is_some())
        .collect();
    if date_columns.len() < MIN_DATE_COLUMNS {
        errors.push(format!(
            "File must have at least {MIN_DATE_COLUMNS} date columns in format 'YYYY-MM-DD', but found {}.",
            date_columns.len()
        ));
    }
    if !errors.is_empty() {
        return errors;
    }

    let metric = match df.column(METRIC_COLUMN) {
        Ok(column) => column,
        Err(_) => return errors,
    };
    let labels = match metric.str() {
        Ok(labels) => labels,
        Err(_) => {
            errors.push(format!(
                "'{METRIC_COLUMN}' column must contain text/string data."
            ));
            return errors;
        }
    };

    let found: HashSet<String> = labels
        .into_iter()
        .flatten()
        .map(str::to_lowercase)
        .collect();
    let required: HashSet<&str> = REQUIRED_METRICS.iter().map(|(lower, _)| *lower).collect();

    let mut missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|m| !found.contains(*m))
        .collect();
    missing.sort_unstable();
    if !missing.is_empty() {
        errors.push(format!("Missing required metrics: {}", missing.join(", ")));
    }

    let mut extra: Vec<&str> = found
        .iter()
        .map(String::as_str)
        .filter(|m| !required.contains(*m))
        .collect();
    extra.sort_unstable();
    if !extra.is_empty() {
        errors.push(format!("Invalid metrics found: {}", extra.join(", ")));
    }
    if !errors.is_empty() {
        return errors;
    }

    let mut non_integer: Vec<&str> = Vec::new();
    for name in date_columns {
        if let Ok(column) = df.column(name) {
            if column.dtype() != &DataType::Int64 {
                non_integer.push(name);
            }
        }
    }
    if !non_integer.is_empty() {
        errors.push(format!(
            "Non-integer values in date columns: {}",
            non_integer.join(", ")
        ));
    }
    errors
}

fn parse_column_date(name: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(name, DATE_FORMAT).ok()
}

/// Monthly totals per metric over the final year of observations.
struct MonthlyTable {
    months: Vec<YearMonth>,
    /// Canonical metric names in alphabetical order.
    metrics: Vec<String>,
    /// Metric -> totals aligned with `months`.
    values: BTreeMap<String, Vec<i64>>,
    window_start: NaiveDate,
    window_end: NaiveDate,
}

fn reshape(df: &DataFrame) -> Result<MonthlyTable, AnalysisError> {
    let canonical: BTreeMap<&str, &str> = REQUIRED_METRICS.iter().copied().collect();
    let labels = df.column(METRIC_COLUMN)?.str()?;
    let row_metrics: Vec<Option<String>> = labels
        .into_iter()
        .map(|label| {
            label
                .and_then(|l| canonical.get(l.to_lowercase().as_str()).copied())
                .map(str::to_string)
        })
        .collect();

    // Keep dated columns with at least one non-zero observation.
    let mut observations: Vec<(NaiveDate, Vec<i64>)> = Vec::new();
    for column in df.get_columns() {
        let Some(date) = parse_column_date(column.name().as_str()) else {
            continue;
        };
        let values: Vec<i64> = column.i64()?.into_iter().map(|v| v.unwrap_or(0)).collect();
        if values.iter().all(|v| *v == 0) {
            tracing::debug!(column = %date, "dropping all-zero date column");
            continue;
        }
        observations.push((date, values));
    }

    let window_end = observations
        .iter()
        .map(|(date, _)| *date)
        .max()
        .ok_or_else(|| {
            AnalysisError::Data("no date columns with non-zero data remain".to_string())
        })?;
    let window_start = one_year_before(window_end);

    let mut monthly: BTreeMap<YearMonth, BTreeMap<String, i64>> = BTreeMap::new();
    for (date, values) in &observations {
        if *date < window_start || *date > window_end {
            continue;
        }
        let month = YearMonth::from_date(*date);
        let bucket = monthly.entry(month).or_default();
        for (row, value) in values.iter().enumerate() {
            if let Some(metric) = &row_metrics[row] {
                *bucket.entry(metric.clone()).or_insert(0) += value;
            }
        }
    }

    // Every calendar month between the first and last observation gets a
    // row; months without samples stay at zero.
    let months: Vec<YearMonth> = match (
        monthly.keys().next().copied(),
        monthly.keys().next_back().copied(),
    ) {
        (Some(first), Some(last)) => {
            let mut months = Vec::new();
            let mut month = first;
            while month <= last {
                months.push(month);
                month = month.plus_months(1);
            }
            months
        }
        _ => Vec::new(),
    };

    let metrics: Vec<String> = canonical.values().map(|m| m.to_string()).collect();
    let mut values: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    for metric in &metrics {
        let series = months
            .iter()
            .map(|month| {
                monthly
                    .get(month)
                    .and_then(|bucket| bucket.get(metric))
                    .copied()
                    .unwrap_or(0)
            })
            .collect();
        values.insert(metric.clone(), series);
    }

    Ok(MonthlyTable {
        months,
        metrics,
        values,
        window_start,
        window_end,
    })
}

fn one_year_before(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year() - 1, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(date.year() - 1, date.month(), 28))
        .unwrap_or(date)
}

impl MonthlyTable {
    fn series(&self, metric: &str) -> Result<LabelledSeries, AnalysisError> {
        let values = self.values.get(metric).ok_or_else(|| {
            AnalysisError::Data(format!("metric '{metric}' absent after reshaping"))
        })?;
        Ok(LabelledSeries::new(
            metric,
            values.iter().map(|v| *v as f64).collect(),
        ))
    }

    fn to_frame(&self) -> Result<DataFrame, AnalysisError> {
        let dates: Vec<String> = self
            .months
            .iter()
            .map(|m| m.month_end().format(DATE_FORMAT).to_string())
            .collect();
        let mut columns: Vec<Column> = vec![Series::new("Date".into(), dates).into()];
        for metric in &self.metrics {
            let series = self.values.get(metric).ok_or_else(|| {
                AnalysisError::Data(format!("metric '{metric}' absent after reshaping"))
            })?;
            columns.push(Series::new(metric.as_str().into(), series.clone()).into());
        }
        DataFrame::new(columns).map_err(AnalysisError::from)
    }
}

fn build_summary(
    table: &MonthlyTable,
    organic_traffic: &LabelledSeries,
    paid_traffic: &LabelledSeries,
) -> HeliumSummary {
    let months = table.months.len().max(1) as f64;
    let total_organic: f64 = organic_traffic.values.iter().sum();
    let total_paid: f64 = paid_traffic.values.iter().sum();

    HeliumSummary {
        total_organic_traffic: total_organic as i64,
        total_paid_traffic: total_paid as i64,
        avg_monthly_organic: total_organic / months,
        avg_monthly_paid: total_paid / months,
        date_range: SummaryDateRange {
            start: table.window_start.format(DATE_FORMAT).to_string(),
            end: table.window_end.format(DATE_FORMAT).to_string(),
        },
    }
}
