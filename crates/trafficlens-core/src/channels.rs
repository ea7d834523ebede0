//! Channel traffic analysis: traffic totals per acquisition channel,
//! broken down by target site.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use polars::prelude::*;
use serde::Serialize;
use trafficlens_charts::{render_grouped_bars, render_stacked_bars, CategoryMatrix, LabelledSeries};

use crate::config::{AnalysisConfig, CHANNEL_KEY_COLUMN};
use crate::error::AnalysisError;
use crate::ingest;
use crate::outcome::{AnalysisOutcome, Artifact};

const TRAFFIC_BY_CHANNEL_PNG: &str = "traffic_by_channel.png";
const CHANNEL_MIX_PNG: &str = "channel_mix_by_target.png";
const CHANNEL_COMPARISON_PNG: &str = "channel_comparison.png";
const PROCESSED_CSV: &str = "channel_analysis.csv";

#[derive(Debug, Clone, Serialize)]
pub struct ChannelSummary {
    pub total_traffic: i64,
    pub channel_breakdown: BTreeMap<String, i64>,
    pub target_breakdown: BTreeMap<String, i64>,
    pub top_channel: Option<String>,
    pub top_target: Option<String>,
}

/// Runs the full channel pipeline. Failures are folded into the outcome,
/// which keeps any artifacts written before the failure.
pub fn run_analysis(
    input_file: &Path,
    output_dir: &Path,
    config: &AnalysisConfig,
) -> AnalysisOutcome<ChannelSummary> {
    let mut artifacts = Vec::new();
    match execute(input_file, output_dir, config, &mut artifacts) {
        Ok(summary) => AnalysisOutcome::completed(artifacts, summary),
        Err(err) => {
            tracing::warn!(input = %input_file.display(), error = %err, "channel analysis failed");
            AnalysisOutcome::from_error(err, artifacts)
        }
    }
}

fn execute(
    input_file: &Path,
    output_dir: &Path,
    config: &AnalysisConfig,
    artifacts: &mut Vec<Artifact>,
) -> Result<ChannelSummary, AnalysisError> {
    let required = config.channel_required_columns();
    let numeric = config.channel_numeric_columns();

    let raw = ingest::read_csv_frame(input_file)?;
    let errors = validate(&raw, &required, &numeric);
    if !errors.is_empty() {
        return Err(AnalysisError::Validation { errors });
    }

    let table = clean(&raw, &required, &numeric)?;
    tracing::info!(
        targets = table.targets.len(),
        channels = table.channels.len(),
        "cleaned channel dataset"
    );

    fs::create_dir_all(output_dir)?;
    let palette = trafficlens_charts::style::google_palette();
    let by_channel = table.by_channel_matrix();
    let by_target = table.by_target_matrix();

    let path = output_dir.join(TRAFFIC_BY_CHANNEL_PNG);
    render_stacked_bars(
        &path,
        "Traffic by Channel",
        "Channel",
        "Total Traffic",
        &by_channel,
        &palette,
    )?;
    artifacts.push(Artifact::chart(output_dir, TRAFFIC_BY_CHANNEL_PNG));

    let path = output_dir.join(CHANNEL_MIX_PNG);
    render_stacked_bars(
        &path,
        "Channel Mix by Target",
        "Target",
        "Total Traffic",
        &by_target,
        &palette,
    )?;
    artifacts.push(Artifact::chart(output_dir, CHANNEL_MIX_PNG));

    let path = output_dir.join(CHANNEL_COMPARISON_PNG);
    render_grouped_bars(
        &path,
        "Traffic Comparison by Channel and Target",
        "Channel",
        "Total Traffic",
        &by_channel,
        &palette,
    )?;
    artifacts.push(Artifact::chart(output_dir, CHANNEL_COMPARISON_PNG));

    let summary = build_summary(&table);

    let mut frame = table.to_frame()?;
    ingest::write_csv_artifact(&mut frame, &output_dir.join(PROCESSED_CSV))?;
    artifacts.push(Artifact::csv(output_dir, PROCESSED_CSV));

    Ok(summary)
}

fn validate(df: &DataFrame, required: &[String], numeric: &[String]) -> Vec<String> {
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

    let required_set: HashSet<&str> = required.iter().map(String::as_str).collect();
    if numeric.iter().any(|c| !required_set.contains(c.as_str())) {
        errors.push("Numeric columns not in required columns.".to_string());
        return errors;
    }

    for name in numeric {
        if let Ok(column) = df.column(name) {
            if !ingest::is_numeric_dtype(column.dtype()) {
                errors.push(format!("{name} column must contain only numbers."));
            }
        }
    }
    errors
}

/// Cleaned channel data: one row per target, one value per channel.
struct ChannelTable {
    channels: Vec<String>,
    targets: Vec<String>,
    /// `values[target_idx][channel_idx]`
    values: Vec<Vec<i64>>,
    /// Required non-numeric columns besides the key, passed through as-is.
    extras: Vec<(String, Vec<String>)>,
}

fn clean(df: &DataFrame, required: &[String], numeric: &[String]) -> Result<ChannelTable, AnalysisError> {
    let targets = ingest::text_trimmed_lower(df.column(CHANNEL_KEY_COLUMN)?)?;
    let mut per_channel = Vec::with_capacity(numeric.len());
    for name in numeric {
        per_channel.push(ingest::numeric_i64_lossy(df.column(name)?)?);
    }

    let extra_names: Vec<&String> = required
        .iter()
        .filter(|name| *name != CHANNEL_KEY_COLUMN && !numeric.contains(name))
        .collect();
    let mut per_extra = Vec::with_capacity(extra_names.len());
    for name in &extra_names {
        per_extra.push(ingest::text_display(df.column(name)?)?);
    }

    // Drop rows with an empty target; first row wins on duplicates.
    let mut seen = HashSet::new();
    let mut kept_targets = Vec::new();
    let mut values = Vec::new();
    let mut extra_values: Vec<Vec<String>> = vec![Vec::new(); extra_names.len()];
    for (row, target) in targets.into_iter().enumerate() {
        let Some(target) = target else { continue };
        if !seen.insert(target.clone()) {
            continue;
        }
        kept_targets.push(target);
        values.push(per_channel.iter().map(|col| col[row]).collect());
        for (idx, col) in per_extra.iter().enumerate() {
            extra_values[idx].push(col[row].clone());
        }
    }

    Ok(ChannelTable {
        channels: numeric.to_vec(),
        targets: kept_targets,
        values,
        extras: extra_names
            .into_iter()
            .cloned()
            .zip(extra_values)
            .collect(),
    })
}

impl ChannelTable {
    /// Channels on the x axis, one series per target.
    fn by_channel_matrix(&self) -> CategoryMatrix {
        let series = self
            .targets
            .iter()
            .enumerate()
            .map(|(t, name)| {
                LabelledSeries::new(
                    name.clone(),
                    (0..self.channels.len())
                        .map(|c| self.values[t][c] as f64)
                        .collect(),
                )
            })
            .collect();
        CategoryMatrix::new(self.channels.clone(), series)
    }

    /// Targets on the x axis, one series per channel.
    fn by_target_matrix(&self) -> CategoryMatrix {
        let series = self
            .channels
            .iter()
            .enumerate()
            .map(|(c, name)| {
                LabelledSeries::new(
                    name.clone(),
                    (0..self.targets.len())
                        .map(|t| self.values[t][c] as f64)
                        .collect(),
                )
            })
            .collect();
        CategoryMatrix::new(self.targets.clone(), series)
    }

    fn to_frame(&self) -> Result<DataFrame, AnalysisError> {
        let mut columns: Vec<Column> =
            vec![Series::new(CHANNEL_KEY_COLUMN.into(), self.targets.clone()).into()];
        for (c, name) in self.channels.iter().enumerate() {
            let values: Vec<i64> = (0..self.targets.len()).map(|t| self.values[t][c]).collect();
            columns.push(Series::new(name.as_str().into(), values).into());
        }
        for (name, values) in &self.extras {
            columns.push(Series::new(name.as_str().into(), values.clone()).into());
        }
        DataFrame::new(columns).map_err(AnalysisError::from)
    }
}

fn build_summary(table: &ChannelTable) -> ChannelSummary {
    let mut channel_breakdown = BTreeMap::new();
    for (c, name) in table.channels.iter().enumerate() {
        let total: i64 = (0..table.targets.len()).map(|t| table.values[t][c]).sum();
        channel_breakdown.insert(name.clone(), total);
    }

    let mut target_breakdown = BTreeMap::new();
    for (t, name) in table.targets.iter().enumerate() {
        target_breakdown.insert(name.clone(), table.values[t].iter().sum());
    }

    // Ties resolve to the first name in configured (resp. row) order.
    let top_channel = top_by(&table.channels, |name| channel_breakdown[name]);
    let top_target = top_by(&table.targets, |name| target_breakdown[name]);

    ChannelSummary {
        total_traffic: channel_breakdown.values().sum(),
        channel_breakdown,
        target_breakdown,
        top_channel,
        top_target,
    }
}

fn top_by(names: &[String], total: impl Fn(&String) -> i64) -> Option<String> {
    let mut best: Option<(&String, i64)> = None;
    for name in names {
        let value = total(name);
        if best.map_or(true, |(_, v)| value > v) {
            best = Some((name, value));
        }
    }
    best.map(|(name, _)| name.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CHANNEL_COLUMNS;

    fn required() -> Vec<String> {
        std::iter::once(CHANNEL_KEY_COLUMN)
            .chain(DEFAULT_CHANNEL_COLUMNS)
            .map(String::from)
            .collect()
    }

    fn numeric() -> Vec<String> {
        DEFAULT_CHANNEL_COLUMNS.map(String::from).to_vec()
    }

    fn sample_frame() -> DataFrame {
        df!(
            "Target" => ["  Site-A ", "site-b", "Site-A", ""],
            "Direct" => [10i64, 20, 99, 1],
            "Referral" => [1i64, 2, 99, 1],
            "Organic Search" => [5i64, 6, 99, 1],
            "Paid Search" => [0i64, 3, 99, 1],
            "Organic Social" => [2i64, 0, 99, 1],
            "Paid Social" => [0i64, 0, 99, 1],
            "Email" => [4i64, 1, 99, 1],
            "Display Ads" => [1i64, 1, 99, 1],
        )
        .expect("sample frame")
    }

    #[test]
    fn validate_reports_missing_columns_first() {
        let df = df!("Target" => ["a"], "Direct" => [1i64]).expect("frame");
        let errors = validate(&df, &required(), &numeric());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Missing columns: "));
        assert!(errors[0].contains("Referral"));
        assert!(!errors[0].contains("Direct,"));
    }

    #[test]
    fn validate_rejects_numeric_outside_required() {
        let df = sample_frame();
        let mut numeric = numeric();
        numeric.push("Affiliate".to_string());
        let errors = validate(&df, &required(), &numeric);
        assert_eq!(errors, vec!["Numeric columns not in required columns."]);
    }

    #[test]
    fn validate_flags_text_in_numeric_columns() {
        let mut df = sample_frame();
        df.replace(
            "Email",
            Series::new("Email".into(), ["lots", "some", "none", "few"]),
        )
        .expect("replace column");
        let errors = validate(&df, &required(), &numeric());
        assert_eq!(errors, vec!["Email column must contain only numbers."]);
    }

    #[test]
    fn clean_normalizes_dedupes_and_drops_empty_targets() {
        let table = clean(&sample_frame(), &required(), &numeric()).expect("clean");
        assert_eq!(table.targets, vec!["site-a", "site-b"]);
        // First site-a row wins over the duplicate.
        assert_eq!(table.values[0][0], 10);
        assert_eq!(table.values[1][0], 20);
    }

    #[test]
    fn clean_carries_non_numeric_required_columns() {
        let mut df = sample_frame();
        df.with_column(Series::new("Notes".into(), ["fresh", "stale", "dup", "blank"]))
            .expect("add column");
        let mut required = required();
        required.push("Notes".to_string());

        let table = clean(&df, &required, &numeric()).expect("clean");
        assert_eq!(table.extras.len(), 1);
        assert_eq!(table.extras[0].0, "Notes");
        // Pass-through values track the surviving rows.
        assert_eq!(table.extras[0].1, vec!["fresh", "stale"]);

        let frame = table.to_frame().expect("frame");
        let names: Vec<&str> = frame.get_column_names().iter().map(|n| n.as_str()).collect();
        assert_eq!(names.last(), Some(&"Notes"));
        assert_eq!(frame.width(), 10);
    }

    #[test]
    fn summary_totals_and_top_entries() {
        let table = clean(&sample_frame(), &required(), &numeric()).expect("clean");
        let summary = build_summary(&table);
        assert_eq!(summary.total_traffic, 56);
        assert_eq!(summary.channel_breakdown["Direct"], 30);
        assert_eq!(summary.target_breakdown["site-b"], 33);
        assert_eq!(summary.top_channel.as_deref(), Some("Direct"));
        assert_eq!(summary.top_target.as_deref(), Some("site-b"));
    }
}
