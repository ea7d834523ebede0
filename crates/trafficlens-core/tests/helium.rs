use std::fs;
use std::path::PathBuf;

use tempfile::{tempdir, TempDir};
use trafficlens_core::helium;
use trafficlens_core::AnalysisConfig;

fn write_input(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("helium.csv");
    fs::write(&path, contents).expect("write input");
    (dir, path)
}

const VALID_INPUT: &str = "\
Metric,Target,2023-01-15,2024-11-15,2024-11-30,2024-12-31,2025-01-31
Organic Traffic,example.com,9999,1000,200,1400,1600
Organic Keywords,example.com,9999,300,50,320,340
Organic Traffic Cost,example.com,9999,70,10,75,80
Paid Traffic,example.com,9999,100,20,90,110
Paid Keywords,example.com,9999,40,5,38,45
Paid Traffic Cost,example.com,9999,55,8,50,60
";

#[test]
fn full_run_writes_charts_and_monthly_csv() {
    let (dir, input) = write_input(VALID_INPUT);
    let out = dir.path().join("out");

    let outcome = helium::run_analysis(&input, &out, &AnalysisConfig::default());
    assert!(outcome.success, "errors: {:?}", outcome.errors);

    let names: Vec<&str> = outcome.artifacts.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "organic_traffic_vs_keywords.png",
            "paid_metrics.png",
            "processed_monthly_data.csv",
        ]
    );
    for artifact in &outcome.artifacts {
        assert!(artifact.path.exists(), "missing {}", artifact.path.display());
    }

    let summary = outcome.summary.expect("summary");
    // The 2023 column falls outside the trailing one-year window.
    assert_eq!(summary.total_organic_traffic, 4200);
    assert_eq!(summary.total_paid_traffic, 320);
    assert!((summary.avg_monthly_organic - 1400.0).abs() < 1e-9);
    assert_eq!(summary.date_range.start, "2024-01-31");
    assert_eq!(summary.date_range.end, "2025-01-31");

    let csv = fs::read_to_string(out.join("processed_monthly_data.csv")).expect("read csv");
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("Date,Organic Keywords,Organic Traffic,Organic Traffic Cost,Paid Keywords,Paid Traffic,Paid Traffic Cost")
    );
    // November samples collapse into one month-end row.
    assert_eq!(lines.next(), Some("2024-11-30,350,1200,80,45,120,63"));
}

#[test]
fn wrong_row_count_fails_validation() {
    let input = "\
Metric,2025-01-31,2025-02-28,2025-03-31
Organic Traffic,1,2,3
";
    let (dir, input) = write_input(input);
    let out = dir.path().join("out");

    let outcome = helium::run_analysis(&input, &out, &AnalysisConfig::default());
    assert!(!outcome.success);
    assert_eq!(
        outcome.errors,
        vec!["File must have exactly 6 rows, but it has 1.".to_string()]
    );
    assert!(outcome.artifacts.is_empty());
}

#[test]
fn metric_set_mismatch_reports_missing_and_invalid() {
    let input = "\
Metric,2025-01-31,2025-02-28,2025-03-31
Organic Traffic,1,2,3
Organic Keywords,1,2,3
Organic Traffic Cost,1,2,3
Paid Traffic,1,2,3
Paid Keywords,1,2,3
Bounce Rate,1,2,3
";
    let (dir, input) = write_input(input);
    let out = dir.path().join("out");

    let outcome = helium::run_analysis(&input, &out, &AnalysisConfig::default());
    assert!(!outcome.success);
    assert_eq!(
        outcome.errors,
        vec![
            "Missing required metrics: paid traffic cost".to_string(),
            "Invalid metrics found: bounce rate".to_string(),
        ]
    );
}

#[test]
fn non_integer_date_column_fails_validation() {
    let input = "\
Metric,2025-01-31,2025-02-28,2025-03-31
Organic Traffic,1.5,2,3
Organic Keywords,1,2,3
Organic Traffic Cost,1,2,3
Paid Traffic,1,2,3
Paid Keywords,1,2,3
Paid Traffic Cost,1,2,3
";
    let (dir, input) = write_input(input);
    let out = dir.path().join("out");

    let outcome = helium::run_analysis(&input, &out, &AnalysisConfig::default());
    assert!(!outcome.success);
    assert_eq!(
        outcome.errors,
        vec!["Non-integer values in date columns: 2025-01-31".to_string()]
    );
}

#[test]
fn all_zero_columns_leave_no_data() {
    let input = "\
Metric,2025-01-31,2025-02-28,2025-03-31
Organic Traffic,0,0,0
Organic Keywords,0,0,0
Organic Traffic Cost,0,0,0
Paid Traffic,0,0,0
Paid Keywords,0,0,0
Paid Traffic Cost,0,0,0
";
    let (dir, input) = write_input(input);
    let out = dir.path().join("out");

    let outcome = helium::run_analysis(&input, &out, &AnalysisConfig::default());
    assert!(!outcome.success);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].starts_with("Analysis error: "));
}
