use std::fs;
use std::path::PathBuf;

use tempfile::{tempdir, TempDir};
use trafficlens_core::channels;
use trafficlens_core::AnalysisConfig;

fn write_input(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("channels.csv");
    fs::write(&path, contents).expect("write input");
    (dir, path)
}

const VALID_INPUT: &str = "\
Target,Direct,Referral,Organic Search,Paid Search,Organic Social,Paid Social,Email,Display Ads
Site-A,120,30,200,50,10,5,40,15
site-b,80,10,150,20,5,0,25,5
 Site-A ,999,999,999,999,999,999,999,999
";

#[test]
fn full_run_writes_all_artifacts() {
    let (dir, input) = write_input(VALID_INPUT);
    let out = dir.path().join("out");

    let outcome = channels::run_analysis(&input, &out, &AnalysisConfig::default());
    assert!(outcome.success, "errors: {:?}", outcome.errors);
    assert!(outcome.errors.is_empty());

    let names: Vec<&str> = outcome.artifacts.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "traffic_by_channel.png",
            "channel_mix_by_target.png",
            "channel_comparison.png",
            "channel_analysis.csv",
        ]
    );
    for artifact in &outcome.artifacts {
        assert!(artifact.path.exists(), "missing {}", artifact.path.display());
    }

    let summary = outcome.summary.expect("summary");
    // Duplicate Site-A row is discarded, so totals come from two rows.
    assert_eq!(summary.total_traffic, 765);
    assert_eq!(summary.top_channel.as_deref(), Some("Organic Search"));
    assert_eq!(summary.top_target.as_deref(), Some("site-a"));
    assert_eq!(summary.channel_breakdown["Direct"], 200);
    assert_eq!(summary.target_breakdown["site-b"], 295);
}

#[test]
fn missing_columns_fail_validation_without_artifacts() {
    let (dir, input) = write_input("Target,Direct\na,1\n");
    let out = dir.path().join("out");

    let outcome = channels::run_analysis(&input, &out, &AnalysisConfig::default());
    assert!(!outcome.success);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].starts_with("Missing columns: "));
    assert!(outcome.artifacts.is_empty());
    assert!(outcome.summary.is_none());
    assert!(!out.exists());
}

#[test]
fn text_in_numeric_column_is_reported_per_column() {
    let input = "\
Target,Direct,Referral,Organic Search,Paid Search,Organic Social,Paid Social,Email,Display Ads
a,1,2,3,4,5,6,lots,8
";
    let (dir, input) = write_input(input);
    let out = dir.path().join("out");

    let outcome = channels::run_analysis(&input, &out, &AnalysisConfig::default());
    assert!(!outcome.success);
    assert_eq!(
        outcome.errors,
        vec!["Email column must contain only numbers.".to_string()]
    );
}

#[test]
fn unreadable_input_becomes_analysis_error() {
    let dir = tempdir().expect("tempdir");
    let input = dir.path().join("nope.csv");
    let out = dir.path().join("out");

    let outcome = channels::run_analysis(&input, &out, &AnalysisConfig::default());
    assert!(!outcome.success);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].starts_with("Analysis error: "));
}

#[test]
fn reruns_produce_identical_summaries() {
    let (dir, input) = write_input(VALID_INPUT);
    let out = dir.path().join("out");

    let first = channels::run_analysis(&input, &out, &AnalysisConfig::default());
    let second = channels::run_analysis(&input, &out, &AnalysisConfig::default());
    assert!(first.success && second.success);
    assert_eq!(
        serde_json::to_value(&first.summary).expect("json"),
        serde_json::to_value(&second.summary).expect("json"),
    );
    let csv = fs::read_to_string(out.join("channel_analysis.csv")).expect("read csv");
    assert!(csv.starts_with("Target,Direct,Referral,"));
    assert!(csv.contains("site-a,120,30,200,50,10,5,40,15"));
}
