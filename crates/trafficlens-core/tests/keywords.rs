use std::fs;
use std::path::PathBuf;

use tempfile::{tempdir, TempDir};
use trafficlens_core::keywords;
use trafficlens_core::AnalysisConfig;

fn write_input(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("keywords.csv");
    fs::write(&path, contents).expect("write input");
    (dir, path)
}

const VALID_INPUT: &str = "\
Keyword,Traffic,Search Volume,Timestamp,Keyword Intents
 Flavour Blaster Gun ,10,100,2025-03-01,\"commercial, transactional\"
flavour blaster gun,5,120,2025-03-15,\"commercial, transactional\"
cocktail smoker,40,900,2025-03-10,informational
cocktail smoker,8,900,2025-01-02,informational
bubble gun,3,50,2024-01-20,navigational
";

#[test]
fn full_run_writes_charts_and_processed_csv() {
    let (dir, input) = write_input(VALID_INPUT);
    let out = dir.path().join("out");

    let outcome = keywords::run_analysis(&input, &out, &AnalysisConfig::default());
    assert!(outcome.success, "errors: {:?}", outcome.errors);

    let names: Vec<&str> = outcome.artifacts.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "traffic_by_category.png",
            "branded_split.png",
            "intent_distribution.png",
            "keyword_analysis.csv",
        ]
    );
    for artifact in &outcome.artifacts {
        assert!(artifact.path.exists(), "missing {}", artifact.path.display());
    }

    let summary = outcome.summary.expect("summary");
    // Default window is 2024-10..2025-03, which drops the 2024-01 row.
    assert_eq!(summary.total_keywords, 2);
    assert_eq!(summary.branded_traffic, 15);
    assert_eq!(summary.non_branded_traffic, 48);
    assert_eq!(summary.intent_breakdown["commercial"], 15);
    assert_eq!(summary.intent_breakdown["informational"], 48);
    assert!(!summary.intent_breakdown.contains_key("navigational"));
    assert_eq!(summary.date_range.start, "2024-10");
    assert_eq!(summary.date_range.end, "2025-03");

    let csv = fs::read_to_string(out.join("keyword_analysis.csv")).expect("read csv");
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("Keyword,YearMonth,Traffic,Search Volume,Intent,Category")
    );
    // Highest-traffic reconciled group comes first.
    assert_eq!(
        lines.next(),
        Some("cocktail smoker,2025-03,40,900,informational,non-branded")
    );
}

#[test]
fn configured_date_range_narrows_the_window() {
    let (dir, input) = write_input(VALID_INPUT);
    let out = dir.path().join("out");
    let config: AnalysisConfig = toml::from_str(
        r#"
        [date_range]
        start = "2024-01"
        end = "2024-06"
        "#,
    )
    .expect("config");

    let outcome = keywords::run_analysis(&input, &out, &config);
    assert!(outcome.success, "errors: {:?}", outcome.errors);
    let summary = outcome.summary.expect("summary");
    assert_eq!(summary.total_keywords, 1);
    assert_eq!(summary.branded_traffic, 0);
    assert_eq!(summary.non_branded_traffic, 3);
    assert_eq!(summary.intent_breakdown["navigational"], 3);
    assert_eq!(summary.date_range.start, "2024-01");
    assert_eq!(summary.date_range.end, "2024-06");
}

#[test]
fn missing_columns_fail_validation() {
    let (dir, input) = write_input("Keyword,Traffic\nfoo,1\n");
    let out = dir.path().join("out");

    let outcome = keywords::run_analysis(&input, &out, &AnalysisConfig::default());
    assert!(!outcome.success);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].starts_with("Missing columns: "));
    assert!(outcome.artifacts.is_empty());
}

#[test]
fn invalid_timestamps_fail_validation() {
    let input = "\
Keyword,Traffic,Search Volume,Timestamp,Keyword Intents
foo,1,10,not-a-date,commercial
";
    let (dir, input) = write_input(input);
    let out = dir.path().join("out");

    let outcome = keywords::run_analysis(&input, &out, &AnalysisConfig::default());
    assert!(!outcome.success);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].contains("invalid dates"));
    assert!(outcome.errors[0].contains("not-a-date"));
}

#[test]
fn all_rows_dropped_becomes_analysis_error() {
    let input = "\
Keyword,Traffic,Search Volume,Timestamp,Keyword Intents
,1,10,2025-03-01,commercial
  ,2,20,2025-03-02,commercial
";
    let (dir, input) = write_input(input);
    let out = dir.path().join("out");

    let outcome = keywords::run_analysis(&input, &out, &AnalysisConfig::default());
    assert!(!outcome.success);
    assert_eq!(outcome.errors.len(), 1);
    assert!(outcome.errors[0].starts_with("Analysis error: "));
}

#[test]
fn custom_brand_terms_reclassify_keywords() {
    let (dir, input) = write_input(VALID_INPUT);
    let out = dir.path().join("out");
    let config: AnalysisConfig = toml::from_str(r#"brand_keywords = ["cocktail"]"#).expect("config");

    let outcome = keywords::run_analysis(&input, &out, &config);
    assert!(outcome.success, "errors: {:?}", outcome.errors);
    let summary = outcome.summary.expect("summary");
    assert_eq!(summary.branded_traffic, 48);
    assert_eq!(summary.non_branded_traffic, 15);
}
