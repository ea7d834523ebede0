use thiserror::Error;

/// Failure modes shared by the analysis pipelines.
///
/// `Validation` carries the per-check messages verbatim; everything else is
/// reported to callers as a single "Analysis error" line.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("validation failed: {}", errors.join("; "))]
    Validation { errors: Vec<String> },

    #[error("dataframe operation failed: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    #[error("CSV read failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Chart(#[from] trafficlens_charts::ChartError),

    #[error("{0}")]
    Data(String),
}
