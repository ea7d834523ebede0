//! Batch analysis of marketing CSV exports.
//!
//! Three pipelines share the same shape: validate the raw file, clean it into
//! a canonical table, reshape for charting, render PNG charts, and write a
//! processed CSV next to them. Each entry point returns an
//! [`AnalysisOutcome`] instead of an error so callers always get the list of
//! artifacts produced before a failure.

pub mod channels;
pub mod config;
pub mod helium;
pub mod ingest;
pub mod keywords;
pub mod outcome;
pub mod period;

mod error;

pub use config::{AnalysisConfig, MonthRange};
pub use error::AnalysisError;
pub use outcome::{AnalysisOutcome, Artifact, ArtifactKind, SummaryDateRange};
pub use period::YearMonth;
