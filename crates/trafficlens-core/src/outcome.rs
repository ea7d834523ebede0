//! The result envelope every pipeline hands back to its caller.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::AnalysisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Chart,
    Csv,
}

/// A file written by a pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ArtifactKind,
    pub path: PathBuf,
}

impl Artifact {
    pub fn chart(output_dir: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ArtifactKind::Chart,
            path: output_dir.join(name),
        }
    }

    pub fn csv(output_dir: &Path, name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ArtifactKind::Csv,
            path: output_dir.join(name),
        }
    }
}

/// Pipeline result. Never an `Err`: failures land in `errors` with
/// `success: false`, alongside whatever artifacts were written first.
#[derive(Debug, Serialize)]
pub struct AnalysisOutcome<S> {
    pub success: bool,
    pub errors: Vec<String>,
    pub artifacts: Vec<Artifact>,
    pub summary: Option<S>,
}

impl<S> AnalysisOutcome<S> {
    pub fn completed(artifacts: Vec<Artifact>, summary: S) -> Self {
        Self {
            success: true,
            errors: Vec::new(),
            artifacts,
            summary: Some(summary),
        }
    }

    pub fn from_error(err: AnalysisError, artifacts: Vec<Artifact>) -> Self {
        let errors = match err {
            AnalysisError::Validation { errors } => errors,
            other => vec![format!("Analysis error: {other}")],
        };
        Self {
            success: false,
            errors,
            artifacts,
            summary: None,
        }
    }
}

/// First and last day of the analyzed window, formatted `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryDateRange {
    pub start: String,
    pub end: String,
}
