use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("chart '{chart}' has no drawable data: {reason}")]
    EmptyData { chart: String, reason: String },

    #[error("failed to draw chart '{chart}': {message}")]
    Draw { chart: String, message: String },
}

impl ChartError {
    pub(crate) fn empty(chart: &str, reason: impl Into<String>) -> Self {
        ChartError::EmptyData {
            chart: chart.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn draw(chart: &str, err: impl std::fmt::Display) -> Self {
        ChartError::Draw {
            chart: chart.to_string(),
            message: err.to_string(),
        }
    }
}
