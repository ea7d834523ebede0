//! Stacked and grouped bar charts over a category/series matrix.

use std::path::Path;

use plotters::prelude::*;

use crate::error::ChartError;
use crate::series::LabelledSeries;
use crate::style::{series_color, AXIS_FONT, TITLE_FONT};

const BAR_CHART_SIZE: (u32, u32) = (1200, 800);
const GROUP_WIDTH: f64 = 0.8;

/// Chart-ready matrix: one value per (series, category) pair.
#[derive(Debug, Clone)]
pub struct CategoryMatrix {
    pub categories: Vec<String>,
    pub series: Vec<LabelledSeries>,
}

impl CategoryMatrix {
    pub fn new(categories: Vec<String>, series: Vec<LabelledSeries>) -> Self {
        Self { categories, series }
    }

    fn check(&self, chart: &str) -> Result<(), ChartError> {
        if self.categories.is_empty() {
            return Err(ChartError::empty(chart, "no categories"));
        }
        if self.series.is_empty() {
            return Err(ChartError::empty(chart, "no series"));
        }
        for series in &self.series {
            if series.values.len() != self.categories.len() {
                return Err(ChartError::empty(
                    chart,
                    format!(
                        "series '{}' has {} values for {} categories",
                        series.name,
                        series.values.len(),
                        self.categories.len()
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Tallest stacked column across all categories.
    fn stacked_max(&self) -> f64 {
        (0..self.categories.len())
            .map(|i| self.series.iter().map(|s| s.values[i]).sum::<f64>())
            .fold(0.0, f64::max)
    }

    fn grouped_max(&self) -> f64 {
        self.series
            .iter()
            .map(LabelledSeries::max_value)
            .fold(0.0, f64::max)
    }
}

pub fn render_stacked_bars(
    path: &Path,
    title: &str,
    x_label: &str,
    y_label: &str,
    matrix: &CategoryMatrix,
    palette: &[RGBColor],
) -> Result<(), ChartError> {
    matrix.check(title)?;
    render_bars(path, title, x_label, y_label, matrix, palette, true)
}

pub fn render_grouped_bars(
    path: &Path,
    title: &str,
    x_label: &str,
    y_label: &str,
    matrix: &CategoryMatrix,
    palette: &[RGBColor],
) -> Result<(), ChartError> {
    matrix.check(title)?;
    render_bars(path, title, x_label, y_label, matrix, palette, false)
}

fn render_bars(
    path: &Path,
    title: &str,
    x_label: &str,
    y_label: &str,
    matrix: &CategoryMatrix,
    palette: &[RGBColor],
    stacked: bool,
) -> Result<(), ChartError> {
    let n = matrix.categories.len();
    let y_top = {
        let max = if stacked {
            matrix.stacked_max()
        } else {
            matrix.grouped_max()
        };
        if max > 0.0 {
            max * 1.1
        } else {
            1.0
        }
    };

    let root = BitMapBackend::new(path, BAR_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| ChartError::draw(title, e))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, TITLE_FONT)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_top)
        .map_err(|e| ChartError::draw(title, e))?;

    let labels = &matrix.categories;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_label)
        .y_desc(y_label)
        .axis_desc_style(AXIS_FONT)
        .x_labels(n)
        .x_label_formatter(&|x: &f64| {
            let idx = x.round() as i64;
            if idx >= 0 && (idx as usize) < labels.len() && (x - idx as f64).abs() < 0.25 {
                labels[idx as usize].clone()
            } else {
                String::new()
            }
        })
        .draw()
        .map_err(|e| ChartError::draw(title, e))?;

    let mut stack_base = vec![0.0f64; n];
    let bar_width = GROUP_WIDTH / matrix.series.len() as f64;

    for (s_idx, series) in matrix.series.iter().enumerate() {
        let color = series_color(palette, s_idx);
        let mut rects = Vec::with_capacity(n);

        for (i, value) in series.values.iter().enumerate() {
            let (x0, x1, y0, y1) = if stacked {
                let base = stack_base[i];
                (
                    i as f64 - GROUP_WIDTH / 2.0,
                    i as f64 + GROUP_WIDTH / 2.0,
                    base,
                    base + value,
                )
            } else {
                let x0 = i as f64 - GROUP_WIDTH / 2.0 + s_idx as f64 * bar_width;
                (x0, x0 + bar_width, 0.0, *value)
            };
            rects.push(Rectangle::new([(x0, y0), (x1, y1)], color.filled()));
        }

        if stacked {
            for (i, value) in series.values.iter().enumerate() {
                stack_base[i] += value;
            }
        }

        chart
            .draw_series(rects)
            .map_err(|e| ChartError::draw(title, e))?
            .label(series.name.clone())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(|e| ChartError::draw(title, e))?;

    root.present().map_err(|e| ChartError::draw(title, e))?;
    tracing::debug!(chart = title, path = %path.display(), "rendered bar chart");
    Ok(())
}
