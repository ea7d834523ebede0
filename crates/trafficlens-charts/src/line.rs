//! Monthly line charts: dual-axis metric comparison and multi-series overlays.

use std::path::Path;

use plotters::prelude::*;

use crate::error::ChartError;
use crate::series::LabelledSeries;
use crate::style::{series_color, AXIS_FONT, TITLE_FONT};

const LINE_CHART_SIZE: (u32, u32) = (1200, 600);

fn axis_top(max: f64) -> f64 {
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

fn points(values: &[f64]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64, *v))
        .collect()
}

fn check_lengths(
    chart: &str,
    x_labels: &[String],
    series: &[&LabelledSeries],
) -> Result<(), ChartError> {
    if x_labels.is_empty() {
        return Err(ChartError::empty(chart, "no x-axis points"));
    }
    for s in series {
        if s.values.len() != x_labels.len() {
            return Err(ChartError::empty(
                chart,
                format!(
                    "series '{}' has {} values for {} x-axis points",
                    s.name,
                    s.values.len(),
                    x_labels.len()
                ),
            ));
        }
    }
    Ok(())
}

/// Two metrics with independent y scales over a shared monthly x axis.
pub fn render_dual_axis_lines(
    path: &Path,
    title: &str,
    x_labels: &[String],
    left: &LabelledSeries,
    right: &LabelledSeries,
    left_color: RGBColor,
    right_color: RGBColor,
) -> Result<(), ChartError> {
    check_lengths(title, x_labels, &[left, right])?;

    let n = x_labels.len();
    let x_range = -0.5f64..(n as f64 - 0.5);

    let root = BitMapBackend::new(path, LINE_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| ChartError::draw(title, e))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, TITLE_FONT)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .right_y_label_area_size(80)
        .build_cartesian_2d(x_range.clone(), 0f64..axis_top(left.max_value()))
        .map_err(|e| ChartError::draw(title, e))?
        .set_secondary_coord(x_range, 0f64..axis_top(right.max_value()));

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Date")
        .y_desc(left.name.clone())
        .axis_desc_style(AXIS_FONT)
        .x_labels(n)
        .x_label_formatter(&|x: &f64| month_label(x, x_labels))
        .draw()
        .map_err(|e| ChartError::draw(title, e))?;

    chart
        .configure_secondary_axes()
        .y_desc(right.name.clone())
        .axis_desc_style(AXIS_FONT)
        .draw()
        .map_err(|e| ChartError::draw(title, e))?;

    chart
        .draw_series(LineSeries::new(points(&left.values), left_color.stroke_width(2)))
        .map_err(|e| ChartError::draw(title, e))?
        .label(left.name.clone())
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 16, y)], left_color.stroke_width(2)));

    chart
        .draw_secondary_series(LineSeries::new(
            points(&right.values),
            right_color.stroke_width(2),
        ))
        .map_err(|e| ChartError::draw(title, e))?
        .label(right.name.clone())
        .legend(move |(x, y)| {
            PathElement::new(vec![(x, y), (x + 16, y)], right_color.stroke_width(2))
        });

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(|e| ChartError::draw(title, e))?;

    root.present().map_err(|e| ChartError::draw(title, e))?;
    tracing::debug!(chart = title, path = %path.display(), "rendered dual-axis chart");
    Ok(())
}

/// Several metrics on one shared y axis.
pub fn render_multi_lines(
    path: &Path,
    title: &str,
    y_label: &str,
    x_labels: &[String],
    series: &[LabelledSeries],
    palette: &[RGBColor],
) -> Result<(), ChartError> {
    if series.is_empty() {
        return Err(ChartError::empty(title, "no series"));
    }
    let refs: Vec<&LabelledSeries> = series.iter().collect();
    check_lengths(title, x_labels, &refs)?;

    let n = x_labels.len();
    let y_max = series
        .iter()
        .map(LabelledSeries::max_value)
        .fold(0.0, f64::max);

    let root = BitMapBackend::new(path, LINE_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| ChartError::draw(title, e))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, TITLE_FONT)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..axis_top(y_max))
        .map_err(|e| ChartError::draw(title, e))?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Date")
        .y_desc(y_label)
        .axis_desc_style(AXIS_FONT)
        .x_labels(n)
        .x_label_formatter(&|x: &f64| month_label(x, x_labels))
        .draw()
        .map_err(|e| ChartError::draw(title, e))?;

    for (idx, s) in series.iter().enumerate() {
        let color = series_color(palette, idx);
        chart
            .draw_series(LineSeries::new(points(&s.values), color.stroke_width(2)))
            .map_err(|e| ChartError::draw(title, e))?
            .label(s.name.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(|e| ChartError::draw(title, e))?;

    root.present().map_err(|e| ChartError::draw(title, e))?;
    tracing::debug!(chart = title, path = %path.display(), "rendered line chart");
    Ok(())
}

fn month_label(x: &f64, labels: &[String]) -> String {
    let idx = x.round() as i64;
    if idx >= 0 && (idx as usize) < labels.len() && (x - idx as f64).abs() < 0.25 {
        labels[idx as usize].clone()
    } else {
        String::new()
    }
}
