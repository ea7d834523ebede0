//! Donut (ring) charts with a side legend carrying percentage shares.

use std::f64::consts::PI;
use std::path::Path;

use plotters::prelude::*;

use crate::error::ChartError;
use crate::style::{series_color, LEGEND_FONT, TITLE_FONT};

const DONUT_CHART_SIZE: (u32, u32) = (1000, 700);
const OUTER_RADIUS: f64 = 230.0;
const INNER_RADIUS: f64 = 135.0;
const CENTER: (f64, f64) = (330.0, 360.0);
const LEGEND_X: i32 = 640;
const LEGEND_ROW_HEIGHT: i32 = 34;

/// Renders one ring segment per (label, value) slice, clockwise from the top.
pub fn render_donut(
    path: &Path,
    title: &str,
    slices: &[(String, f64)],
    palette: &[RGBColor],
) -> Result<(), ChartError> {
    if slices.is_empty() {
        return Err(ChartError::empty(title, "no slices"));
    }
    let total: f64 = slices.iter().map(|(_, v)| v).sum();
    if total <= 0.0 {
        return Err(ChartError::empty(title, "slice total is not positive"));
    }

    let root = BitMapBackend::new(path, DONUT_CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(|e| ChartError::draw(title, e))?;
    let root = root
        .titled(title, TITLE_FONT)
        .map_err(|e| ChartError::draw(title, e))?;

    let mut start_fraction = 0.0f64;
    for (idx, (_, value)) in slices.iter().enumerate() {
        let fraction = value / total;
        if fraction > 0.0 {
            let sector = sector_points(start_fraction, start_fraction + fraction);
            root.draw(&Polygon::new(sector, series_color(palette, idx).filled()))
                .map_err(|e| ChartError::draw(title, e))?;
        }
        start_fraction += fraction;
    }

    let legend_y0 = (DONUT_CHART_SIZE.1 as i32 - slices.len() as i32 * LEGEND_ROW_HEIGHT) / 2;
    for (idx, (label, value)) in slices.iter().enumerate() {
        let y = legend_y0 + idx as i32 * LEGEND_ROW_HEIGHT;
        let color = series_color(palette, idx);
        root.draw(&Rectangle::new(
            [(LEGEND_X, y), (LEGEND_X + 18, y + 18)],
            color.filled(),
        ))
        .map_err(|e| ChartError::draw(title, e))?;
        let text = format!("{} ({:.1}%)", label, value / total * 100.0);
        root.draw(&Text::new(text, (LEGEND_X + 28, y + 2), LEGEND_FONT))
            .map_err(|e| ChartError::draw(title, e))?;
    }

    root.present().map_err(|e| ChartError::draw(title, e))?;
    tracing::debug!(chart = title, path = %path.display(), "rendered donut chart");
    Ok(())
}

/// Ring-segment outline: outer arc forward, inner arc back.
fn sector_points(from_fraction: f64, to_fraction: f64) -> Vec<(i32, i32)> {
    let t0 = -PI / 2.0 + from_fraction * 2.0 * PI;
    let t1 = -PI / 2.0 + to_fraction * 2.0 * PI;
    let steps = (((to_fraction - from_fraction) * 360.0).ceil() as usize).max(2);

    let (cx, cy) = CENTER;
    let mut points = Vec::with_capacity(2 * (steps + 1));
    for step in 0..=steps {
        let t = t0 + (t1 - t0) * step as f64 / steps as f64;
        points.push((
            (cx + OUTER_RADIUS * t.cos()).round() as i32,
            (cy + OUTER_RADIUS * t.sin()).round() as i32,
        ));
    }
    for step in (0..=steps).rev() {
        let t = t0 + (t1 - t0) * step as f64 / steps as f64;
        points.push((
            (cx + INNER_RADIUS * t.cos()).round() as i32,
            (cy + INNER_RADIUS * t.sin()).round() as i32,
        ));
    }
    points
}
