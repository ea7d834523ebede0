//! Plotters-based rendering primitives for analysis chart artifacts.
//!
//! Every renderer writes a PNG to a caller-supplied path and returns a
//! [`ChartError`] instead of panicking, so the analysis pipelines can fold
//! drawing failures into their result objects.

pub mod bar;
pub mod donut;
pub mod line;
pub mod series;
pub mod style;

mod error;

pub use bar::{render_grouped_bars, render_stacked_bars, CategoryMatrix};
pub use donut::render_donut;
pub use error::ChartError;
pub use line::{render_dual_axis_lines, render_multi_lines};
pub use series::LabelledSeries;
