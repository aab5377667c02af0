//! Charts module - Chart rendering and display

mod renderer;
mod viewer;

pub use renderer::{ChartError, StaticChartRenderer};
pub use viewer::ChartViewer;

use crate::stats::{DepartmentSummary, FrequencyCount};
use std::path::Path;

/// Draws the report charts to image files.
pub trait ChartPainter {
    /// One bar per category, in the order of `counts`.
    fn bar_chart(&self, counts: &FrequencyCount, title: &str, path: &Path) -> Result<(), ChartError>;

    /// Pie with per-slice percentage labels.
    fn pie_chart(&self, counts: &FrequencyCount, title: &str, path: &Path) -> Result<(), ChartError>;

    /// Highlighted department means with the overall average line.
    fn department_chart(&self, summary: &DepartmentSummary, path: &Path) -> Result<(), ChartError>;
}
