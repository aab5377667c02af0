//! Static Chart Renderer
//! Writes the report charts as PNG files with plotters.
//!
//! Charts:
//! 1. Category bar chart: one bar per value, most frequent first
//! 2. Category pie chart: slice labels plus one-decimal percentages
//! 3. Department bar chart: ascending means, highest bar green, lowest red,
//!    dashed reference line at the average of the department means

use crate::charts::ChartPainter;
use crate::stats::{DepartmentSummary, FrequencyCount};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to draw chart: {0}")]
    Drawing(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for ChartError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        ChartError::Drawing(err.to_string())
    }
}

const FONT: &str = "sans-serif";
const NO_DATA: &str = "No data";

// Colors
const BAR_BLUE: RGBColor = RGBColor(52, 152, 219);
const HIGH_GREEN: RGBColor = RGBColor(46, 204, 113);
const LOW_RED: RGBColor = RGBColor(231, 76, 60);
const AVERAGE_GRAY: RGBColor = RGBColor(127, 127, 127);

/// Slice colors, cycled when there are more categories.
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(52, 152, 219),  // Blue
    RGBColor(243, 156, 18),  // Orange
    RGBColor(46, 204, 113),  // Green
    RGBColor(231, 76, 60),   // Red
    RGBColor(155, 89, 182),  // Purple
    RGBColor(121, 85, 72),   // Brown
    RGBColor(233, 30, 99),   // Pink
    RGBColor(96, 125, 139),  // Blue Grey
    RGBColor(205, 220, 57),  // Lime
    RGBColor(0, 188, 212),   // Cyan
];

// Reference line dash pattern (pixels)
const DASH: i32 = 12;
const GAP: i32 = 6;

pub struct StaticChartRenderer {
    pub width: u32,
    pub height: u32,
    /// Side of the square pie canvas.
    pub pie_size: u32,
}

impl Default for StaticChartRenderer {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 700,
            pie_size: 800,
        }
    }
}

/// Title of the department chart for the averaged column.
pub fn department_title(value_column: &str) -> String {
    format!("Average {} by Department of Residence", value_column)
}

/// Label drawn next to the reference line.
pub fn average_label(average: f64) -> String {
    format!("Overall average ({:.2})", average)
}

impl StaticChartRenderer {
    /// Slice color for category `idx`.
    pub fn palette_color(idx: usize) -> RGBColor {
        PALETTE[idx % PALETTE.len()]
    }

    /// Bar color for a department: highest mean wins over lowest when both
    /// name the same group.
    pub fn department_color(department: &str, summary: &DepartmentSummary) -> RGBColor {
        if summary.max_group.as_deref() == Some(department) {
            HIGH_GREEN
        } else if summary.min_group.as_deref() == Some(department) {
            LOW_RED
        } else {
            BAR_BLUE
        }
    }

    fn draw_no_data(
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        title: &str,
    ) -> Result<(), ChartError> {
        let (w, h) = root.dim_in_pixel();
        let caption = TextStyle::from((FONT, 30).into_font()).pos(Pos::new(HPos::Center, VPos::Top));
        root.draw_text(title, &caption, (w as i32 / 2, 20))?;
        let notice = TextStyle::from((FONT, 24).into_font().color(&AVERAGE_GRAY))
            .pos(Pos::new(HPos::Center, VPos::Center));
        root.draw_text(NO_DATA, &notice, (w as i32 / 2, h as i32 / 2))?;
        Ok(())
    }

    /// Category labels under the bars. `positions` are the backend
    /// coordinates of each bar's center on the x axis.
    fn draw_category_labels(
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        labels: &[String],
        positions: &[(i32, i32)],
        rotate: bool,
    ) -> Result<(), ChartError> {
        let style = if rotate {
            (FONT, 13)
                .into_font()
                .transform(FontTransform::Rotate90)
                .color(&BLACK)
                .pos(Pos::new(HPos::Left, VPos::Center))
        } else {
            TextStyle::from((FONT, 16).into_font()).pos(Pos::new(HPos::Center, VPos::Top))
        };

        for (label, &(x, y)) in labels.iter().zip(positions) {
            root.draw_text(label, &style, (x, y + 8))?;
        }
        Ok(())
    }

    fn draw_dashed_hline(
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
        x0: i32,
        x1: i32,
        y: i32,
    ) -> Result<(), ChartError> {
        let mut x = x0;
        while x < x1 {
            let end = (x + DASH).min(x1);
            root.draw(&PathElement::new(
                vec![(x, y), (end, y)],
                AVERAGE_GRAY.stroke_width(2),
            ))?;
            x += DASH + GAP;
        }
        Ok(())
    }
}

impl ChartPainter for StaticChartRenderer {
    fn bar_chart(&self, counts: &FrequencyCount, title: &str, path: &Path) -> Result<(), ChartError> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        if counts.is_empty() {
            Self::draw_no_data(&root, title)?;
            root.present()?;
            return Ok(());
        }

        let labels = counts.labels();
        let n = labels.len();
        let y_max = counts.max_count() as f64 * 1.1;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, (FONT, 30).into_font())
            .margin(20)
            .x_label_area_size(70)
            .y_label_area_size(70)
            .build_cartesian_2d(0f64..n as f64, 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(0)
            .x_label_formatter(&|_| String::new())
            .y_label_formatter(&|y| format!("{:.0}", y))
            .x_desc(counts.column.as_str())
            .y_desc("Count")
            .axis_desc_style((FONT, 16))
            .draw()?;

        chart.draw_series(counts.iter().enumerate().map(|(i, (_, count))| {
            let x = i as f64;
            Rectangle::new([(x + 0.15, 0.0), (x + 0.85, count as f64)], BAR_BLUE.filled())
        }))?;

        let positions: Vec<(i32, i32)> = (0..n)
            .map(|i| chart.backend_coord(&(i as f64 + 0.5, 0.0)))
            .collect();
        Self::draw_category_labels(&root, &labels, &positions, false)?;

        root.present()?;
        Ok(())
    }

    fn pie_chart(&self, counts: &FrequencyCount, title: &str, path: &Path) -> Result<(), ChartError> {
        // Square canvas keeps the pie circular
        let root = BitMapBackend::new(path, (self.pie_size, self.pie_size)).into_drawing_area();
        root.fill(&WHITE)?;

        if counts.is_empty() {
            Self::draw_no_data(&root, title)?;
            root.present()?;
            return Ok(());
        }

        let area = root.titled(title, (FONT, 30).into_font())?;
        let (w, h) = area.dim_in_pixel();
        let center = (w as i32 / 2, h as i32 / 2);
        let radius = f64::from(w.min(h)) * 0.33;

        let sizes: Vec<f64> = counts.iter().map(|(_, count)| count as f64).collect();
        let colors: Vec<RGBColor> = (0..sizes.len()).map(Self::palette_color).collect();
        let labels = counts.labels();

        let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        pie.start_angle(90.0);
        pie.label_style((FONT, 16).into_font().color(&BLACK));
        pie.percentages((FONT, 15).into_font().color(&WHITE));
        area.draw(&pie)?;

        root.present()?;
        Ok(())
    }

    fn department_chart(&self, summary: &DepartmentSummary, path: &Path) -> Result<(), ChartError> {
        let title = department_title(&summary.means.value_column);
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        if summary.means.is_empty() {
            Self::draw_no_data(&root, &title)?;
            root.present()?;
            return Ok(());
        }

        let labels = summary.means.keys();
        let n = labels.len();
        let top = summary
            .means
            .iter()
            .map(|(_, mean)| mean)
            .fold(summary.overall_average, f64::max);
        let y_max = if top > 0.0 { top * 1.1 } else { 1.0 };

        let mut chart = ChartBuilder::on(&root)
            .caption(&title, (FONT, 26).into_font())
            .margin(20)
            .x_label_area_size(190)
            .y_label_area_size(70)
            .build_cartesian_2d(0f64..n as f64, 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(0)
            .x_label_formatter(&|_| String::new())
            .x_desc("Department of Residence")
            .y_desc(format!("Average {}", summary.means.value_column))
            .axis_desc_style((FONT, 16))
            .draw()?;

        chart.draw_series(summary.means.iter().enumerate().map(|(i, (department, mean))| {
            let x = i as f64;
            let color = Self::department_color(department, summary);
            Rectangle::new([(x + 0.1, 0.0), (x + 0.9, mean)], color.filled())
        }))?;

        let positions: Vec<(i32, i32)> = (0..n)
            .map(|i| chart.backend_coord(&(i as f64 + 0.5, 0.0)))
            .collect();
        Self::draw_category_labels(&root, &labels, &positions, true)?;

        // Reference line across the whole plot
        let average = summary.overall_average;
        let (x0, y) = chart.backend_coord(&(0.0, average));
        let (x1, _) = chart.backend_coord(&(n as f64, average));
        Self::draw_dashed_hline(&root, x0, x1, y)?;

        let legend = TextStyle::from((FONT, 16).into_font().color(&AVERAGE_GRAY))
            .pos(Pos::new(HPos::Right, VPos::Bottom));
        root.draw_text(&average_label(average), &legend, (x1 - 4, y - 4))?;

        root.present()?;
        Ok(())
    }
}
