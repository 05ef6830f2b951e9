//! Price Trend Plotter Module
//! Renders yearly trimmed-mean prices as a PNG line chart with plotters.

use super::RenderError;
use crate::stats::{ChangeRecord, YearlyAggregates};
use plotters::prelude::*;
use std::path::Path;

/// Color palette for series
pub const PALETTE: [RGBColor; 10] = [
    RGBColor(231, 76, 60),   // Red
    RGBColor(46, 204, 113),  // Green
    RGBColor(155, 89, 182),  // Purple
    RGBColor(243, 156, 18),  // Orange
    RGBColor(26, 188, 156),  // Teal
    RGBColor(233, 30, 99),   // Pink
    RGBColor(0, 188, 212),   // Cyan
    RGBColor(255, 87, 34),   // Deep Orange
    RGBColor(121, 85, 72),   // Brown
    RGBColor(96, 125, 139),  // Blue Grey
];

/// Colour of the all-areas series.
pub const OVERALL_COLOR: RGBColor = RGBColor(52, 152, 219); // Blue

pub const CHART_SIZE: (u32, u32) = (1200, 700);

/// One named line.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries {
    pub name: String,
    pub points: Vec<(i32, f64)>,
}

/// Everything needed to draw the trend chart.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendChartData {
    pub title: String,
    pub overall: TimeSeries,
    pub prefixes: Vec<TimeSeries>,
}

impl TrendChartData {
    /// Overall series plus the `limit` prefixes with the largest absolute
    /// percentage change.
    pub fn build(
        title: &str,
        overall: Vec<(i32, f64)>,
        aggregates: &YearlyAggregates,
        changes: &[ChangeRecord],
        limit: usize,
    ) -> Self {
        let mut ranked: Vec<&ChangeRecord> = changes.iter().collect();
        ranked.sort_by(|a, b| {
            b.percent
                .abs()
                .total_cmp(&a.percent.abs())
                .then_with(|| a.prefix.cmp(&b.prefix))
        });

        let prefixes = ranked
            .into_iter()
            .take(limit)
            .map(|change| TimeSeries {
                name: change.prefix.clone(),
                points: aggregates.series(&change.prefix),
            })
            .collect();

        Self {
            title: title.to_string(),
            overall: TimeSeries {
                name: "All areas".to_string(),
                points: overall,
            },
            prefixes,
        }
    }

    fn all_series(&self) -> impl Iterator<Item = &TimeSeries> {
        std::iter::once(&self.overall).chain(self.prefixes.iter())
    }

    /// Year and price bounds with some headroom, `None` if there are no points.
    pub fn ranges(&self) -> Option<(std::ops::Range<i32>, std::ops::Range<f64>)> {
        let points: Vec<(i32, f64)> = self
            .all_series()
            .flat_map(|s| s.points.iter().copied())
            .collect();
        if points.is_empty() {
            return None;
        }

        let (mut x_min, mut x_max) = (i32::MAX, i32::MIN);
        let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for (x, y) in points {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }

        let pad = ((y_max - y_min) * 0.1).max(y_max.abs() * 0.05).max(1.0);
        Some((
            (x_min - 1)..(x_max + 1),
            (y_min - pad).max(0.0)..(y_max + pad),
        ))
    }
}

/// Draws trend charts to image files.
pub struct TrendPlotter;

impl TrendPlotter {
    fn draw_err<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> RenderError {
        RenderError::Chart(err.to_string())
    }

    /// Render `data` as a PNG at `path`.
    pub fn render_png(data: &TrendChartData, path: &Path) -> Result<(), RenderError> {
        let Some((x_range, y_range)) = data.ranges() else {
            return Err(RenderError::Chart("no data points to plot".to_string()));
        };

        let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(Self::draw_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(&data.title, ("sans-serif", 26))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(90)
            .build_cartesian_2d(x_range, y_range)
            .map_err(Self::draw_err)?;

        chart
            .configure_mesh()
            .x_desc("Year")
            .y_desc("Trimmed mean price (£)")
            .x_label_formatter(&|year| year.to_string())
            .y_label_formatter(&|price| format!("{:.0}", price))
            .draw()
            .map_err(Self::draw_err)?;

        let styled = std::iter::once((&data.overall, OVERALL_COLOR)).chain(
            data.prefixes
                .iter()
                .enumerate()
                .map(|(i, s)| (s, PALETTE[i % PALETTE.len()])),
        );

        for (series, color) in styled {
            if series.points.is_empty() {
                continue;
            }
            chart
                .draw_series(LineSeries::new(
                    series.points.iter().copied(),
                    color.stroke_width(2),
                ))
                .map_err(Self::draw_err)?
                .label(series.name.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

            chart
                .draw_series(
                    series
                        .points
                        .iter()
                        .map(|&point| Circle::new(point, 3, color.filled())),
                )
                .map_err(Self::draw_err)?;
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .position(SeriesLabelPosition::UpperLeft)
            .draw()
            .map_err(Self::draw_err)?;

        root.present().map_err(Self::draw_err)?;
        Ok(())
    }
}
