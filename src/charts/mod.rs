//! Charts module - Map and chart rendering

mod map;
mod palette;
mod plotter;

use thiserror::Error;

pub use map::{escape_html, LeafletMap, Legend, LegendEntry, MapMarker, TileLayer};
pub use palette::{
    band_colour, interp_color, ChangeColourScale, Palette, Rgb, BAND_COLOURS, DECREASE_END,
    DECREASE_START, INCREASE_END, INCREASE_START,
};
pub use plotter::{TimeSeries, TrendChartData, TrendPlotter};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode map data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Chart rendering failed: {0}")]
    Chart(String),
}
