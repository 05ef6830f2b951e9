//! Settings and defaults for map generation.

use crate::charts::Palette;
use crate::geo::Coordinate;
use crate::stats::TrimProportion;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CSV: &str = "2019 to today manc.csv";
pub const DEFAULT_OUTPUT: &str = "manchester_price_change_map.html";

/// Manchester city centre. Also where unplaced prefixes end up.
pub const MAP_CENTRE: Coordinate = Coordinate::new(53.4808, -2.2426);

pub const CHANGE_MAP_ZOOM: u8 = 10;
pub const CHANGE_MARKER_RADIUS: u32 = 8;
pub const BAND_MAP_ZOOM: u8 = 11;
pub const BAND_MARKER_RADIUS: u32 = 5;
pub const DEFAULT_CHART_SERIES: usize = 6;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// User settings for a run. Every field may be omitted from a config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    pub csv_path: PathBuf,
    pub output_path: PathBuf,
    pub postcodes_path: Option<PathBuf>,
    pub chart_path: Option<PathBuf>,
    pub bands_output_path: Option<PathBuf>,
    pub trim: TrimProportion,
    pub centre: Coordinate,
    pub zoom: u8,
    pub marker_radius: u32,
    pub increase_palette: Palette,
    pub decrease_palette: Palette,
    pub chart_series: usize,
    pub heatmap: bool,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from(DEFAULT_CSV),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            postcodes_path: None,
            chart_path: None,
            bands_output_path: None,
            trim: TrimProportion::default(),
            centre: MAP_CENTRE,
            zoom: CHANGE_MAP_ZOOM,
            marker_radius: CHANGE_MARKER_RADIUS,
            increase_palette: Palette::INCREASE,
            decrease_palette: Palette::DECREASE,
            chart_series: DEFAULT_CHART_SERIES,
            heatmap: false,
        }
    }
}

impl MapSettings {
    /// Read settings from a JSON file; absent keys keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
