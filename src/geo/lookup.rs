//! Postcode Lookup Module
//! Coordinate type and the postcode table used to place areas on the map.

use log::info;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Postcode table not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("Failed to load postcode table: {0}")]
    TableError(#[from] PolarsError),
}

/// Latitude/longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Arithmetic mean of a set of points, `None` when empty.
    pub fn centroid(points: &[Coordinate]) -> Option<Coordinate> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f64;
        let (lat, lon) = points
            .iter()
            .fold((0.0, 0.0), |(lat, lon), p| (lat + p.lat, lon + p.lon));
        Some(Coordinate::new(lat / n, lon / n))
    }
}

/// Anything that can place a postcode.
pub trait PostcodeLookup {
    fn locate(&self, postcode: &str) -> Option<Coordinate>;
}

/// GeoNames postal code dump layout: tab separated, no header.
const GEONAMES_COLUMNS: [&str; 12] = [
    "country_code",
    "postal_code",
    "place_name",
    "admin_name1",
    "admin_code1",
    "admin_name2",
    "admin_code2",
    "admin_name3",
    "admin_code3",
    "latitude",
    "longitude",
    "accuracy",
];

/// Upper-case and collapse internal whitespace: `" m1  1ae"` -> `"M1 1AE"`.
fn normalise(postcode: &str) -> String {
    postcode
        .split_whitespace()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// In-memory postcode to coordinate table.
#[derive(Debug, Clone, Default)]
pub struct PostcodeTable {
    entries: HashMap<String, Coordinate>,
}

impl PostcodeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Coordinate)>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for (postcode, coordinate) in entries {
            table.insert(postcode.as_ref(), coordinate);
        }
        table
    }

    pub fn insert(&mut self, postcode: &str, coordinate: Coordinate) {
        let key = normalise(postcode);
        if !key.is_empty() {
            self.entries.insert(key, coordinate);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a GeoNames postal code file (e.g. `GB.txt` or `GB_full.txt`).
    ///
    /// Rows whose latitude or longitude do not parse are skipped.
    pub fn load_geonames(path: &Path) -> Result<Self, GeoError> {
        if !path.exists() {
            return Err(GeoError::FileNotFound(path.to_path_buf()));
        }

        let schema = Schema::from_iter(
            GEONAMES_COLUMNS
                .iter()
                .map(|name| Field::new((*name).into(), DataType::String)),
        );
        let path_str = path.to_string_lossy().to_string();
        let df = LazyCsvReader::new(path_str.as_str())
            .with_has_header(false)
            .with_separator(b'\t')
            .with_schema(Some(Arc::new(schema)))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        let codes = df.column("postal_code")?.str()?;
        let lats = df.column("latitude")?.cast(&DataType::Float64)?;
        let lons = df.column("longitude")?.cast(&DataType::Float64)?;
        let lats = lats.f64()?;
        let lons = lons.f64()?;

        let mut table = Self::new();
        for i in 0..df.height() {
            if let (Some(code), Some(lat), Some(lon)) = (codes.get(i), lats.get(i), lons.get(i)) {
                table.insert(code, Coordinate::new(lat, lon));
            }
        }

        info!("loaded {} postcodes from {}", table.len(), path.display());
        Ok(table)
    }
}

impl PostcodeLookup for PostcodeTable {
    /// Full postcode first, then the outward code on its own.
    fn locate(&self, postcode: &str) -> Option<Coordinate> {
        let key = normalise(postcode);
        if let Some(found) = self.entries.get(&key) {
            return Some(*found);
        }
        let outward = key.split(' ').next()?;
        self.entries.get(outward).copied()
    }
}
