//! pricemap - Land Registry price paid analysis & interactive maps
//!
//! Loads price paid CSV exports, aggregates trimmed-mean prices by postcode
//! area and year, and renders price change maps, price band maps and trend
//! charts.

pub mod charts;
pub mod config;
pub mod data;
pub mod geo;
pub mod pipeline;
pub mod stats;

pub use config::MapSettings;
pub use pipeline::{run, PipelineError, PriceChangeMap, RunReport};
