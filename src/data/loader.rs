//! CSV Data Loader Module
//! Reads Land Registry price paid CSV files into a Polars DataFrame.

use super::record::PPD_COLUMNS;
use log::{debug, info};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("CSV not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
}

/// Loads the fixed 16-column price paid schema (no header row).
pub struct DataLoader;

impl DataLoader {
    /// Every column is read as text; the price column is cast afterwards so a
    /// malformed value becomes null instead of failing the whole file.
    fn schema() -> Schema {
        Schema::from_iter(
            PPD_COLUMNS
                .iter()
                .map(|name| Field::new((*name).into(), DataType::String)),
        )
    }

    /// Load a price paid CSV file.
    pub fn load_csv(file_path: &Path) -> Result<DataFrame, LoaderError> {
        if !file_path.exists() {
            return Err(LoaderError::FileNotFound(file_path.to_path_buf()));
        }

        let path_str = file_path.to_string_lossy().to_string();
        debug!("reading {path_str}");

        let mut df = LazyCsvReader::new(path_str.as_str())
            .with_has_header(false)
            .with_schema(Some(Arc::new(Self::schema())))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        let price = df.column("price")?.cast(&DataType::Float64)?;
        df.with_column(price)?;

        info!(
            "loaded {} rows from {}",
            df.height(),
            file_path.display()
        );
        Ok(df)
    }
}
