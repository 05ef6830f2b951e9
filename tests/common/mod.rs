//! Shared fixtures for the pricemap integration tests.
//!
//! Writes small price paid CSV files (same quoting and column order as the
//! Land Registry export) into a temporary directory.

#![allow(dead_code)]

use pricemap::geo::{Coordinate, PostcodeTable};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// One sale: (price, date, postcode, street).
pub type Sale<'a> = (&'a str, &'a str, &'a str, &'a str);

/// Render sales as price paid CSV rows, without a header.
pub fn ppd_csv(sales: &[Sale]) -> String {
    sales
        .iter()
        .enumerate()
        .map(|(i, (price, date, postcode, street))| {
            format!(
                "\"{{TX-{i:04}}}\",\"{price}\",\"{date} 00:00\",\"{postcode}\",\"T\",\"N\",\"F\",\"{}\",\"\",\"{street}\",\"\",\"MANCHESTER\",\"MANCHESTER\",\"GREATER MANCHESTER\",\"A\",\"A\"\n",
                i + 1
            )
        })
        .collect()
}

/// Write `sales` to `prices.csv` in a fresh temp dir.
///
/// The caller must keep the `TempDir` alive for as long as the file is used.
pub fn write_sales(sales: &[Sale]) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("prices.csv");
    fs::write(&path, ppd_csv(sales)).unwrap();
    (dir, path)
}

/// Outward codes around Manchester.
pub fn manchester_postcodes() -> PostcodeTable {
    PostcodeTable::from_entries([
        ("M1", Coordinate::new(53.4794, -2.2453)),
        ("M14", Coordinate::new(53.4480, -2.2240)),
        ("M20", Coordinate::new(53.4262, -2.2334)),
        ("WA14", Coordinate::new(53.3838, -2.3547)),
    ])
}
