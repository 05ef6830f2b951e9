//! pricemap - House price change map generator
//!
//! Command line front end for the price paid analysis pipeline.

use anyhow::Context;
use clap::Parser;
use pricemap::config::MapSettings;
use pricemap::stats::TrimProportion;
use std::path::PathBuf;

/// Generate a postcode-area house price change map.
#[derive(Parser, Debug)]
#[command(name = "pricemap", version, about)]
struct Cli {
    /// First year
    year1: i32,
    /// Second year
    year2: i32,
    /// CSV file with price data
    #[arg(long)]
    csv: Option<PathBuf>,
    /// Output HTML file
    #[arg(long)]
    output: Option<PathBuf>,
    /// GeoNames postal code file used to place areas
    #[arg(long)]
    postcodes: Option<PathBuf>,
    /// JSON settings file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Share of each price tail dropped before averaging, in [0, 0.5)
    #[arg(long)]
    trim: Option<f64>,
    /// Also write a PNG trend chart here
    #[arg(long)]
    chart: Option<PathBuf>,
    /// Also write a price band map here
    #[arg(long)]
    bands_output: Option<PathBuf>,
    /// Add a heat layer to the price band map
    #[arg(long)]
    heatmap: bool,
    /// Open the price change map in the default browser when done
    #[arg(long)]
    open: bool,
}

impl Cli {
    /// Config file values first, then flags on top.
    fn settings(&self) -> anyhow::Result<MapSettings> {
        let mut settings = match &self.config {
            Some(path) => MapSettings::from_json_file(path)?,
            None => MapSettings::default(),
        };

        if let Some(csv) = &self.csv {
            settings.csv_path = csv.clone();
        }
        if let Some(output) = &self.output {
            settings.output_path = output.clone();
        }
        if let Some(postcodes) = &self.postcodes {
            settings.postcodes_path = Some(postcodes.clone());
        }
        if let Some(trim) = self.trim {
            settings.trim = TrimProportion::new(trim)?;
        }
        if let Some(chart) = &self.chart {
            settings.chart_path = Some(chart.clone());
        }
        if let Some(bands) = &self.bands_output {
            settings.bands_output_path = Some(bands.clone());
        }
        if self.heatmap {
            settings.heatmap = true;
        }
        Ok(settings)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = cli.settings()?;

    let report = pricemap::run(&settings, cli.year1, cli.year2)?;
    println!("Map saved to {}", report.change_map.display());
    if let Some(path) = &report.band_map {
        println!("Price band map saved to {}", path.display());
    }
    if let Some(path) = &report.chart {
        println!("Trend chart saved to {}", path.display());
    }

    if cli.open {
        open::that(&report.change_map)
            .with_context(|| format!("could not open {}", report.change_map.display()))?;
    }
    Ok(())
}
