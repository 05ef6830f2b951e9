//! Batch pipeline: load, aggregate, colour and render.

use crate::charts::{
    band_colour, escape_html, ChangeColourScale, LeafletMap, Legend, MapMarker, RenderError,
    TileLayer, TrendChartData, TrendPlotter,
};
use crate::config::{MapSettings, BAND_MAP_ZOOM, BAND_MARKER_RADIUS};
use crate::data::{DataLoader, DataProcessor, LoaderError, ProcessorError, Transaction};
use crate::geo::{Coordinate, GeoError, Geocoder, Placement, PostcodeLookup, PostcodeTable};
use crate::stats::{
    ChangeExtremes, ChangeRecord, PriceBands, StatsCalculator, TrimProportion, YearlyAggregates,
};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Processor(#[from] ProcessorError),
    #[error(transparent)]
    Geo(#[from] GeoError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Years must be within {available:?}")]
    YearNotFound { requested: i32, available: Vec<i32> },
}

/// Price change map together with the numbers behind it.
#[derive(Debug, Clone)]
pub struct PriceChangeMap {
    pub map: LeafletMap,
    pub aggregates: YearlyAggregates,
    pub changes: Vec<ChangeRecord>,
    pub extremes: ChangeExtremes,
    /// Prefixes drawn at the fallback point.
    pub unlocated: Vec<String>,
}

/// Files written by [`run`].
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub change_map: PathBuf,
    pub band_map: Option<PathBuf>,
    pub chart: Option<PathBuf>,
    pub changes: usize,
}

/// Load and type the price paid CSV.
pub fn load_transactions(path: &Path) -> Result<Vec<Transaction>, PipelineError> {
    let df = DataLoader::load_csv(path)?;
    let (transactions, _) = DataProcessor::to_transactions(&df)?;
    Ok(transactions)
}

/// Both requested years must have at least one transaction.
pub fn validate_years(transactions: &[Transaction], year1: i32, year2: i32) -> Result<(), PipelineError> {
    let available = DataProcessor::available_years(transactions);
    for requested in [year1, year2] {
        if !available.contains(&requested) {
            return Err(PipelineError::YearNotFound {
                requested,
                available: available.into_iter().collect(),
            });
        }
    }
    Ok(())
}

/// Postcode table from settings, or an empty one (everything falls back).
pub fn load_lookup(settings: &MapSettings) -> Result<PostcodeTable, PipelineError> {
    match &settings.postcodes_path {
        Some(path) => Ok(PostcodeTable::load_geonames(path)?),
        None => {
            warn!("no postcode table given; every area will be drawn at the map centre");
            Ok(PostcodeTable::new())
        }
    }
}

/// `250000.0` -> `"250,000"`.
pub fn format_price(price: f64) -> String {
    let whole = price.round() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if whole < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Popup text for one prefix, e.g. `M1: £+50000 (+50.00%)`.
pub fn change_label(change: &ChangeRecord) -> String {
    format!(
        "{}: £{:+.0} ({:+.2}%)",
        change.prefix, change.absolute, change.percent
    )
}

/// Log count, mean, median and trimmed mean for every year in the data.
pub fn log_year_summaries(transactions: &[Transaction], trim: TrimProportion) {
    for (year, prices) in DataProcessor::prices_by_year(transactions) {
        let summary = StatsCalculator::compute_summary(&prices, trim);
        info!(
            "{year}: {} sales, mean £{}, median £{}, trimmed mean £{}",
            summary.count,
            format_price(summary.mean),
            format_price(summary.median),
            summary
                .trimmed_mean
                .map(format_price)
                .unwrap_or_else(|| "-".to_string())
        );
        debug!(
            "{year}: std £{}, 5th pct £{}, 95th pct £{}",
            format_price(summary.std),
            format_price(summary.p05),
            format_price(summary.p95)
        );
    }
}

/// Aggregate by prefix and year, compute the change between the two years
/// and draw one coloured marker per prefix with a defined change.
pub fn build_price_change_map<L: PostcodeLookup + ?Sized>(
    transactions: &[Transaction],
    lookup: &L,
    settings: &MapSettings,
    year1: i32,
    year2: i32,
) -> PriceChangeMap {
    let groups = DataProcessor::prices_by_prefix_year(transactions);
    let aggregates = StatsCalculator::yearly_aggregates(&groups, settings.trim);
    let changes = StatsCalculator::compute_changes(&aggregates, year1, year2);
    let extremes = ChangeExtremes::from_changes(&changes);
    info!(
        "{} prefixes aggregated, {} with a change between {year1} and {year2}",
        aggregates.len(),
        changes.len()
    );

    let placements = Geocoder::new(lookup, settings.centre)
        .place_prefixes(transactions, changes.iter().map(|c| c.prefix.as_str()));
    let scale = ChangeColourScale::new(settings.increase_palette, settings.decrease_palette, extremes);

    let mut map = LeafletMap::new(
        &format!("House price change {year1} to {year2}"),
        settings.centre,
        settings.zoom,
    );
    let mut unlocated = Vec::new();

    for change in &changes {
        let placement = placements
            .get(&change.prefix)
            .copied()
            .unwrap_or(Placement::Fallback(settings.centre));
        if placement.is_fallback() {
            unlocated.push(change.prefix.clone());
        }
        let coordinate = placement.coordinate();
        map.add_marker(MapMarker {
            lat: coordinate.lat,
            lon: coordinate.lon,
            radius: settings.marker_radius,
            colour: scale.colour_for(change.percent),
            popup: escape_html(&change_label(change)),
        });
    }

    map.set_legend(
        Legend::new(&format!("Price change {year1}-{year2}"))
            .entry(
                &settings.increase_palette.end.to_hex(),
                &format!("Largest rise ({:+.2}%)", extremes.max_increase),
            )
            .entry(&settings.increase_palette.start.to_hex(), "Small rise")
            .entry(&settings.decrease_palette.start.to_hex(), "Small fall")
            .entry(
                &settings.decrease_palette.end.to_hex(),
                &format!("Largest fall ({:+.2}%)", extremes.max_decrease),
            ),
    );

    PriceChangeMap {
        map,
        aggregates,
        changes,
        extremes,
        unlocated,
    }
}

/// Every geocoded sale as a marker coloured by its price quintile.
pub fn build_price_band_map<L: PostcodeLookup + ?Sized>(
    transactions: &[Transaction],
    lookup: &L,
    settings: &MapSettings,
) -> LeafletMap {
    let located = Geocoder::new(lookup, settings.centre).locate_transactions(transactions);
    let prices: Vec<f64> = located.iter().map(|(tx, _)| tx.price).collect();
    let bands = PriceBands::from_prices(&prices);

    let points: Vec<Coordinate> = located.iter().map(|(_, c)| *c).collect();
    let centre = Coordinate::centroid(&points).unwrap_or(settings.centre);

    let mut map = LeafletMap::new("House prices", centre, BAND_MAP_ZOOM)
        .with_tiles(TileLayer::CartoDbPositron)
        .with_scale_control(true)
        .with_fullscreen(true)
        .with_clustering(true);

    for (tx, coordinate) in &located {
        let colour = band_colour(bands.band_of(tx.price));
        let popup = format!(
            "{} {}<br>£{}<br>{}",
            escape_html(&tx.attributes.street),
            escape_html(&tx.postcode),
            format_price(tx.price),
            tx.date
        );
        map.add_marker(MapMarker {
            lat: coordinate.lat,
            lon: coordinate.lon,
            radius: BAND_MARKER_RADIUS,
            colour: colour.to_string(),
            popup,
        });
    }

    map.set_legend(
        Legend::new("Price Range")
            .entry(band_colour(0), "Lowest")
            .entry(band_colour(1), "")
            .entry(band_colour(2), "")
            .entry(band_colour(3), "")
            .entry(band_colour(4), "Highest"),
    );

    if settings.heatmap {
        map.set_heat_points(points);
    }
    map
}

/// Trimmed-mean trend for all areas plus the biggest movers.
pub fn build_trend_chart(
    transactions: &[Transaction],
    change_map: &PriceChangeMap,
    settings: &MapSettings,
) -> TrendChartData {
    let overall: Vec<(i32, f64)> = DataProcessor::prices_by_year(transactions)
        .into_iter()
        .filter_map(|(year, prices)| {
            StatsCalculator::trimmed_mean(&prices, settings.trim).map(|mean| (year, mean))
        })
        .collect();

    TrendChartData::build(
        "Trimmed mean sale price by year",
        overall,
        &change_map.aggregates,
        &change_map.changes,
        settings.chart_series,
    )
}

/// Run the whole batch: read, validate, aggregate, render and write.
pub fn run(settings: &MapSettings, year1: i32, year2: i32) -> Result<RunReport, PipelineError> {
    let transactions = load_transactions(&settings.csv_path)?;
    validate_years(&transactions, year1, year2)?;
    log_year_summaries(&transactions, settings.trim);

    let lookup = load_lookup(settings)?;
    let change_map = build_price_change_map(&transactions, &lookup, settings, year1, year2);
    change_map.map.save(&settings.output_path)?;
    info!(
        "wrote {} markers to {}",
        change_map.map.markers().len(),
        settings.output_path.display()
    );

    let mut report = RunReport {
        change_map: settings.output_path.clone(),
        changes: change_map.changes.len(),
        ..RunReport::default()
    };

    if let Some(path) = &settings.bands_output_path {
        let band_map = build_price_band_map(&transactions, &lookup, settings);
        band_map.save(path)?;
        info!("wrote {} markers to {}", band_map.markers().len(), path.display());
        report.band_map = Some(path.clone());
    }

    if let Some(path) = &settings.chart_path {
        let chart = build_trend_chart(&transactions, &change_map, settings);
        TrendPlotter::render_png(&chart, path)?;
        info!("wrote trend chart to {}", path.display());
        report.chart = Some(path.clone());
    }

    Ok(report)
}
