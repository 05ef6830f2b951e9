//! End-to-end tests for the price change map.

mod common;

use pricemap::charts::{DECREASE_END, INCREASE_END};
use pricemap::geo::{Coordinate, PostcodeTable};
use pricemap::pipeline::{self, build_price_change_map, load_transactions, validate_years};
use pricemap::{MapSettings, PipelineError};

fn settings_for(csv: &std::path::Path, output: &std::path::Path) -> MapSettings {
    MapSettings {
        csv_path: csv.to_path_buf(),
        output_path: output.to_path_buf(),
        ..MapSettings::default()
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[test]
fn two_sales_give_fifty_percent_rise() {
    let (dir, csv) = common::write_sales(&[
        ("100000", "2020-03-01", "M1 1AE", "HIGH STREET"),
        ("150000", "2021-03-01", "M1 2BB", "LOW STREET"),
    ]);
    let output = dir.path().join("map.html");

    let report = pipeline::run(&settings_for(&csv, &output), 2020, 2021).unwrap();
    assert_eq!(report.changes, 1);
    assert_eq!(report.change_map, output);

    let html = std::fs::read_to_string(&output).unwrap();
    assert!(html.contains("M1: £+50000 (+50.00%)"));
    assert!(html.contains(&format!("\"colour\":\"{}\"", INCREASE_END.to_hex())));
    // No postcode table: the marker sits on the map centre.
    assert!(html.contains("\"lat\":53.4808,\"lon\":-2.2426"));
}

#[test]
fn missing_csv_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("missing.csv");
    let output = dir.path().join("map.html");

    let err = pipeline::run(&settings_for(&csv, &output), 2020, 2021).unwrap_err();
    assert!(matches!(err, PipelineError::Loader(_)));
    assert!(err.to_string().starts_with("CSV not found:"));
    assert!(!output.exists());
}

#[test]
fn unknown_year_lists_valid_years() {
    let (dir, csv) = common::write_sales(&[
        ("100000", "2020-03-01", "M1 1AE", "HIGH STREET"),
        ("150000", "2021-03-01", "M1 2BB", "LOW STREET"),
    ]);
    let output = dir.path().join("map.html");

    let err = pipeline::run(&settings_for(&csv, &output), 2019, 2021).unwrap_err();
    match &err {
        PipelineError::YearNotFound { requested, available } => {
            assert_eq!(*requested, 2019);
            assert_eq!(available, &vec![2020, 2021]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.to_string(), "Years must be within [2020, 2021]");
}

// ---------------------------------------------------------------------------
// build_price_change_map
// ---------------------------------------------------------------------------

#[test]
fn colours_follow_direction_and_size_of_change() {
    let (_dir, csv) = common::write_sales(&[
        ("100000", "2020-01-10", "M1 1AE", "A STREET"),
        ("150000", "2021-01-10", "M1 1AE", "A STREET"),
        ("200000", "2020-01-10", "M14 5AA", "B STREET"),
        ("220000", "2021-01-10", "M14 5AA", "B STREET"),
        ("300000", "2020-01-10", "M20 2PP", "C STREET"),
        ("210000", "2021-01-10", "M20 2PP", "C STREET"),
        ("90000", "2021-01-10", "WA14 1AA", "D STREET"),
    ]);
    let transactions = load_transactions(&csv).unwrap();
    validate_years(&transactions, 2020, 2021).unwrap();

    let table = common::manchester_postcodes();
    let result = build_price_change_map(&transactions, &table, &MapSettings::default(), 2020, 2021);

    // WA14 only has 2021 sales, so it gets no change and no marker.
    let prefixes: Vec<&str> = result.changes.iter().map(|c| c.prefix.as_str()).collect();
    assert_eq!(prefixes, vec!["M1", "M14", "M20"]);
    assert_eq!(result.map.markers().len(), 3);
    assert!(result.unlocated.is_empty());

    assert_eq!(result.extremes.max_increase, 50.0);
    assert_eq!(result.extremes.max_decrease, -30.0);

    let markers = result.map.markers();
    assert_eq!(markers[0].colour, INCREASE_END.to_hex());
    assert_eq!(markers[0].lat, 53.4794);
    assert_ne!(markers[1].colour, INCREASE_END.to_hex());
    assert!(markers[1].popup.contains("(+10.00%)"));
    assert_eq!(markers[2].colour, DECREASE_END.to_hex());
    assert!(markers[2].popup.contains("£-90000 (-30.00%)"));
}

#[test]
fn unknown_prefixes_fall_back_to_centre() {
    let (_dir, csv) = common::write_sales(&[
        ("100000", "2020-01-10", "ZZ9 9ZZ", "NOWHERE"),
        ("110000", "2021-01-10", "ZZ9 9ZZ", "NOWHERE"),
    ]);
    let transactions = load_transactions(&csv).unwrap();
    let settings = MapSettings {
        centre: Coordinate::new(51.5, -0.12),
        ..MapSettings::default()
    };

    let result = build_price_change_map(&transactions, &PostcodeTable::new(), &settings, 2020, 2021);
    assert_eq!(result.unlocated, vec!["ZZ9".to_string()]);
    assert_eq!(result.map.markers()[0].lat, 51.5);
    assert_eq!(result.map.markers()[0].lon, -0.12);
}

#[test]
fn only_drawn_prefixes_count_as_unlocated() {
    let (_dir, csv) = common::write_sales(&[
        ("100000", "2020-01-10", "M1 1AE", "A STREET"),
        ("120000", "2021-01-10", "M1 1AE", "A STREET"),
        ("100000", "2020-01-10", "QQ1 1QQ", "B STREET"),
        ("105000", "2021-01-10", "QQ1 1QQ", "B STREET"),
        ("90000", "2021-01-10", "ZZ9 9ZZ", "C STREET"),
    ]);
    let transactions = load_transactions(&csv).unwrap();

    let result = build_price_change_map(
        &transactions,
        &common::manchester_postcodes(),
        &MapSettings::default(),
        2020,
        2021,
    );

    // ZZ9 has no 2020 sale, so it is neither drawn nor reported.
    assert_eq!(result.map.markers().len(), 2);
    assert_eq!(result.unlocated, vec!["QQ1".to_string()]);
}

#[test]
fn bucket_emptied_by_trim_gives_no_change() {
    let (_dir, csv) = common::write_sales(&[
        ("100000", "2020-01-10", "M1 1AE", "A STREET"),
        ("150000", "2021-01-10", "M1 1AE", "A STREET"),
        ("200000", "2020-01-10", "M14 5AA", "B STREET"),
        ("250000", "2020-02-10", "M14 5AA", "B STREET"),
        ("260000", "2021-01-10", "M14 5AA", "B STREET"),
    ]);
    let transactions = load_transactions(&csv).unwrap();

    let result = build_price_change_map(
        &transactions,
        &common::manchester_postcodes(),
        &MapSettings::default(),
        2020,
        2021,
    );

    // Two distinct prices both fall outside the 10% trim bounds.
    assert_eq!(result.aggregates.get("M14", 2020), None);
    assert_eq!(result.aggregates.get("M14", 2021), Some(260000.0));

    let prefixes: Vec<&str> = result.changes.iter().map(|c| c.prefix.as_str()).collect();
    assert_eq!(prefixes, vec!["M1"]);
    assert_eq!(result.map.markers().len(), 1);
    assert!(result.map.markers()[0].popup.starts_with("M1:"));
}

#[test]
fn trimming_ignores_outlier_sales() {
    let mut sales = vec![
        ("1", "2020-05-01", "M1 1AE", "X"),
        ("100000", "2020-05-01", "M1 1AE", "X"),
        ("100000", "2020-05-01", "M1 1AE", "X"),
        ("100000", "2020-05-01", "M1 1AE", "X"),
        ("100000", "2020-05-01", "M1 1AE", "X"),
        ("100000", "2020-05-01", "M1 1AE", "X"),
        ("100000", "2020-05-01", "M1 1AE", "X"),
        ("100000", "2020-05-01", "M1 1AE", "X"),
        ("100000", "2020-05-01", "M1 1AE", "X"),
        ("90000000", "2020-05-01", "M1 1AE", "X"),
    ];
    sales.push(("120000", "2021-05-01", "M1 1AE", "X"));
    let (_dir, csv) = common::write_sales(&sales);

    let transactions = load_transactions(&csv).unwrap();
    let result = build_price_change_map(
        &transactions,
        &common::manchester_postcodes(),
        &MapSettings::default(),
        2020,
        2021,
    );

    assert_eq!(result.aggregates.get("M1", 2020), Some(100000.0));
    assert!((result.changes[0].percent - 20.0).abs() < 1e-9);
}
