//! Data Processor Module
//! Converts the raw price paid frame into typed transactions and groups them.

use super::record::{parse_date, PropertyAttributes, Transaction};
use log::warn;
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column {0} is missing or has the wrong type")]
    BadColumn(String),
}

/// Rows skipped while converting the frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DroppedRows {
    pub bad_price: usize,
    pub bad_date: usize,
}

impl DroppedRows {
    pub fn total(&self) -> usize {
        self.bad_price + self.bad_date
    }
}

/// Handles data cleaning and grouping operations.
pub struct DataProcessor;

impl DataProcessor {
    fn text_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a StringChunked, ProcessorError> {
        df.column(name)
            .and_then(|col| col.str())
            .map_err(|_| ProcessorError::BadColumn(name.to_string()))
    }

    /// Build transactions from a loaded frame.
    ///
    /// Rows with a missing or non-positive price, or a date that cannot be
    /// parsed, are dropped and counted.
    pub fn to_transactions(
        df: &DataFrame,
    ) -> Result<(Vec<Transaction>, DroppedRows), ProcessorError> {
        let prices = df
            .column("price")?
            .f64()
            .map_err(|_| ProcessorError::BadColumn("price".to_string()))?;

        let ids = Self::text_column(df, "transaction_id")?;
        let dates = Self::text_column(df, "date")?;
        let postcodes = Self::text_column(df, "postcode")?;
        let property_type = Self::text_column(df, "property_type")?;
        let old_new = Self::text_column(df, "old_new")?;
        let duration = Self::text_column(df, "duration")?;
        let paon = Self::text_column(df, "paon")?;
        let saon = Self::text_column(df, "saon")?;
        let street = Self::text_column(df, "street")?;
        let locality = Self::text_column(df, "locality")?;
        let town = Self::text_column(df, "town")?;
        let district = Self::text_column(df, "district")?;
        let county = Self::text_column(df, "county")?;
        let ppd_category = Self::text_column(df, "ppd_category")?;
        let record_status = Self::text_column(df, "record_status")?;

        let text = |ca: &StringChunked, i: usize| ca.get(i).unwrap_or_default().trim().to_string();

        let mut dropped = DroppedRows::default();
        let mut transactions = Vec::with_capacity(df.height());

        for i in 0..df.height() {
            let price = match prices.get(i) {
                Some(p) if p.is_finite() && p > 0.0 => p,
                _ => {
                    dropped.bad_price += 1;
                    continue;
                }
            };
            let Some(date) = dates.get(i).and_then(parse_date) else {
                dropped.bad_date += 1;
                continue;
            };

            transactions.push(Transaction {
                id: text(ids, i),
                price,
                date,
                postcode: text(postcodes, i),
                attributes: PropertyAttributes {
                    property_type: text(property_type, i),
                    old_new: text(old_new, i),
                    duration: text(duration, i),
                    paon: text(paon, i),
                    saon: text(saon, i),
                    street: text(street, i),
                    locality: text(locality, i),
                    town: text(town, i),
                    district: text(district, i),
                    county: text(county, i),
                    ppd_category: text(ppd_category, i),
                    record_status: text(record_status, i),
                },
            });
        }

        if dropped.total() > 0 {
            warn!(
                "dropped {} rows ({} without a usable price, {} without a usable date)",
                dropped.total(),
                dropped.bad_price,
                dropped.bad_date
            );
        }

        Ok((transactions, dropped))
    }

    /// Distinct years present, ascending.
    pub fn available_years(transactions: &[Transaction]) -> BTreeSet<i32> {
        transactions.iter().map(Transaction::year).collect()
    }

    /// Prices grouped by (prefix, year). Transactions without a prefix are skipped.
    pub fn prices_by_prefix_year(transactions: &[Transaction]) -> BTreeMap<(String, i32), Vec<f64>> {
        let mut groups: BTreeMap<(String, i32), Vec<f64>> = BTreeMap::new();
        for tx in transactions {
            if let Some(prefix) = tx.prefix() {
                groups
                    .entry((prefix.to_string(), tx.year()))
                    .or_default()
                    .push(tx.price);
            }
        }
        groups
    }

    /// Prices grouped by year across every area.
    pub fn prices_by_year(transactions: &[Transaction]) -> BTreeMap<i32, Vec<f64>> {
        let mut groups: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
        for tx in transactions {
            groups.entry(tx.year()).or_default().push(tx.price);
        }
        groups
    }

    /// First postcode seen for each prefix, used as its geocoding sample.
    pub fn sample_postcodes(transactions: &[Transaction]) -> BTreeMap<String, String> {
        let mut samples = BTreeMap::new();
        for tx in transactions {
            if let Some(prefix) = tx.prefix() {
                samples
                    .entry(prefix.to_string())
                    .or_insert_with(|| tx.postcode.clone());
            }
        }
        samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(prices: Vec<Option<f64>>, dates: Vec<&str>, postcodes: Vec<&str>) -> DataFrame {
        let n = prices.len();
        let blank = vec![""; n];
        let ids: Vec<String> = (0..n).map(|i| format!("{{ID-{i}}}")).collect();
        let mut columns = vec![
            Column::new("transaction_id".into(), ids),
            Column::new("price".into(), prices),
            Column::new("date".into(), dates),
            Column::new("postcode".into(), postcodes),
        ];
        for name in &crate::data::PPD_COLUMNS[4..] {
            columns.push(Column::new((*name).into(), blank.clone()));
        }
        DataFrame::new(columns).unwrap()
    }

    fn tx(postcode: &str, price: f64, date: &str) -> Transaction {
        Transaction {
            id: String::new(),
            price,
            date: parse_date(date).unwrap(),
            postcode: postcode.to_string(),
            attributes: PropertyAttributes::default(),
        }
    }

    #[test]
    fn converts_rows_and_drops_unusable_ones() {
        let df = frame(
            vec![Some(100000.0), None, Some(-5.0), Some(250000.0)],
            vec!["2020-01-15 00:00", "2020-02-01 00:00", "2020-03-01 00:00", "garbage"],
            vec!["M1 1AE", "M2 2BB", "M3 3CC", "M4 4DD"],
        );

        let (transactions, dropped) = DataProcessor::to_transactions(&df).unwrap();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].postcode, "M1 1AE");
        assert_eq!(transactions[0].year(), 2020);
        assert_eq!(dropped.bad_price, 2);
        assert_eq!(dropped.bad_date, 1);
    }

    #[test]
    fn groups_by_prefix_and_year() {
        let txs = vec![
            tx("M1 1AE", 100.0, "2020-01-01"),
            tx("M1 2BB", 200.0, "2020-06-01"),
            tx("M1 1AE", 300.0, "2021-01-01"),
            tx("M2 1AA", 400.0, "2021-01-01"),
            tx("", 500.0, "2021-01-01"),
        ];

        let groups = DataProcessor::prices_by_prefix_year(&txs);
        assert_eq!(groups[&("M1".to_string(), 2020)], vec![100.0, 200.0]);
        assert_eq!(groups[&("M1".to_string(), 2021)], vec![300.0]);
        assert_eq!(groups.len(), 3);

        let years: Vec<i32> = DataProcessor::available_years(&txs).into_iter().collect();
        assert_eq!(years, vec![2020, 2021]);

        let by_year = DataProcessor::prices_by_year(&txs);
        assert_eq!(by_year[&2021].len(), 3);
    }

    #[test]
    fn sample_postcode_is_first_seen() {
        let txs = vec![
            tx("M1 9ZZ", 1.0, "2020-01-01"),
            tx("M1 1AE", 1.0, "2020-01-01"),
            tx("M2 1AA", 1.0, "2020-01-01"),
        ];
        let samples = DataProcessor::sample_postcodes(&txs);
        assert_eq!(samples["M1"], "M1 9ZZ");
        assert_eq!(samples["M2"], "M2 1AA");
    }
}
