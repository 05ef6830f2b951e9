//! Transaction Record Module
//! Typed view of one Land Registry price paid row.

use chrono::{Datelike, NaiveDate};

/// Column names of the price paid CSV, in file order.
pub const PPD_COLUMNS: [&str; 16] = [
    "transaction_id",
    "price",
    "date",
    "postcode",
    "property_type",
    "old_new",
    "duration",
    "paon",
    "saon",
    "street",
    "locality",
    "town",
    "district",
    "county",
    "ppd_category",
    "record_status",
];

/// Descriptive attributes carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyAttributes {
    pub property_type: String,
    pub old_new: String,
    pub duration: String,
    pub paon: String,
    pub saon: String,
    pub street: String,
    pub locality: String,
    pub town: String,
    pub district: String,
    pub county: String,
    pub ppd_category: String,
    pub record_status: String,
}

/// A single sale. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: String,
    pub price: f64,
    pub date: NaiveDate,
    pub postcode: String,
    pub attributes: PropertyAttributes,
}

impl Transaction {
    /// Calendar year of the sale.
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Outward part of the postcode, e.g. `M1` for `M1 1AE`.
    pub fn prefix(&self) -> Option<&str> {
        postcode_prefix(&self.postcode)
    }
}

/// First whitespace-delimited token of a postcode.
pub fn postcode_prefix(postcode: &str) -> Option<&str> {
    postcode.split_whitespace().next()
}

/// Parse the date column. Land Registry exports use `YYYY-MM-DD HH:MM`.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.split_whitespace().next()?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(day, "%d/%m/%Y"))
        .ok()
}
