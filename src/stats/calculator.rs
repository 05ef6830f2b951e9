//! Statistics Calculator Module
//! Trimmed-mean aggregation by postcode prefix and year, and year-over-year change.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Default share of each tail discarded before averaging.
pub const DEFAULT_TRIM: f64 = 0.1;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    #[error("Trim proportion must be within [0, 0.5), got {0}")]
    InvalidTrim(f64),
}

/// Proportion trimmed from each tail. Always within [0, 0.5).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct TrimProportion(f64);

impl TrimProportion {
    pub fn new(value: f64) -> Result<Self, StatsError> {
        if value.is_finite() && (0.0..0.5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(StatsError::InvalidTrim(value))
        }
    }

    pub fn get(self) -> f64 {
        self.0
    }
}

impl Default for TrimProportion {
    fn default() -> Self {
        Self(DEFAULT_TRIM)
    }
}

impl TryFrom<f64> for TrimProportion {
    type Error = StatsError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TrimProportion> for f64 {
    fn from(value: TrimProportion) -> Self {
        value.0
    }
}

impl fmt::Display for TrimProportion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Descriptive statistics for one bucket of prices.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub p05: f64,
    pub p95: f64,
    pub trimmed_mean: Option<f64>,
}

impl Default for PriceSummary {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
            p05: f64::NAN,
            p95: f64::NAN,
            trimmed_mean: None,
        }
    }
}

/// Trimmed-mean price per (prefix, year).
///
/// A `None` entry means the bucket had rows but nothing survived trimming.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct YearlyAggregates {
    by_prefix: BTreeMap<String, BTreeMap<i32, Option<f64>>>,
}

impl YearlyAggregates {
    pub fn get(&self, prefix: &str, year: i32) -> Option<f64> {
        self.by_prefix.get(prefix)?.get(&year).copied().flatten()
    }

    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.by_prefix.keys().map(String::as_str)
    }

    /// Defined aggregates for one prefix, ordered by year.
    pub fn series(&self, prefix: &str) -> Vec<(i32, f64)> {
        self.by_prefix
            .get(prefix)
            .map(|years| {
                years
                    .iter()
                    .filter_map(|(&year, value)| value.map(|v| (year, v)))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_prefix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_prefix.is_empty()
    }
}

/// Year-over-year movement of one prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeRecord {
    pub prefix: String,
    pub from_year: i32,
    pub to_year: i32,
    pub from_price: f64,
    pub to_price: f64,
    pub absolute: f64,
    pub percent: f64,
}

/// Largest increase and largest decrease across a set of changes.
///
/// `max_increase` is 0 when nothing rose; `max_decrease` is 0 when nothing fell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChangeExtremes {
    pub max_increase: f64,
    pub max_decrease: f64,
}

impl ChangeExtremes {
    pub fn from_changes(changes: &[ChangeRecord]) -> Self {
        changes.iter().fold(Self::default(), |acc, change| Self {
            max_increase: acc.max_increase.max(change.percent),
            max_decrease: acc.max_decrease.min(change.percent),
        })
    }
}

/// Handles the statistical calculations.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Calculate percentile using linear interpolation (NumPy compatible).
    fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    fn sorted_finite(values: &[f64]) -> Vec<f64> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
        sorted.sort_by(f64::total_cmp);
        sorted
    }

    /// The `q`-quantile (0..=1) of `values`, ignoring NaN. NaN when empty.
    pub fn quantile(values: &[f64], q: f64) -> f64 {
        Self::percentile(&Self::sorted_finite(values), q * 100.0)
    }

    /// Quantiles at each of `qs` from a single sort.
    pub fn quantiles(values: &[f64], qs: &[f64]) -> Vec<f64> {
        let sorted = Self::sorted_finite(values);
        qs.iter()
            .map(|q| Self::percentile(&sorted, q * 100.0))
            .collect()
    }

    /// Mean of the values lying between the `trim` and `1 - trim` quantiles
    /// (inclusive). `None` for an empty input or an empty retained subset.
    pub fn trimmed_mean(values: &[f64], trim: TrimProportion) -> Option<f64> {
        let sorted = Self::sorted_finite(values);
        if sorted.is_empty() {
            return None;
        }

        let p = trim.get();
        let low = Self::percentile(&sorted, p * 100.0);
        let high = Self::percentile(&sorted, (1.0 - p) * 100.0);

        let retained: Vec<f64> = sorted
            .into_iter()
            .filter(|v| *v >= low && *v <= high)
            .collect();
        if retained.is_empty() {
            return None;
        }
        Some(retained.iter().mean())
    }

    /// Compute descriptive statistics for an array of prices.
    pub fn compute_summary(values: &[f64], trim: TrimProportion) -> PriceSummary {
        let sorted = Self::sorted_finite(values);
        let n = sorted.len();
        if n == 0 {
            return PriceSummary::default();
        }

        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };
        let std = if n > 1 { sorted.iter().std_dev() } else { 0.0 };

        PriceSummary {
            count: n,
            mean: sorted.iter().mean(),
            median,
            std,
            p05: Self::percentile(&sorted, 5.0),
            p95: Self::percentile(&sorted, 95.0),
            trimmed_mean: Self::trimmed_mean(&sorted, trim),
        }
    }

    /// Trimmed mean of every (prefix, year) bucket.
    pub fn yearly_aggregates(
        groups: &BTreeMap<(String, i32), Vec<f64>>,
        trim: TrimProportion,
    ) -> YearlyAggregates {
        let mut by_prefix: BTreeMap<String, BTreeMap<i32, Option<f64>>> = BTreeMap::new();
        for ((prefix, year), prices) in groups {
            by_prefix
                .entry(prefix.clone())
                .or_default()
                .insert(*year, Self::trimmed_mean(prices, trim));
        }
        YearlyAggregates { by_prefix }
    }

    /// Change from `year1` to `year2` for every prefix where both aggregates
    /// exist and the base is non-zero. Sorted by prefix.
    pub fn compute_changes(aggregates: &YearlyAggregates, year1: i32, year2: i32) -> Vec<ChangeRecord> {
        aggregates
            .prefixes()
            .filter_map(|prefix| {
                let from_price = aggregates.get(prefix, year1)?;
                let to_price = aggregates.get(prefix, year2)?;
                if from_price == 0.0 {
                    return None;
                }
                let absolute = to_price - from_price;
                Some(ChangeRecord {
                    prefix: prefix.to_string(),
                    from_year: year1,
                    to_year: year2,
                    from_price,
                    to_price,
                    absolute,
                    percent: absolute / from_price * 100.0,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trim(p: f64) -> TrimProportion {
        TrimProportion::new(p).unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn trimmed_mean_of_empty_is_none() {
        assert_eq!(StatsCalculator::trimmed_mean(&[], trim(0.1)), None);
        assert_eq!(StatsCalculator::trimmed_mean(&[f64::NAN], trim(0.1)), None);
    }

    #[test]
    fn zero_trim_is_plain_mean() {
        let values = [3.0, 9.0, 1.0, 7.0, 100.0];
        let mean = StatsCalculator::trimmed_mean(&values, trim(0.0)).unwrap();
        assert!(approx(mean, 24.0));
    }

    #[test]
    fn trims_outliers_at_interpolated_cuts() {
        // 10th percentile: rank 0.5 -> 1.5; 90th: rank 4.5 -> 5 + 0.5 * 95 = 52.5
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        assert!(approx(StatsCalculator::quantile(&values, 0.1), 1.5));
        assert!(approx(StatsCalculator::quantile(&values, 0.9), 52.5));

        let mean = StatsCalculator::trimmed_mean(&values, trim(0.1)).unwrap();
        assert!(approx(mean, 3.5));
    }

    #[test]
    fn two_values_do_not_survive_trim() {
        // Cuts at 1.1 and 1.9 exclude both ends.
        assert_eq!(StatsCalculator::trimmed_mean(&[1.0, 2.0], trim(0.1)), None);
    }

    #[test]
    fn single_value_survives_trim() {
        let mean = StatsCalculator::trimmed_mean(&[250000.0], trim(0.4)).unwrap();
        assert!(approx(mean, 250000.0));
    }

    #[test]
    fn trim_proportion_is_validated() {
        assert!(TrimProportion::new(0.0).is_ok());
        assert!(TrimProportion::new(0.49).is_ok());
        assert_eq!(TrimProportion::new(0.5), Err(StatsError::InvalidTrim(0.5)));
        assert!(TrimProportion::new(-0.1).is_err());
        assert!(TrimProportion::new(f64::NAN).is_err());
        assert_eq!(TrimProportion::default().get(), DEFAULT_TRIM);

        let parsed: Result<TrimProportion, _> = serde_json::from_str("0.7");
        assert!(parsed.is_err());
    }

    #[test]
    fn summary_matches_manual_values() {
        let summary = StatsCalculator::compute_summary(&[4.0, 1.0, 3.0, 2.0], trim(0.0));
        assert_eq!(summary.count, 4);
        assert!(approx(summary.mean, 2.5));
        assert!(approx(summary.median, 2.5));
        assert!(approx(summary.trimmed_mean.unwrap(), 2.5));
        assert!(approx(summary.p05, 1.15));

        let empty = StatsCalculator::compute_summary(&[], trim(0.1));
        assert_eq!(empty.count, 0);
        assert!(empty.trimmed_mean.is_none());
    }

    fn groups(entries: &[(&str, i32, &[f64])]) -> BTreeMap<(String, i32), Vec<f64>> {
        entries
            .iter()
            .map(|(prefix, year, prices)| ((prefix.to_string(), *year), prices.to_vec()))
            .collect()
    }

    #[test]
    fn change_requires_both_years() {
        let aggregates = StatsCalculator::yearly_aggregates(
            &groups(&[
                ("M1", 2020, &[100000.0]),
                ("M1", 2021, &[150000.0]),
                ("M2", 2020, &[200000.0]),
                ("M3", 2021, &[90000.0]),
            ]),
            trim(0.1),
        );

        let changes = StatsCalculator::compute_changes(&aggregates, 2020, 2021);
        assert_eq!(changes.len(), 1);
        let change = &changes[0];
        assert_eq!(change.prefix, "M1");
        assert!(approx(change.absolute, 50000.0));
        assert!(approx(change.percent, 50.0));

        assert_eq!(aggregates.series("M1"), vec![(2020, 100000.0), (2021, 150000.0)]);
        assert_eq!(aggregates.get("M3", 2020), None);
    }

    #[test]
    fn extremes_default_to_zero() {
        let change = |percent: f64| ChangeRecord {
            prefix: String::new(),
            from_year: 2020,
            to_year: 2021,
            from_price: 1.0,
            to_price: 1.0,
            absolute: 0.0,
            percent,
        };

        let rising = ChangeExtremes::from_changes(&[change(50.0), change(10.0)]);
        assert_eq!(rising.max_increase, 50.0);
        assert_eq!(rising.max_decrease, 0.0);

        let mixed = ChangeExtremes::from_changes(&[change(50.0), change(-30.0), change(-5.0)]);
        assert_eq!(mixed.max_decrease, -30.0);
        assert_eq!(ChangeExtremes::from_changes(&[]), ChangeExtremes::default());
    }
}
