//! Price Band Module
//! Quantile binning of prices into equal-population bands.

use super::calculator::StatsCalculator;

/// Number of price bands used by the band map.
pub const BAND_COUNT: usize = 5;

/// Interior cut points splitting prices into `BAND_COUNT` quantile bands.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBands {
    edges: Vec<f64>,
}

impl PriceBands {
    /// Cut points at the 20/40/60/80% quantiles of `prices`.
    pub fn from_prices(prices: &[f64]) -> Self {
        let qs: Vec<f64> = (1..BAND_COUNT)
            .map(|i| i as f64 / BAND_COUNT as f64)
            .collect();
        Self {
            edges: StatsCalculator::quantiles(prices, &qs),
        }
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Band index in `0..BAND_COUNT`.
    ///
    /// Bands are right-closed: a price equal to a cut point belongs to the
    /// lower band. Repeated cut points simply leave the band between them empty.
    pub fn band_of(&self, price: f64) -> usize {
        self.edges
            .iter()
            .filter(|edge| **edge < price)
            .count()
            .min(BAND_COUNT - 1)
    }
}
