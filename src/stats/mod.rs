//! Stats module - trimmed means, changes and price bands

mod bands;
mod calculator;

pub use bands::{PriceBands, BAND_COUNT};
pub use calculator::{
    ChangeExtremes, ChangeRecord, PriceSummary, StatsCalculator, StatsError, TrimProportion,
    YearlyAggregates, DEFAULT_TRIM,
};
