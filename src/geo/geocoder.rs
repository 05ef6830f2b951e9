//! Geocoder adapter: one representative coordinate per postcode prefix.

use super::lookup::{Coordinate, PostcodeLookup};
use crate::data::{DataProcessor, Transaction};
use log::{debug, warn};
use std::collections::BTreeMap;

/// Where a prefix ended up on the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Placement {
    Located(Coordinate),
    /// The lookup had no match; the fallback point is used instead.
    Fallback(Coordinate),
}

impl Placement {
    pub fn coordinate(&self) -> Coordinate {
        match self {
            Placement::Located(c) | Placement::Fallback(c) => *c,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Placement::Fallback(_))
    }
}

/// Places prefixes using an external lookup, falling back to a fixed point.
pub struct Geocoder<'a, L: PostcodeLookup + ?Sized> {
    lookup: &'a L,
    fallback: Coordinate,
}

impl<'a, L: PostcodeLookup + ?Sized> Geocoder<'a, L> {
    pub fn new(lookup: &'a L, fallback: Coordinate) -> Self {
        Self { lookup, fallback }
    }

    /// Place each of `prefixes` through the first postcode seen for it.
    /// Every requested prefix gets an entry; one with no sample postcode or
    /// no lookup match is placed at the fallback point.
    pub fn place_prefixes<'p, I>(
        &self,
        transactions: &[Transaction],
        prefixes: I,
    ) -> BTreeMap<String, Placement>
    where
        I: IntoIterator<Item = &'p str>,
    {
        let samples = DataProcessor::sample_postcodes(transactions);
        let placements: BTreeMap<String, Placement> = prefixes
            .into_iter()
            .map(|prefix| {
                let located = samples
                    .get(prefix)
                    .and_then(|postcode| self.lookup.locate(postcode));
                let placement = match located {
                    Some(c) => Placement::Located(c),
                    None => {
                        debug!("no coordinate for {prefix}");
                        Placement::Fallback(self.fallback)
                    }
                };
                (prefix.to_string(), placement)
            })
            .collect();

        let unlocated: Vec<&str> = placements
            .iter()
            .filter(|(_, p)| p.is_fallback())
            .map(|(prefix, _)| prefix.as_str())
            .collect();
        if !unlocated.is_empty() {
            warn!(
                "{} of {} prefixes could not be geocoded and were placed at the fallback point: {}",
                unlocated.len(),
                placements.len(),
                unlocated.join(", ")
            );
        }

        placements
    }

    /// Coordinates of each transaction the lookup can place; misses are dropped.
    pub fn locate_transactions<'t>(
        &self,
        transactions: &'t [Transaction],
    ) -> Vec<(&'t Transaction, Coordinate)> {
        let located: Vec<(&Transaction, Coordinate)> = transactions
            .iter()
            .filter_map(|tx| self.lookup.locate(&tx.postcode).map(|c| (tx, c)))
            .collect();

        let missed = transactions.len() - located.len();
        if missed > 0 {
            warn!("{missed} transactions could not be geocoded and were skipped");
        }
        located
    }
}
