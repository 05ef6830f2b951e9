//! Geo module - postcode lookup and prefix placement

mod geocoder;
mod lookup;

pub use geocoder::{Geocoder, Placement};
pub use lookup::{Coordinate, GeoError, PostcodeLookup, PostcodeTable};
