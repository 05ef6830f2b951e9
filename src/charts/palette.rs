//! Colour Palette Module
//! RGB interpolation and the change-to-colour scale used by the price change map.

use crate::stats::ChangeExtremes;
use serde::{Deserialize, Serialize};

/// An 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// `#rrggbb`, lower-case.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// Channel-wise linear blend towards `end`; `ratio` is clamped to [0, 1].
    pub fn lerp(self, end: Rgb, ratio: f64) -> Rgb {
        let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
        let channel = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * ratio) as u8;
        Rgb(
            channel(self.0, end.0),
            channel(self.1, end.1),
            channel(self.2, end.2),
        )
    }
}

pub const INCREASE_START: Rgb = Rgb(144, 238, 144); // Light green
pub const INCREASE_END: Rgb = Rgb(0, 100, 0); // Dark green
pub const DECREASE_START: Rgb = Rgb(255, 204, 204); // Light red
pub const DECREASE_END: Rgb = Rgb(139, 0, 0); // Dark red

/// Named colours for the price bands, cheapest first.
pub const BAND_COLOURS: [&str; 5] = ["blue", "green", "yellow", "orange", "red"];

/// Interpolate between two colours and return the hex string.
pub fn interp_color(start: Rgb, end: Rgb, ratio: f64) -> String {
    start.lerp(end, ratio).to_hex()
}

/// A light-to-dark colour ramp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub start: Rgb,
    pub end: Rgb,
}

impl Palette {
    pub const INCREASE: Palette = Palette {
        start: INCREASE_START,
        end: INCREASE_END,
    };
    pub const DECREASE: Palette = Palette {
        start: DECREASE_START,
        end: DECREASE_END,
    };

    pub fn colour_at(&self, ratio: f64) -> String {
        interp_color(self.start, self.end, ratio)
    }
}

/// Maps percentage changes onto the increase or decrease ramp, scaled so the
/// extreme change in each direction gets the darkest shade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChangeColourScale {
    pub increase: Palette,
    pub decrease: Palette,
    pub extremes: ChangeExtremes,
}

impl ChangeColourScale {
    pub fn new(increase: Palette, decrease: Palette, extremes: ChangeExtremes) -> Self {
        Self {
            increase,
            decrease,
            extremes,
        }
    }

    pub fn colour_for(&self, percent: f64) -> String {
        if percent >= 0.0 {
            let ratio = if self.extremes.max_increase == 0.0 {
                0.0
            } else {
                percent / self.extremes.max_increase
            };
            self.increase.colour_at(ratio)
        } else {
            // Both negative, so the ratio is positive.
            let ratio = if self.extremes.max_decrease == 0.0 {
                0.0
            } else {
                percent / self.extremes.max_decrease
            };
            self.decrease.colour_at(ratio)
        }
    }
}

/// Colour name for a price band index.
pub fn band_colour(band: usize) -> &'static str {
    BAND_COLOURS[band.min(BAND_COLOURS.len() - 1)]
}
