//! PNG chart rendering with [`plotters`].
//!
//! Every function opens its own bitmap backend, draws, calls `present()` and
//! drops the backend before returning, so no drawing state outlives a chart.
//! The functions only take already-computed statistics.

pub mod bars;
pub mod distribution;
pub mod maps;

pub use bars::{bar_chart, grouped_bar_chart, stacked_bar_chart};
pub use distribution::{histogram_with_density, line_chart};
pub use maps::{density_heatmap, scatter_map};

use crate::error::ProcessingError;
use plotters::style::RGBColor;

/// Output file stems, one per analysis
pub const BOROUGH_COUNTS: &str = "borough_counts";
pub const BOROUGH_DENSITY: &str = "borough_density";
pub const BOROUGH_DESCRIPTOR: &str = "borough_descriptor";
pub const CHI_SQUARE_OBSERVED: &str = "chi_square_observed";
pub const SCATTER_MAP: &str = "scatter_map";
pub const HEATMAP_DENSITY: &str = "heatmap_density";
pub const NND_DISTRIBUTION: &str = "nnd_distribution";
pub const HOURLY_TREND: &str = "hourly_trend";
pub const WEEKLY_TREND: &str = "weekly_trend";

const CATEGORY_COLORS: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// Yellow → orange → red ramp for the heatmap
const HEAT_RAMP: [RGBColor; 9] = [
    RGBColor(255, 255, 204),
    RGBColor(255, 237, 160),
    RGBColor(254, 217, 118),
    RGBColor(254, 178, 76),
    RGBColor(253, 141, 60),
    RGBColor(252, 78, 42),
    RGBColor(227, 26, 28),
    RGBColor(189, 0, 38),
    RGBColor(128, 0, 38),
];

pub(crate) const TEAL: RGBColor = RGBColor(0, 128, 128);
pub(crate) const PURPLE: RGBColor = RGBColor(128, 0, 128);
pub(crate) const TITLE_FONT: (&str, u32) = ("sans-serif", 36);
pub(crate) const LABEL_FONT: (&str, u32) = ("sans-serif", 22);

pub(crate) fn category_color(index: usize) -> RGBColor {
    CATEGORY_COLORS[index % CATEGORY_COLORS.len()]
}

/// Colour at `t` ∈ [0, 1] along the heat ramp
pub(crate) fn heat_color(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0) * (HEAT_RAMP.len() - 1) as f64;
    let i = (t.floor() as usize).min(HEAT_RAMP.len() - 2);
    let f = t - i as f64;
    let (a, b) = (HEAT_RAMP[i], HEAT_RAMP[i + 1]);
    let lerp = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * f).round() as u8;
    RGBColor(lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

/// Headroom above the tallest bar; never an empty range
pub(crate) fn y_upper(max: f64) -> f64 {
    if max.is_finite() && max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

pub(crate) fn plot_err<E: std::fmt::Display>(err: E) -> ProcessingError {
    ProcessingError::Plot(err.to_string())
}
