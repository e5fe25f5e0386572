//! Run configuration.
//!
//! Every constant the pipeline depends on lives in [`PipelineConfig`] and is
//! passed explicitly into the cleaner and the analyzer. Values are layered as
//! built-in defaults, then an optional config file, then `NOISE__*`
//! environment variables (e.g. `NOISE__ANALYSIS__HEATMAP__BINS=80`).

use crate::error::{ProcessingError, Result};
use crate::utils::constants::*;
use crate::utils::{title_case, GeoBounds};
use chrono::Weekday;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use validator::Validate;

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PipelineConfig {
    #[validate(nested)]
    pub cleaning: CleaningConfig,

    #[validate(nested)]
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CleaningConfig {
    /// Case-insensitive substring a complaint type must contain
    #[validate(length(min = 1))]
    pub category_keyword: String,

    /// Borough values treated as unknown after title-casing
    pub invalid_regions: Vec<String>,

    pub bounds: GeoBounds,

    #[validate(range(max = 12))]
    pub coordinate_precision: u32,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            category_keyword: NOISE_KEYWORD.to_string(),
            invalid_regions: INVALID_BOROUGHS.iter().map(|s| s.to_string()).collect(),
            bounds: GeoBounds::new(NYC_MIN_LAT, NYC_MAX_LAT, NYC_MIN_LON, NYC_MAX_LON),
            coordinate_precision: COORDINATE_PRECISION,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Borough → land area in km²
    pub region_areas: BTreeMap<String, f64>,

    #[validate(range(min = 1))]
    pub top_descriptors: usize,

    #[validate(length(min = 1))]
    pub other_label: String,

    #[validate(nested)]
    pub chi_square: ChiSquareConfig,

    #[validate(nested)]
    pub heatmap: HeatmapConfig,

    #[validate(nested)]
    pub nearest_neighbor: NeighborConfig,

    pub temporal: TemporalConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            region_areas: BOROUGH_AREAS_SQ_KM
                .iter()
                .map(|(name, area)| (name.to_string(), *area))
                .collect(),
            top_descriptors: TOP_DESCRIPTORS,
            other_label: OTHER_DESCRIPTOR.to_string(),
            chi_square: ChiSquareConfig::default(),
            heatmap: HeatmapConfig::default(),
            nearest_neighbor: NeighborConfig::default(),
            temporal: TemporalConfig::default(),
        }
    }
}

/// Goodness-of-fit parameters.
///
/// The critical value is looked up from `significance_level` and
/// `degrees_of_freedom` (number of boroughs minus one when unset) unless
/// `critical_value` pins it explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ChiSquareConfig {
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub significance_level: f64,

    #[validate(range(min = 1))]
    pub degrees_of_freedom: Option<usize>,

    #[validate(range(exclusive_min = 0.0))]
    pub critical_value: Option<f64>,
}

impl Default for ChiSquareConfig {
    fn default() -> Self {
        Self {
            significance_level: SIGNIFICANCE_LEVEL,
            degrees_of_freedom: None,
            critical_value: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct HeatmapConfig {
    pub bounds: GeoBounds,

    #[validate(range(min = 1, max = 1000))]
    pub bins: usize,
}

impl Default for HeatmapConfig {
    fn default() -> Self {
        Self {
            bounds: GeoBounds::new(
                HEATMAP_MIN_LAT,
                HEATMAP_MAX_LAT,
                HEATMAP_MIN_LON,
                HEATMAP_MAX_LON,
            ),
            bins: HEATMAP_BINS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NeighborConfig {
    #[validate(range(min = 1))]
    pub sample_cap: usize,

    #[validate(range(min = 1))]
    pub neighbor_count: usize,

    #[validate(range(min = 1))]
    pub histogram_bins: usize,
}

impl Default for NeighborConfig {
    fn default() -> Self {
        Self {
            sample_cap: NEIGHBOR_SAMPLE_CAP,
            neighbor_count: NEIGHBOR_COUNT,
            histogram_bins: NEIGHBOR_HISTOGRAM_BINS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalConfig {
    /// chrono format strings, tried in order
    pub timestamp_formats: Vec<String>,

    /// Fallback formats without a time of day
    pub date_formats: Vec<String>,

    pub weekday_order: Vec<Weekday>,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            timestamp_formats: TIMESTAMP_FORMATS.iter().map(|s| s.to_string()).collect(),
            date_formats: DATE_FORMATS.iter().map(|s| s.to_string()).collect(),
            weekday_order: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
                Weekday::Sat,
                Weekday::Sun,
            ],
        }
    }
}

impl PipelineConfig {
    /// Load defaults, overlay the optional file and `NOISE__` environment, then check
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                return Err(ProcessingError::Config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("NOISE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: PipelineConfig = builder.build()?.try_deserialize()?;
        config.checked()
    }

    /// Validate field ranges and cross-field rules, normalizing area keys to
    /// the title-cased form the cleaner produces
    pub fn checked(mut self) -> Result<Self> {
        self.validate()?;

        if !self.cleaning.bounds.is_well_formed() {
            return Err(ProcessingError::Config(format!(
                "cleaning bounds are not a valid rectangle: {:?}",
                self.cleaning.bounds
            )));
        }

        if !self.analysis.heatmap.bounds.is_well_formed() {
            return Err(ProcessingError::Config(format!(
                "heatmap bounds are not a valid rectangle: {:?}",
                self.analysis.heatmap.bounds
            )));
        }

        let weekdays: HashSet<Weekday> = self.analysis.temporal.weekday_order.iter().copied().collect();
        if self.analysis.temporal.weekday_order.len() != 7 || weekdays.len() != 7 {
            return Err(ProcessingError::Config(
                "weekday_order must list each of the seven weekdays exactly once".to_string(),
            ));
        }

        if self.analysis.temporal.timestamp_formats.is_empty() {
            return Err(ProcessingError::Config(
                "at least one timestamp format is required".to_string(),
            ));
        }

        let mut areas = BTreeMap::new();
        for (region, area) in std::mem::take(&mut self.analysis.region_areas) {
            if !area.is_finite() || area <= 0.0 {
                return Err(ProcessingError::Config(format!(
                    "area for region '{}' must be a positive number, got {}",
                    region, area
                )));
            }
            areas.insert(title_case(region.trim()), area);
        }
        self.analysis.region_areas = areas;

        Ok(self)
    }
}
