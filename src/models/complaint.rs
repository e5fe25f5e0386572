use crate::config::CleaningConfig;
use crate::error::{ProcessingError, Result};
use crate::utils::constants::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One row of the 311 export as read from disk; every field may be missing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawComplaint {
    pub created_date: Option<String>,
    pub complaint_type: Option<String>,
    pub descriptor: Option<String>,
    pub borough: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl RawComplaint {
    /// Key for exact full-row duplicate detection
    pub fn dedup_key(&self) -> RowKey {
        (
            self.created_date.clone(),
            self.complaint_type.clone(),
            self.descriptor.clone(),
            self.borough.clone(),
            self.latitude.map(f64::to_bits),
            self.longitude.map(f64::to_bits),
        )
    }

    pub fn has_required_fields(&self) -> bool {
        self.borough.is_some()
            && self.latitude.is_some()
            && self.longitude.is_some()
            && self.descriptor.is_some()
    }
}

pub type RowKey = (
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<u64>,
    Option<u64>,
);

/// A validated noise complaint, the row type of the cleaned table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NoiseComplaint {
    #[serde(rename = "Created Date")]
    pub created_date: Option<String>,

    #[serde(rename = "Complaint Type")]
    pub complaint_type: Option<String>,

    #[serde(rename = "Descriptor")]
    #[validate(length(min = 1))]
    pub descriptor: String,

    #[serde(rename = "Borough")]
    #[validate(length(min = 1))]
    pub borough: String,

    #[serde(rename = "Latitude")]
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[serde(rename = "Longitude")]
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl NoiseComplaint {
    pub fn new(
        created_date: Option<String>,
        complaint_type: Option<String>,
        descriptor: String,
        borough: String,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            created_date,
            complaint_type,
            descriptor,
            borough,
            latitude,
            longitude,
        }
    }

    /// (longitude, latitude), the x/y order used by every spatial analysis
    pub fn point(&self) -> (f64, f64) {
        (self.longitude, self.latitude)
    }

    /// Check every cleaned-table invariant against the given cleaning rules
    pub fn satisfies(&self, rules: &CleaningConfig) -> bool {
        let keyword = rules.category_keyword.to_lowercase();
        let is_noise = self
            .complaint_type
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains(&keyword));

        let borough_ok = !self.borough.trim().is_empty()
            && crate::utils::title_case(self.borough.trim()) == self.borough
            && !rules
                .invalid_regions
                .iter()
                .any(|s| s.eq_ignore_ascii_case(&self.borough));

        let precision_ok = |v: f64| {
            crate::utils::round_coordinate(v, rules.coordinate_precision) == v
        };

        is_noise
            && borough_ok
            && !self.descriptor.is_empty()
            && rules.bounds.contains(self.latitude, self.longitude)
            && precision_ok(self.latitude)
            && precision_ok(self.longitude)
            && self.validate().is_ok()
    }
}

impl From<NoiseComplaint> for RawComplaint {
    fn from(c: NoiseComplaint) -> Self {
        Self {
            created_date: c.created_date,
            complaint_type: c.complaint_type,
            descriptor: Some(c.descriptor),
            borough: Some(c.borough),
            latitude: Some(c.latitude),
            longitude: Some(c.longitude),
        }
    }
}

impl TryFrom<RawComplaint> for NoiseComplaint {
    type Error = ProcessingError;

    fn try_from(raw: RawComplaint) -> Result<Self> {
        let missing = |column: &str| {
            ProcessingError::InvalidFormat(format!("row is missing required field '{}'", column))
        };

        Ok(Self {
            descriptor: raw.descriptor.ok_or_else(|| missing(COL_DESCRIPTOR))?,
            borough: raw.borough.ok_or_else(|| missing(COL_BOROUGH))?,
            latitude: raw.latitude.ok_or_else(|| missing(COL_LATITUDE))?,
            longitude: raw.longitude.ok_or_else(|| missing(COL_LONGITUDE))?,
            created_date: raw.created_date,
            complaint_type: raw.complaint_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complaint() -> NoiseComplaint {
        NoiseComplaint::new(
            Some("01/15/2025 11:32:10 PM".to_string()),
            Some("Noise - Residential".to_string()),
            "Loud Music/Party".to_string(),
            "Brooklyn".to_string(),
            40.678,
            -73.944,
        )
    }

    #[test]
    fn test_valid_complaint_satisfies_rules() {
        let rules = CleaningConfig::default();
        assert!(complaint().satisfies(&rules));
        assert!(complaint().validate().is_ok());
    }

    #[test]
    fn test_rule_violations() {
        let rules = CleaningConfig::default();

        let mut c = complaint();
        c.complaint_type = Some("Illegal Parking".to_string());
        assert!(!c.satisfies(&rules));

        let mut c = complaint();
        c.borough = "BROOKLYN".to_string();
        assert!(!c.satisfies(&rules));

        let mut c = complaint();
        c.borough = "Unspecified".to_string();
        assert!(!c.satisfies(&rules));

        let mut c = complaint();
        c.latitude = 41.2;
        assert!(!c.satisfies(&rules));

        let mut c = complaint();
        c.longitude = -73.9441234;
        assert!(!c.satisfies(&rules));
    }

    #[test]
    fn test_try_from_requires_fields() {
        let raw: RawComplaint = complaint().into();
        assert!(NoiseComplaint::try_from(raw.clone()).is_ok());

        let mut missing_descriptor = raw;
        missing_descriptor.descriptor = None;
        assert!(NoiseComplaint::try_from(missing_descriptor).is_err());
    }

    #[test]
    fn test_dedup_key_distinguishes_coordinates() {
        let a: RawComplaint = complaint().into();
        let mut b = a.clone();
        assert_eq!(a.dedup_key(), b.dedup_key());
        b.latitude = Some(40.679);
        assert_ne!(a.dedup_key(), b.dedup_key());
    }
}
