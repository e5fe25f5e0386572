use serde::{Deserialize, Serialize};

/// Inclusive latitude/longitude rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoBounds {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&latitude)
            && (self.min_lon..=self.max_lon).contains(&longitude)
    }

    pub fn is_well_formed(&self) -> bool {
        self.min_lat.is_finite()
            && self.max_lat.is_finite()
            && self.min_lon.is_finite()
            && self.max_lon.is_finite()
            && self.min_lat < self.max_lat
            && self.min_lon < self.max_lon
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lon_span(&self) -> f64 {
        self.max_lon - self.min_lon
    }
}

/// Round a coordinate to a fixed number of decimal places
///
/// # Examples
/// ```
/// use noise_processor::utils::round_coordinate;
///
/// assert_eq!(round_coordinate(40.71277777, 6), 40.712778);
/// ```
pub fn round_coordinate(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Planar distance between two (longitude, latitude) points in degrees
pub fn euclidean_distance(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nyc() -> GeoBounds {
        GeoBounds::new(40.477, 40.917, -74.259, -73.700)
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let bounds = nyc();
        assert!(bounds.contains(40.477, -74.259));
        assert!(bounds.contains(40.917, -73.700));
        assert!(bounds.contains(40.7128, -74.0060)); // City Hall
        assert!(!bounds.contains(40.476, -74.0));
        assert!(!bounds.contains(40.7, -73.699));
    }

    #[test]
    fn test_nan_is_out_of_bounds() {
        assert!(!nyc().contains(f64::NAN, -74.0));
    }

    #[test]
    fn test_well_formed() {
        assert!(nyc().is_well_formed());
        assert!(!GeoBounds::new(41.0, 40.0, -74.0, -73.0).is_well_formed());
    }

    #[test]
    fn test_round_coordinate() {
        assert_eq!(round_coordinate(-73.98571249, 6), -73.985712);
        assert_eq!(round_coordinate(40.5, 6), 40.5);
    }

    #[test]
    fn test_euclidean_distance() {
        assert!((euclidean_distance((0.0, 0.0), (3.0, 4.0)) - 5.0).abs() < 1e-12);
    }
}
