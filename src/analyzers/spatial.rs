//! Spatial statistics: the 2-D density grid behind the heatmap and the
//! nearest-neighbor distance sample used as a clustering indicator.

use crate::error::{ProcessingError, Result};
use crate::utils::progress::ProgressReporter;
use crate::utils::{euclidean_distance, GeoBounds};
use rayon::prelude::*;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use serde::Serialize;

/// Complaint counts on a regular lon/lat grid
#[derive(Debug, Clone, Serialize)]
pub struct DensityGrid {
    pub bounds: GeoBounds,
    pub bins: usize,
    /// `counts[lon_bin][lat_bin]`
    pub counts: Vec<Vec<u32>>,
    /// Points that fell outside the grid extent
    pub outside: usize,
}

impl DensityGrid {
    /// Bin (longitude, latitude) points. The upper edge belongs to the last
    /// bin; anything beyond the extent is counted in `outside`.
    pub fn from_points<I>(points: I, bounds: GeoBounds, bins: usize) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let bins = bins.max(1);
        let mut counts = vec![vec![0u32; bins]; bins];
        let mut outside = 0;

        for (lon, lat) in points {
            match (
                bin_index(lon, bounds.min_lon, bounds.max_lon, bins),
                bin_index(lat, bounds.min_lat, bounds.max_lat, bins),
            ) {
                (Some(x), Some(y)) => counts[x][y] += 1,
                _ => outside += 1,
            }
        }

        Self {
            bounds,
            bins,
            counts,
            outside,
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().flatten().map(|&c| c as u64).sum()
    }

    pub fn max_count(&self) -> u32 {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }

    pub fn min_positive(&self) -> Option<u32> {
        self.counts.iter().flatten().copied().filter(|&c| c > 0).min()
    }

    pub fn occupied_bins(&self) -> usize {
        self.counts.iter().flatten().filter(|&&c| c > 0).count()
    }

    /// Cell rectangle as ((lon0, lat0), (lon1, lat1))
    pub fn cell(&self, x: usize, y: usize) -> ((f64, f64), (f64, f64)) {
        let w = self.bounds.lon_span() / self.bins as f64;
        let h = self.bounds.lat_span() / self.bins as f64;
        let lon0 = self.bounds.min_lon + x as f64 * w;
        let lat0 = self.bounds.min_lat + y as f64 * h;
        ((lon0, lat0), (lon0 + w, lat0 + h))
    }

    /// Position of `count` on a log scale between the smallest non-zero bin
    /// (0.0) and the largest (1.0). Empty bins are masked and return `None`.
    pub fn log_intensity(&self, count: u32) -> Option<f64> {
        if count == 0 {
            return None;
        }
        let min = self.min_positive()? as f64;
        let max = self.max_count() as f64;
        if max <= min {
            return Some(1.0);
        }
        Some(((count as f64).ln() - min.ln()) / (max.ln() - min.ln()))
    }
}

fn bin_index(value: f64, min: f64, max: f64, bins: usize) -> Option<usize> {
    if !(min..=max).contains(&value) {
        return None;
    }
    let index = ((value - min) / (max - min) * bins as f64) as usize;
    Some(index.min(bins - 1))
}

/// Mean distance from each of the first `sample_cap` points to its
/// `neighbor_count` nearest neighbors among all points.
///
/// The sample is taken in table order. A point is never its own neighbor; a
/// duplicate location elsewhere in the table counts at distance zero. With
/// fewer points than `neighbor_count + 1` the mean covers every other point.
/// Neighbors come from an R-tree bulk-loaded once over the whole table.
pub fn nearest_neighbor_distances(
    points: &[(f64, f64)],
    sample_cap: usize,
    neighbor_count: usize,
    progress: Option<&ProgressReporter>,
) -> Result<Vec<f64>> {
    if points.len() < 2 {
        return Err(ProcessingError::InsufficientData(format!(
            "nearest-neighbor distances need at least two points, found {}",
            points.len()
        )));
    }

    let sample = sample_cap.min(points.len());
    let k = neighbor_count.min(points.len() - 1).max(1);
    let index = point_index(points);

    let distances: Vec<f64> = (0..sample)
        .into_par_iter()
        .map(|i| {
            let mean = mean_nearest_distance(&index, points[i], i, k);
            if let Some(p) = progress {
                p.increment(1);
            }
            mean
        })
        .collect();

    Ok(distances)
}

/// Points tagged with their row position
type PointIndex = RTree<GeomWithData<[f64; 2], usize>>;

fn point_index(points: &[(f64, f64)]) -> PointIndex {
    RTree::bulk_load(
        points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| GeomWithData::new([x, y], i))
            .collect(),
    )
}

fn mean_nearest_distance(index: &PointIndex, origin: (f64, f64), row: usize, k: usize) -> f64 {
    let nearest: Vec<f64> = index
        .nearest_neighbor_iter(&[origin.0, origin.1])
        .filter(|entry| entry.data != row)
        .take(k)
        .map(|entry| {
            let [x, y] = *entry.geom();
            euclidean_distance(origin, (x, y))
        })
        .collect();

    if nearest.is_empty() {
        return 0.0;
    }
    nearest.iter().sum::<f64>() / nearest.len() as f64
}

/// Equal-width histogram
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    /// `counts.len() + 1` edges
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    pub fn new(values: &[f64], bins: usize) -> Self {
        let bins = bins.max(1);
        let (mut lo, mut hi) = min_max(values).unwrap_or((0.0, 1.0));
        if hi <= lo {
            lo -= 0.5;
            hi += 0.5;
        }

        let width = (hi - lo) / bins as f64;
        let edges = (0..=bins).map(|i| lo + i as f64 * width).collect();
        let mut counts = vec![0usize; bins];
        for &v in values {
            if let Some(i) = bin_index(v, lo, hi, bins) {
                counts[i] += 1;
            }
        }

        Self { edges, counts }
    }

    pub fn bin_width(&self) -> f64 {
        match (self.edges.first(), self.edges.last()) {
            (Some(first), Some(last)) if !self.counts.is_empty() => {
                (last - first) / self.counts.len() as f64
            }
            _ => 0.0,
        }
    }
}

/// Gaussian kernel density estimate over the data range with Scott's
/// bandwidth, as `grid_points` (x, density) pairs. Empty when the sample has
/// fewer than two values or no spread.
pub fn gaussian_kde(values: &[f64], grid_points: usize) -> Vec<(f64, f64)> {
    let n = values.len();
    if n < 2 || grid_points < 2 {
        return Vec::new();
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let std = variance.sqrt();
    if std <= 0.0 || !std.is_finite() {
        return Vec::new();
    }

    let bandwidth = std * (n as f64).powf(-0.2);
    let norm = 1.0 / (n as f64 * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    let Some((lo, hi)) = min_max(values) else {
        return Vec::new();
    };
    let step = (hi - lo) / (grid_points - 1) as f64;

    (0..grid_points)
        .map(|i| {
            let x = lo + i as f64 * step;
            let density: f64 = values
                .iter()
                .map(|v| {
                    let u = (x - v) / bandwidth;
                    (-0.5 * u * u).exp()
                })
                .sum();
            (x, density * norm)
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceSummary {
    pub sampled_points: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

impl DistanceSummary {
    pub fn from_distances(distances: &[f64]) -> Option<Self> {
        let (min, max) = min_max(distances)?;
        let mut sorted = distances.to_vec();
        sorted.sort_by(f64::total_cmp);

        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Some(Self {
            sampled_points: distances.len(),
            mean: distances.iter().sum::<f64>() / distances.len() as f64,
            median,
            min,
            max,
        })
    }
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let mut iter = values.iter().copied().filter(|v| v.is_finite());
    let first = iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}
