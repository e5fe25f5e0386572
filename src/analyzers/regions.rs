use crate::models::NoiseComplaint;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionCount {
    pub region: String,
    pub count: usize,
}

/// Complaints per borough, most complaints first (ties alphabetical)
pub fn region_counts(records: &[NoiseComplaint]) -> Vec<RegionCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.borough.as_str()).or_default() += 1;
    }

    let mut counts: Vec<RegionCount> = counts
        .into_iter()
        .map(|(region, count)| RegionCount {
            region: region.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.region.cmp(&b.region)));
    counts
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionDensity {
    pub region: String,
    pub count: usize,
    pub area_sq_km: Option<f64>,
    /// Complaints per km²; `None` when the borough has no known area
    pub density: Option<f64>,
}

/// Density for each borough, in the order of `counts`
pub fn region_density(counts: &[RegionCount], areas: &BTreeMap<String, f64>) -> Vec<RegionDensity> {
    counts
        .iter()
        .map(|c| {
            let area = areas.get(&c.region).copied();
            RegionDensity {
                region: c.region.clone(),
                count: c.count,
                area_sq_km: area,
                density: area.map(|a| c.count as f64 / a),
            }
        })
        .collect()
}

/// Densities sorted highest first; boroughs without an area go last
pub fn rank_by_density(densities: &[RegionDensity]) -> Vec<&RegionDensity> {
    let mut ranked: Vec<&RegionDensity> = densities.iter().collect();
    ranked.sort_by(|a, b| match (a.density, b.density) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.region.cmp(&b.region),
    });
    ranked
}

/// The `n` most frequent descriptors with their counts (ties alphabetical)
pub fn top_descriptors(records: &[NoiseComplaint], n: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.descriptor.as_str()).or_default() += 1;
    }

    let mut counts: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(d, c)| (d.to_string(), c))
        .collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts.truncate(n);
    counts
}

/// Borough × descriptor contingency table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptorCrosstab {
    /// Alphabetical
    pub regions: Vec<String>,
    /// Top descriptors by frequency, then the catch-all label
    pub categories: Vec<String>,
    /// `counts[region][category]`
    pub counts: Vec<Vec<usize>>,
}

impl DescriptorCrosstab {
    pub fn region_total(&self, region_index: usize) -> usize {
        self.counts.get(region_index).map_or(0, |row| row.iter().sum())
    }

    pub fn category_total(&self, category_index: usize) -> usize {
        self.counts
            .iter()
            .filter_map(|row| row.get(category_index))
            .sum()
    }

    pub fn get(&self, region: &str, category: &str) -> Option<usize> {
        let r = self.regions.iter().position(|x| x == region)?;
        let c = self.categories.iter().position(|x| x == category)?;
        Some(self.counts[r][c])
    }
}

/// Relabel every descriptor outside the top `top_n` as `other_label` and
/// count complaints per borough and descriptor. Missing combinations are 0.
pub fn descriptor_crosstab(
    records: &[NoiseComplaint],
    top_n: usize,
    other_label: &str,
) -> DescriptorCrosstab {
    let mut categories: Vec<String> = top_descriptors(records, top_n)
        .into_iter()
        .map(|(d, _)| d)
        .collect();
    let top: HashSet<String> = categories.iter().cloned().collect();

    let relabel = |descriptor: &str| -> String {
        if top.contains(descriptor) {
            descriptor.to_string()
        } else {
            other_label.to_string()
        }
    };

    if records.iter().any(|r| !top.contains(&r.descriptor)) && !top.contains(other_label) {
        categories.push(other_label.to_string());
    }

    let mut regions: Vec<String> = records
        .iter()
        .map(|r| r.borough.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    regions.sort();

    let region_index: HashMap<&str, usize> = regions
        .iter()
        .enumerate()
        .map(|(i, r)| (r.as_str(), i))
        .collect();
    let category_index: HashMap<&str, usize> = categories
        .iter()
        .enumerate()
        .map(|(i, c)| (c.as_str(), i))
        .collect();

    let mut counts = vec![vec![0usize; categories.len()]; regions.len()];
    for record in records {
        let label = relabel(&record.descriptor);
        if let (Some(&r), Some(&c)) = (
            region_index.get(record.borough.as_str()),
            category_index.get(label.as_str()),
        ) {
            counts[r][c] += 1;
        }
    }

    DescriptorCrosstab {
        regions,
        categories,
        counts,
    }
}
