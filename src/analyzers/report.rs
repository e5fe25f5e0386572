//! Aggregate results of an analyzer run and their console rendering.

use crate::analyzers::chi_square::ChiSquareTest;
use crate::analyzers::regions::{rank_by_density, DescriptorCrosstab, RegionCount, RegionDensity};
use crate::analyzers::spatial::{DensityGrid, DistanceSummary};
use crate::analyzers::temporal::TemporalProfile;
use crate::error::Result;
use crate::processors::format_count;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Completed,
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutcome {
    pub name: &'static str,
    /// Written chart, if any
    pub chart: Option<PathBuf>,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl AnalysisOutcome {
    pub fn is_completed(&self) -> bool {
        self.status == OutcomeStatus::Completed
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapSummary {
    pub bins: usize,
    pub occupied_bins: usize,
    pub max_count: u32,
    pub outside: usize,
}

impl From<&DensityGrid> for HeatmapSummary {
    fn from(grid: &DensityGrid) -> Self {
        Self {
            bins: grid.bins,
            occupied_bins: grid.occupied_bins(),
            max_count: grid.max_count(),
            outside: grid.outside,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisReport {
    pub rows: usize,
    /// Rows dropped on load for missing required fields
    pub dropped_rows: usize,
    pub region_counts: Vec<RegionCount>,
    pub densities: Vec<RegionDensity>,
    pub crosstab: Option<DescriptorCrosstab>,
    pub chi_square: Option<ChiSquareTest>,
    pub heatmap: Option<HeatmapSummary>,
    pub nearest_neighbor: Option<DistanceSummary>,
    pub temporal: Option<TemporalProfile>,
    pub outcomes: Vec<AnalysisOutcome>,
}

impl AnalysisReport {
    pub fn outcome(&self, name: &str) -> Option<&AnalysisOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    pub fn completed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_completed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Failed(_)))
            .count()
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn generate_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Analysis Summary ===\n");
        summary.push_str(&format!("Complaints analyzed: {}\n", format_count(self.rows)));
        if self.dropped_rows > 0 {
            summary.push_str(&format!(
                "Rows dropped on load: {}\n",
                format_count(self.dropped_rows)
            ));
        }

        if let Some(top) = self.region_counts.first() {
            summary.push_str(&format!(
                "Most complaints: {} ({})\n",
                top.region,
                format_count(top.count)
            ));
        }
        if let Some(densest) = rank_by_density(&self.densities).first() {
            if let Some(density) = densest.density {
                summary.push_str(&format!(
                    "Highest density: {} ({:.2} per km²)\n",
                    densest.region, density
                ));
            }
        }
        if let Some(test) = &self.chi_square {
            summary.push_str(&format!(
                "Chi-square: {:.2} vs critical {:.3} → {}\n",
                test.statistic,
                test.critical_value,
                test.decision()
            ));
        }
        if let Some(nn) = &self.nearest_neighbor {
            summary.push_str(&format!(
                "Mean nearest-neighbor distance: {:.6}° over {} points\n",
                nn.mean, nn.sampled_points
            ));
        }
        if let Some(profile) = &self.temporal {
            if let (Some(hour), Some(day)) = (profile.peak_hour(), profile.peak_weekday()) {
                summary.push_str(&format!("Peak hour: {:02}:00, peak day: {}\n", hour, day));
            }
        }

        summary.push('\n');
        summary.push_str(&outcome_table(&self.outcomes));
        summary.push_str(&format!(
            "\n{} of {} analyses completed\n",
            self.completed(),
            self.outcomes.len()
        ));

        summary
    }
}

#[derive(Tabled)]
struct CountRow {
    #[tabled(rename = "Borough")]
    region: String,
    #[tabled(rename = "Complaints")]
    count: String,
}

#[derive(Tabled)]
struct DensityRow {
    #[tabled(rename = "Borough")]
    region: String,
    #[tabled(rename = "Complaints")]
    count: String,
    #[tabled(rename = "Area (km²)")]
    area: String,
    #[tabled(rename = "Per km²")]
    density: String,
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Analysis")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Chart")]
    chart: String,
}

fn na_or(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.*}", decimals, v))
}

pub fn region_count_table(counts: &[RegionCount]) -> String {
    let rows = counts.iter().map(|c| CountRow {
        region: c.region.clone(),
        count: format_count(c.count),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Densest first, boroughs without an area last and shown as n/a
pub fn density_table(densities: &[RegionDensity]) -> String {
    let rows = rank_by_density(densities).into_iter().map(|d| DensityRow {
        region: d.region.clone(),
        count: format_count(d.count),
        area: na_or(d.area_sq_km, 1),
        density: na_or(d.density, 2),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn crosstab_table(crosstab: &DescriptorCrosstab) -> String {
    let mut builder = Builder::default();

    let mut header = vec!["Borough".to_string()];
    header.extend(crosstab.categories.iter().cloned());
    builder.push_record(header);

    for (region, row) in crosstab.regions.iter().zip(&crosstab.counts) {
        let mut record = vec![region.clone()];
        record.extend(row.iter().map(|&c| format_count(c)));
        builder.push_record(record);
    }

    builder.build().with(Style::rounded()).to_string()
}

pub fn chi_square_table(test: &ChiSquareTest) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Borough", "Observed", "Expected"]);
    for ((region, observed), expected) in test.regions.iter().zip(&test.observed).zip(&test.expected) {
        builder.push_record([region.clone(), format_count(*observed), format!("{:.1}", expected)]);
    }
    builder.build().with(Style::rounded()).to_string()
}

pub fn outcome_table(outcomes: &[AnalysisOutcome]) -> String {
    let rows = outcomes.iter().map(|o| OutcomeRow {
        name: o.name.to_string(),
        status: match &o.status {
            OutcomeStatus::Completed => "completed".to_string(),
            OutcomeStatus::Skipped(reason) => format!("skipped: {}", reason),
            OutcomeStatus::Failed(err) => format!("failed: {}", err),
        },
        chart: o
            .chart
            .as_ref()
            .map_or_else(|| "-".to_string(), |p| p.display().to_string()),
    });
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn density(region: &str, count: usize, area: Option<f64>) -> RegionDensity {
        RegionDensity {
            region: region.to_string(),
            count,
            area_sq_km: area,
            density: area.map(|a| count as f64 / a),
        }
    }

    #[test]
    fn test_density_table_flags_missing_area() {
        let table = density_table(&[
            density("Atlantis", 500, None),
            density("Manhattan", 591, Some(59.1)),
        ]);

        assert!(table.contains("n/a"));
        assert!(table.contains("10.00"));
        let manhattan = table.find("Manhattan").unwrap();
        let atlantis = table.find("Atlantis").unwrap();
        assert!(manhattan < atlantis);
    }

    #[test]
    fn test_outcome_serialization() {
        let outcome = AnalysisOutcome {
            name: "temporal",
            chart: None,
            status: OutcomeStatus::Skipped("no timestamps".to_string()),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "no timestamps");
    }

    #[test]
    fn test_summary_lists_every_outcome() {
        let report = AnalysisReport {
            rows: 1200,
            outcomes: vec![
                AnalysisOutcome {
                    name: "region counts",
                    chart: Some(PathBuf::from("out/borough_counts.png")),
                    status: OutcomeStatus::Completed,
                },
                AnalysisOutcome {
                    name: "goodness of fit",
                    chart: None,
                    status: OutcomeStatus::Failed("backend".to_string()),
                },
            ],
            ..AnalysisReport::default()
        };

        let summary = report.generate_summary();
        assert!(summary.contains("1,200"));
        assert!(summary.contains("region counts"));
        assert!(summary.contains("failed: backend"));
        assert!(summary.contains("1 of 2 analyses completed"));
        assert_eq!(report.failed(), 1);
    }

    #[test]
    fn test_crosstab_table_has_header_and_rows() {
        let crosstab = DescriptorCrosstab {
            regions: vec!["Bronx".to_string(), "Queens".to_string()],
            categories: vec!["Loud Music/Party".to_string(), "Other".to_string()],
            counts: vec![vec![3, 1], vec![0, 2]],
        };
        let table = crosstab_table(&crosstab);
        assert!(table.contains("Loud Music/Party"));
        assert!(table.contains("Queens"));
        assert_eq!(table.lines().filter(|l| l.contains("Bronx")).count(), 1);
    }
}
