use crate::analyzers::chi_square::goodness_of_fit;
use crate::analyzers::regions::{descriptor_crosstab, region_counts, region_density};
use crate::analyzers::report::{
    chi_square_table, crosstab_table, density_table, region_count_table, AnalysisOutcome,
    AnalysisReport, HeatmapSummary, OutcomeStatus,
};
use crate::analyzers::spatial::{
    gaussian_kde, nearest_neighbor_distances, DensityGrid, DistanceSummary, Histogram,
};
use crate::analyzers::temporal::{temporal_profile, TemporalProfile};
use crate::charts;
use crate::config::AnalysisConfig;
use crate::error::{ProcessingError, Result};
use crate::models::NoiseComplaint;
use crate::readers::ComplaintReader;
use crate::utils::progress::ProgressReporter;
use crate::utils::{chart_file_path, GeoBounds};
use std::path::Path;
use tracing::{debug, error, info, warn};

pub const REGION_COUNTS: &str = "region counts";
pub const REGION_DENSITY: &str = "region density";
pub const DESCRIPTOR_CROSSTAB: &str = "descriptor cross-tab";
pub const GOODNESS_OF_FIT: &str = "goodness of fit";
pub const SCATTER: &str = "geographic scatter";
pub const HEATMAP: &str = "density heatmap";
pub const NEAREST_NEIGHBOR: &str = "nearest neighbors";
pub const HOURLY_TREND: &str = "hourly trend";
pub const WEEKLY_TREND: &str = "weekly trend";

const KDE_GRID_POINTS: usize = 200;

/// Runs every analysis over a cleaned complaint table. A failing or skipped
/// analysis is recorded in the report and never stops the others.
pub struct ComplaintAnalyzer {
    config: AnalysisConfig,
    render_charts: bool,
    max_workers: usize,
    silent: bool,
    reader: ComplaintReader,
}

impl ComplaintAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            render_charts: true,
            max_workers: num_cpus::get(),
            silent: false,
            reader: ComplaintReader::new(),
        }
    }

    pub fn with_charts(mut self, render_charts: bool) -> Self {
        self.render_charts = render_charts;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn with_reader(mut self, reader: ComplaintReader) -> Self {
        self.reader = reader;
        self
    }

    /// Load a cleaned table and analyze it. Only load errors are returned.
    pub fn analyze_file(&self, input: &Path, output_dir: &Path) -> Result<AnalysisReport> {
        let (records, dropped) = self.reader.read_cleaned(input)?;
        info!(rows = records.len(), dropped, "loaded cleaned table");

        let mut report = self.analyze(&records, output_dir)?;
        report.dropped_rows = dropped;
        Ok(report)
    }

    pub fn analyze(&self, records: &[NoiseComplaint], output_dir: &Path) -> Result<AnalysisReport> {
        if self.render_charts {
            std::fs::create_dir_all(output_dir)?;
        }

        let mut report = AnalysisReport {
            rows: records.len(),
            ..AnalysisReport::default()
        };
        let profile = temporal_profile(records, &self.config.temporal);
        debug!(parsed = profile.parsed, unparsed = profile.unparsed, "binned timestamps");

        let outcome = self.run_step(REGION_COUNTS, charts::BOROUGH_COUNTS, output_dir, |chart| {
            self.region_counts_step(records, &mut report, chart)
        });
        report.outcomes.push(outcome);

        let outcome = self.run_step(REGION_DENSITY, charts::BOROUGH_DENSITY, output_dir, |chart| {
            self.density_step(&mut report, chart)
        });
        report.outcomes.push(outcome);

        let outcome = self.run_step(
            DESCRIPTOR_CROSSTAB,
            charts::BOROUGH_DESCRIPTOR,
            output_dir,
            |chart| self.crosstab_step(records, &mut report, chart),
        );
        report.outcomes.push(outcome);

        let outcome = self.run_step(
            GOODNESS_OF_FIT,
            charts::CHI_SQUARE_OBSERVED,
            output_dir,
            |chart| self.chi_square_step(&mut report, chart),
        );
        report.outcomes.push(outcome);

        let outcome = self.run_step(SCATTER, charts::SCATTER_MAP, output_dir, |chart| {
            self.scatter_step(records, &report, chart)
        });
        report.outcomes.push(outcome);

        let outcome = self.run_step(HEATMAP, charts::HEATMAP_DENSITY, output_dir, |chart| {
            self.heatmap_step(records, &mut report, chart)
        });
        report.outcomes.push(outcome);

        let outcome = self.run_step(
            NEAREST_NEIGHBOR,
            charts::NND_DISTRIBUTION,
            output_dir,
            |chart| self.nearest_neighbor_step(records, &mut report, chart),
        );
        report.outcomes.push(outcome);

        let outcome = self.run_step(HOURLY_TREND, charts::HOURLY_TREND, output_dir, |chart| {
            hourly_step(&profile, chart)
        });
        report.outcomes.push(outcome);

        let outcome = self.run_step(WEEKLY_TREND, charts::WEEKLY_TREND, output_dir, |chart| {
            weekly_step(&profile, chart)
        });
        report.outcomes.push(outcome);

        if profile.parsed > 0 {
            report.temporal = Some(profile);
        }

        Ok(report)
    }

    /// Run one analysis, turning its error into a skipped or failed outcome
    fn run_step<F>(
        &self,
        name: &'static str,
        stem: &str,
        output_dir: &Path,
        step: F,
    ) -> AnalysisOutcome
    where
        F: FnOnce(Option<&Path>) -> Result<()>,
    {
        let chart = self
            .render_charts
            .then(|| chart_file_path(output_dir, stem));

        match step(chart.as_deref()) {
            Ok(()) => {
                info!(analysis = name, chart = ?chart, "analysis complete");
                AnalysisOutcome {
                    name,
                    chart,
                    status: OutcomeStatus::Completed,
                }
            }
            Err(ProcessingError::InsufficientData(reason)) => {
                warn!(analysis = name, %reason, "analysis skipped");
                println!("Skipping {}: {}", name, reason);
                AnalysisOutcome {
                    name,
                    chart: None,
                    status: OutcomeStatus::Skipped(reason),
                }
            }
            Err(e) => {
                error!(analysis = name, error = %e, "analysis failed");
                println!("{} failed: {}", name, e);
                AnalysisOutcome {
                    name,
                    chart: None,
                    status: OutcomeStatus::Failed(e.to_string()),
                }
            }
        }
    }

    fn region_counts_step(
        &self,
        records: &[NoiseComplaint],
        report: &mut AnalysisReport,
        chart: Option<&Path>,
    ) -> Result<()> {
        report.region_counts = region_counts(records);
        if report.region_counts.is_empty() {
            return Err(ProcessingError::InsufficientData(
                "no complaints to count".to_string(),
            ));
        }

        println!("\nComplaints by borough:");
        println!("{}", region_count_table(&report.region_counts));

        if let Some(path) = chart {
            let labels: Vec<String> = report.region_counts.iter().map(|c| c.region.clone()).collect();
            let values: Vec<f64> = report.region_counts.iter().map(|c| c.count as f64).collect();
            charts::bar_chart(
                path,
                "Noise Complaints by Borough",
                "Borough",
                "Complaints",
                &labels,
                &values,
            )?;
        }
        Ok(())
    }

    fn density_step(&self, report: &mut AnalysisReport, chart: Option<&Path>) -> Result<()> {
        report.densities = region_density(&report.region_counts, &self.config.region_areas);

        let missing: Vec<&str> = report
            .densities
            .iter()
            .filter(|d| d.density.is_none())
            .map(|d| d.region.as_str())
            .collect();
        if !missing.is_empty() {
            warn!(regions = ?missing, "no area known, density undefined");
        }

        let known: Vec<(String, f64)> = report
            .densities
            .iter()
            .filter_map(|d| d.density.map(|v| (d.region.clone(), v)))
            .collect();
        if known.is_empty() {
            return Err(ProcessingError::InsufficientData(
                "no borough has a known area".to_string(),
            ));
        }

        println!("\nComplaint density (per km²):");
        println!("{}", density_table(&report.densities));

        if let Some(path) = chart {
            let (labels, values): (Vec<String>, Vec<f64>) = known.into_iter().unzip();
            charts::bar_chart(
                path,
                "Noise Complaint Density by Borough",
                "Borough",
                "Complaints per km²",
                &labels,
                &values,
            )?;
        }
        Ok(())
    }

    fn crosstab_step(
        &self,
        records: &[NoiseComplaint],
        report: &mut AnalysisReport,
        chart: Option<&Path>,
    ) -> Result<()> {
        if records.is_empty() {
            return Err(ProcessingError::InsufficientData(
                "no complaints to cross-tabulate".to_string(),
            ));
        }

        let crosstab = descriptor_crosstab(
            records,
            self.config.top_descriptors,
            &self.config.other_label,
        );

        println!("\nTop descriptors by borough:");
        println!("{}", crosstab_table(&crosstab));

        if let Some(path) = chart {
            charts::stacked_bar_chart(
                path,
                "Top Noise Descriptors by Borough",
                "Borough",
                "Complaints",
                &crosstab.regions,
                &crosstab.categories,
                &crosstab.counts,
            )?;
        }

        report.crosstab = Some(crosstab);
        Ok(())
    }

    fn chi_square_step(&self, report: &mut AnalysisReport, chart: Option<&Path>) -> Result<()> {
        let test = goodness_of_fit(&report.region_counts, &self.config.chi_square)?;

        println!("\nChi-square goodness of fit (uniform across boroughs):");
        println!("{}", chi_square_table(&test));
        println!(
            "χ² = {:.2}, df = {}, critical value = {:.3} (α = {})",
            test.statistic, test.degrees_of_freedom, test.critical_value, test.significance_level
        );
        println!("{}", test.decision());

        if let Some(path) = chart {
            let observed: Vec<f64> = test.observed.iter().map(|&o| o as f64).collect();
            charts::grouped_bar_chart(
                path,
                "Observed vs Expected Complaints",
                "Borough",
                "Complaints",
                &test.regions,
                &[
                    ("Observed", observed.as_slice()),
                    ("Expected", test.expected.as_slice()),
                ],
            )?;
        }

        report.chi_square = Some(test);
        Ok(())
    }

    fn scatter_step(
        &self,
        records: &[NoiseComplaint],
        report: &AnalysisReport,
        chart: Option<&Path>,
    ) -> Result<()> {
        let Some(bounds) = data_extent(records) else {
            return Err(ProcessingError::InsufficientData(
                "no coordinates to plot".to_string(),
            ));
        };

        let Some(path) = chart else {
            return Ok(());
        };

        let groups: Vec<(String, Vec<(f64, f64)>)> = report
            .region_counts
            .iter()
            .map(|c| {
                let points = records
                    .iter()
                    .filter(|r| r.borough == c.region)
                    .map(NoiseComplaint::point)
                    .collect();
                (c.region.clone(), points)
            })
            .collect();

        charts::scatter_map(path, "Noise Complaint Locations", &groups, bounds)
    }

    fn heatmap_step(
        &self,
        records: &[NoiseComplaint],
        report: &mut AnalysisReport,
        chart: Option<&Path>,
    ) -> Result<()> {
        let settings = &self.config.heatmap;
        let grid = DensityGrid::from_points(
            records.iter().map(NoiseComplaint::point),
            settings.bounds,
            settings.bins,
        );
        debug!(outside = grid.outside, "points outside heatmap extent");

        if grid.total() == 0 {
            return Err(ProcessingError::InsufficientData(
                "no complaints inside the heatmap extent".to_string(),
            ));
        }

        let summary = HeatmapSummary::from(&grid);
        println!(
            "\nHeatmap: {} of {} bins occupied, busiest bin {} complaints",
            summary.occupied_bins,
            summary.bins * summary.bins,
            summary.max_count
        );
        report.heatmap = Some(summary);

        if let Some(path) = chart {
            charts::density_heatmap(path, "Noise Complaint Density (log scale)", &grid)?;
        }
        Ok(())
    }

    fn nearest_neighbor_step(
        &self,
        records: &[NoiseComplaint],
        report: &mut AnalysisReport,
        chart: Option<&Path>,
    ) -> Result<()> {
        let settings = &self.config.nearest_neighbor;
        let points: Vec<(f64, f64)> = records.iter().map(NoiseComplaint::point).collect();
        let sample = settings.sample_cap.min(points.len());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        let progress = ProgressReporter::new(
            sample as u64,
            "Sampling nearest-neighbor distances...",
            self.silent,
        );
        let distances = pool.install(|| {
            nearest_neighbor_distances(
                &points,
                settings.sample_cap,
                settings.neighbor_count,
                Some(&progress),
            )
        })?;
        progress.finish_and_clear();

        let summary = DistanceSummary::from_distances(&distances).ok_or_else(|| {
            ProcessingError::InsufficientData("no nearest-neighbor distances".to_string())
        })?;
        println!(
            "\nNearest-neighbor distance over {} points: mean {:.6}°, median {:.6}°",
            summary.sampled_points, summary.mean, summary.median
        );
        report.nearest_neighbor = Some(summary);

        if let Some(path) = chart {
            let histogram = Histogram::new(&distances, settings.histogram_bins);
            let density = gaussian_kde(&distances, KDE_GRID_POINTS);
            charts::histogram_with_density(
                path,
                "Nearest-Neighbor Distance Distribution",
                "Mean distance to nearest neighbors (degrees)",
                &histogram,
                &density,
            )?;
        }
        Ok(())
    }
}

fn require_timestamps(profile: &TemporalProfile) -> Result<()> {
    if profile.parsed == 0 {
        return Err(ProcessingError::InsufficientData(format!(
            "none of {} timestamps could be parsed",
            profile.unparsed
        )));
    }
    Ok(())
}

fn hourly_step(profile: &TemporalProfile, chart: Option<&Path>) -> Result<()> {
    require_timestamps(profile)?;

    if let Some(hour) = profile.peak_hour() {
        println!(
            "\nPeak hour: {:02}:00 ({} complaints)",
            hour, profile.hourly[hour]
        );
    }

    if let Some(path) = chart {
        let values: Vec<f64> = profile.hourly.iter().map(|&c| c as f64).collect();
        charts::line_chart(
            path,
            "Noise Complaints by Hour of Day",
            "Hour",
            "Complaints",
            &values,
        )?;
    }
    Ok(())
}

fn weekly_step(profile: &TemporalProfile, chart: Option<&Path>) -> Result<()> {
    require_timestamps(profile)?;

    if let Some(day) = profile.peak_weekday() {
        println!("Peak day: {}", day);
    }

    if let Some(path) = chart {
        let labels: Vec<String> = profile.weekly.iter().map(|w| w.weekday.to_string()).collect();
        let values: Vec<f64> = profile.weekly.iter().map(|w| w.count as f64).collect();
        charts::bar_chart(
            path,
            "Noise Complaints by Day of Week",
            "Day",
            "Complaints",
            &labels,
            &values,
        )?;
    }
    Ok(())
}

/// Bounding box of all points with a small margin
fn data_extent(records: &[NoiseComplaint]) -> Option<GeoBounds> {
    let first = records.first()?;
    let mut bounds = GeoBounds::new(
        first.latitude,
        first.latitude,
        first.longitude,
        first.longitude,
    );
    for r in records {
        bounds.min_lat = bounds.min_lat.min(r.latitude);
        bounds.max_lat = bounds.max_lat.max(r.latitude);
        bounds.min_lon = bounds.min_lon.min(r.longitude);
        bounds.max_lon = bounds.max_lon.max(r.longitude);
    }

    let pad_lat = (bounds.lat_span() * 0.02).max(0.001);
    let pad_lon = (bounds.lon_span() * 0.02).max(0.001);
    Some(GeoBounds::new(
        bounds.min_lat - pad_lat,
        bounds.max_lat + pad_lat,
        bounds.min_lon - pad_lon,
        bounds.max_lon + pad_lon,
    ))
}
