//! Raw export → validated noise complaint table.
//!
//! Cleaning is a fixed sequence of stages over an owned `Vec<RawComplaint>`.
//! Each stage is a pure function and can only remove rows, so the recorded
//! counts are non-increasing.

use crate::config::CleaningConfig;
use crate::error::Result;
use crate::models::{NoiseComplaint, RawComplaint};
use crate::readers::ComplaintReader;
use crate::utils::progress::ProgressReporter;
use crate::utils::{round_coordinate, title_case};
use crate::writers::CsvWriter;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize)]
pub struct StageCount {
    pub stage: &'static str,
    pub rows: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CleaningReport {
    pub stages: Vec<StageCount>,
}

impl CleaningReport {
    fn record(&mut self, stage: &'static str, rows: usize) {
        info!(stage, rows, "cleaning stage complete");
        self.stages.push(StageCount { stage, rows });
    }

    pub fn raw_rows(&self) -> usize {
        self.stages.first().map_or(0, |s| s.rows)
    }

    pub fn final_rows(&self) -> usize {
        self.stages.last().map_or(0, |s| s.rows)
    }

    pub fn generate_summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Cleaning Report ===\n");
        for stage in &self.stages {
            summary.push_str(&format!("{:<28} {:>12}\n", stage.stage, format_count(stage.rows)));
        }

        let raw = self.raw_rows();
        if raw > 0 {
            summary.push_str(&format!(
                "Retained {:.1}% of raw rows\n",
                100.0 * self.final_rows() as f64 / raw as f64
            ));
        }

        summary
    }
}

/// Thousands-separated row count, e.g. `1,234,567`
pub fn format_count(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub struct Cleaner {
    rules: CleaningConfig,
    reader: ComplaintReader,
}

impl Cleaner {
    pub fn new(rules: CleaningConfig) -> Self {
        Self {
            rules,
            reader: ComplaintReader::new(),
        }
    }

    pub fn with_reader(mut self, reader: ComplaintReader) -> Self {
        self.reader = reader;
        self
    }

    /// Read `input`, clean it and write the result to `output`
    pub fn clean_file(
        &self,
        input: &Path,
        output: &Path,
        progress: Option<&ProgressReporter>,
    ) -> Result<(Vec<NoiseComplaint>, CleaningReport)> {
        if let Some(p) = progress {
            p.set_message("Loading raw dataset...");
        }
        let raw = self.reader.read_raw(input, progress)?;

        if let Some(p) = progress {
            p.set_message("Cleaning records...");
        }
        let (records, report) = self.clean(raw);

        if let Some(p) = progress {
            p.set_message("Writing cleaned table...");
        }
        CsvWriter::new().write_records(&records, output)?;

        Ok((records, report))
    }

    pub fn clean(&self, raw: Vec<RawComplaint>) -> (Vec<NoiseComplaint>, CleaningReport) {
        let mut report = CleaningReport::default();
        report.record("Raw data loaded", raw.len());

        let rows = self.filter_category(raw);
        report.record("Noise complaints", rows.len());

        let rows = self.normalize_regions(rows);
        report.record("Valid borough names", rows.len());

        let rows = self.validate_coordinates(rows);
        report.record("Valid spatial points", rows.len());

        let rows = drop_duplicates(rows);
        report.record("After de-duplication", rows.len());

        let records: Vec<NoiseComplaint> = rows
            .into_iter()
            .filter(RawComplaint::has_required_fields)
            .filter_map(|r| NoiseComplaint::try_from(r).ok())
            .collect();
        report.record("Final cleaned dataset", records.len());

        (records, report)
    }

    /// Keep complaint types containing the keyword, ignoring case
    fn filter_category(&self, rows: Vec<RawComplaint>) -> Vec<RawComplaint> {
        let keyword = self.rules.category_keyword.to_lowercase();
        rows.into_iter()
            .filter(|r| {
                r.complaint_type
                    .as_deref()
                    .is_some_and(|t| t.to_lowercase().contains(&keyword))
            })
            .collect()
    }

    /// Trim and title-case boroughs, dropping sentinel values. A missing
    /// borough survives here and is removed with the other incomplete rows.
    fn normalize_regions(&self, rows: Vec<RawComplaint>) -> Vec<RawComplaint> {
        rows.into_iter()
            .filter_map(|mut r| {
                if let Some(borough) = r.borough.take() {
                    let normalized = title_case(borough.trim());
                    if self.is_invalid_region(&normalized) {
                        return None;
                    }
                    r.borough = Some(normalized);
                }
                Some(r)
            })
            .collect()
    }

    fn is_invalid_region(&self, region: &str) -> bool {
        region.is_empty()
            || self
                .rules
                .invalid_regions
                .iter()
                .any(|s| s.trim().eq_ignore_ascii_case(region))
    }

    /// Drop rows outside the bounds (missing coordinates included), then
    /// round the survivors
    fn validate_coordinates(&self, rows: Vec<RawComplaint>) -> Vec<RawComplaint> {
        let precision = self.rules.coordinate_precision;
        rows.into_iter()
            .filter_map(|mut r| match (r.latitude, r.longitude) {
                (Some(lat), Some(lon)) if self.rules.bounds.contains(lat, lon) => {
                    r.latitude = Some(round_coordinate(lat, precision));
                    r.longitude = Some(round_coordinate(lon, precision));
                    Some(r)
                }
                _ => None,
            })
            .collect()
    }
}

/// Remove exact full-row duplicates, keeping the first occurrence
fn drop_duplicates(rows: Vec<RawComplaint>) -> Vec<RawComplaint> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.into_iter().filter(|r| seen.insert(r.dedup_key())).collect()
}
