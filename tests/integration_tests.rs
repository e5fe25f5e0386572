use clap::Parser;
use noise_processor::analyzers::complaint_analyzer::{GOODNESS_OF_FIT, HOURLY_TREND, WEEKLY_TREND};
use noise_processor::analyzers::{ComplaintAnalyzer, OutcomeStatus};
use noise_processor::cli::{run, Cli};
use noise_processor::config::{AnalysisConfig, CleaningConfig, PipelineConfig};
use noise_processor::models::NoiseComplaint;
use noise_processor::processors::Cleaner;
use noise_processor::readers::ComplaintReader;
use noise_processor::writers::CsvWriter;
use noise_processor::ProcessingError;
use pretty_assertions::assert_eq;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const RAW_EXPORT: &str = "\
Unique Key,Created Date,Agency,Complaint Type,Descriptor,Incident Zip,Borough,Latitude,Longitude
1,01/03/2025 11:42:10 PM,NYPD,Noise - Residential,Loud Music/Party,11211,BROOKLYN,40.7145021,-73.9612347
2,01/03/2025 11:42:10 PM,NYPD,Noise - Residential,Loud Music/Party,11211,BROOKLYN,40.7145021,-73.9612347
3,01/04/2025 01:05:00 AM,NYPD,Noise - Street/Sidewalk,Loud Talking,10027,MANHATTAN,40.8105,-73.9520
4,01/04/2025 02:10:00 AM,NYPD,Noise - Vehicle,Car/Truck Horn,11368,queens,40.7498,-73.8624
5,01/05/2025 10:00:00 PM,NYPD,Noise - Residential,Banging/Pounding,10456,BRONX,40.8302,-73.9120
6,01/05/2025 10:30:00 PM,DEP,Noise,Noise: Construction Before/After Hours (NM1),10301,STATEN ISLAND,40.6357,-74.0920
7,01/06/2025 09:00:00 AM,HPD,HEAT/HOT WATER,ENTIRE BUILDING,10453,BRONX,40.8530,-73.9120
8,01/06/2025 09:30:00 AM,NYPD,Noise - Residential,Loud Music/Party,,Unspecified,40.7000,-73.9000
9,01/06/2025 10:00:00 AM,NYPD,Noise - Residential,Loud Music/Party,11101,QUEENS,,
10,01/06/2025 11:00:00 AM,NYPD,Noise - Park,Loud Music/Party,10001,MANHATTAN,41.5000,-73.9500
11,01/07/2025 11:15:00 PM,NYPD,Noise - Residential,,11211,BROOKLYN,40.7100,-73.9600
12,not recorded,NYPD,Noise - Commercial,Loud Music/Party,11206,BROOKLYN,40.7020,-73.9420
";

fn write_raw(dir: &Path) -> PathBuf {
    let path = dir.join("raw.csv");
    fs::write(&path, RAW_EXPORT).unwrap();
    path
}

fn cleaner() -> Cleaner {
    Cleaner::new(CleaningConfig::default())
}

#[test]
fn test_clean_stage_counts() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let raw = write_raw(temp_dir.path());
    let output = temp_dir.path().join("clean").join("noise.csv");

    let (records, report) = cleaner().clean_file(&raw, &output, None).unwrap();

    let counts: Vec<usize> = report.stages.iter().map(|s| s.rows).collect();
    // 12 raw, 11 noise, 10 valid borough, 8 in bounds, 7 unique, 6 complete
    assert_eq!(counts, vec![12, 11, 10, 8, 7, 6]);
    assert_eq!(records.len(), 6);
    assert!(output.exists());

    let rules = CleaningConfig::default();
    assert!(records.iter().all(|r| r.satisfies(&rules)));
    assert!(records.iter().any(|r| r.borough == "Staten Island"));
    assert!(records.iter().any(|r| r.borough == "Queens"));
    assert_eq!(records[0].latitude, 40.714502);
    assert_eq!(records[0].longitude, -73.961235);
}

#[test]
fn test_cleaning_is_idempotent() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let raw = write_raw(temp_dir.path());
    let first = temp_dir.path().join("first.csv");
    let second = temp_dir.path().join("second.csv");

    cleaner().clean_file(&raw, &first, None).unwrap();
    let (_, report) = cleaner().clean_file(&first, &second, None).unwrap();

    assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    assert_eq!(report.raw_rows(), report.final_rows());
}

#[test]
fn test_cleaned_header_is_canonical() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let raw = write_raw(temp_dir.path());
    let output = temp_dir.path().join("noise.csv");

    cleaner().clean_file(&raw, &output, None).unwrap();

    let contents = fs::read_to_string(&output).unwrap();
    assert_eq!(
        contents.lines().next(),
        Some("Created Date,Complaint Type,Descriptor,Borough,Latitude,Longitude")
    );
}

#[test]
fn test_missing_column_aborts_cleaning() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let raw = temp_dir.path().join("raw.csv");
    fs::write(
        &raw,
        "Created Date,Complaint Type,Descriptor,Latitude,Longitude\n\
         01/03/2025 11:42:10 PM,Noise,Loud Music/Party,40.7,-73.9\n",
    )
    .unwrap();
    let output = temp_dir.path().join("noise.csv");

    let err = cleaner().clean_file(&raw, &output, None).unwrap_err();
    match err {
        ProcessingError::MissingColumn { column, .. } => assert_eq!(column, "Borough"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!output.exists());
}

#[test]
fn test_empty_result_writes_header_only_table() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let raw = temp_dir.path().join("raw.csv");
    fs::write(
        &raw,
        "Created Date,Complaint Type,Descriptor,Borough,Latitude,Longitude\n\
         01/06/2025 09:00:00 AM,HEAT/HOT WATER,ENTIRE BUILDING,BRONX,40.85,-73.91\n",
    )
    .unwrap();
    let output = temp_dir.path().join("noise.csv");

    let (records, _) = cleaner().clean_file(&raw, &output, None).unwrap();
    assert!(records.is_empty());
    assert_eq!(fs::read_to_string(&output).unwrap().lines().count(), 1);

    // An empty table analyzes without error; every analysis is skipped
    let report = ComplaintAnalyzer::new(AnalysisConfig::default())
        .with_charts(false)
        .with_silent(true)
        .analyze_file(&output, &temp_dir.path().join("charts"))
        .unwrap();
    assert_eq!(report.rows, 0);
    assert!(report
        .outcomes
        .iter()
        .all(|o| matches!(o.status, OutcomeStatus::Skipped(_))));
}

#[test]
fn test_analyze_cleaned_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let raw = write_raw(temp_dir.path());
    let cleaned = temp_dir.path().join("noise.csv");
    cleaner().clean_file(&raw, &cleaned, None).unwrap();

    let report = ComplaintAnalyzer::new(AnalysisConfig::default())
        .with_charts(false)
        .with_max_workers(1)
        .with_silent(true)
        .analyze_file(&cleaned, &temp_dir.path().join("charts"))
        .unwrap();

    assert_eq!(report.rows, 6);
    assert_eq!(report.dropped_rows, 0);
    assert_eq!(report.outcomes.len(), 9);
    assert_eq!(report.completed(), 9);

    let total: usize = report.region_counts.iter().map(|c| c.count).sum();
    assert_eq!(total, report.rows);
    assert_eq!(report.region_counts[0].region, "Brooklyn");

    let test = report.chi_square.as_ref().unwrap();
    assert_eq!(
        test.regions,
        vec!["Bronx", "Brooklyn", "Manhattan", "Queens", "Staten Island"]
    );
    assert_eq!(test.observed, vec![1, 2, 1, 1, 1]);
    assert!(!test.reject_null);
    assert!(report.outcome(GOODNESS_OF_FIT).unwrap().is_completed());

    // One timestamp is unparseable; it only leaves the temporal bins
    let temporal = report.temporal.as_ref().unwrap();
    assert_eq!(temporal.hourly.len(), 24);
    assert_eq!(temporal.weekly.len(), 7);
    assert_eq!(temporal.parsed, 5);
    assert_eq!(temporal.unparsed, 1);
    assert!(report.outcome(HOURLY_TREND).unwrap().is_completed());

    let nn = report.nearest_neighbor.as_ref().unwrap();
    assert_eq!(nn.sampled_points, 6);
    assert!(nn.min <= nn.median && nn.median <= nn.max);

    let crosstab = report.crosstab.as_ref().unwrap();
    let cells: usize = crosstab.counts.iter().flatten().sum();
    assert_eq!(cells, report.rows);
    // Exactly five distinct descriptors, so nothing is relabeled
    assert_eq!(crosstab.categories.len(), 5);
    assert_eq!(crosstab.categories[0], "Loud Music/Party");
    assert!(!crosstab.categories.contains(&"Other".to_string()));
}

const CHART_FILES: [&str; 9] = [
    "borough_counts.png",
    "borough_density.png",
    "borough_descriptor.png",
    "chi_square_observed.png",
    "heatmap_density.png",
    "hourly_trend.png",
    "nnd_distribution.png",
    "scatter_map.png",
    "weekly_trend.png",
];

const BOROUGHS: [&str; 5] = ["Bronx", "Brooklyn", "Manhattan", "Queens", "Staten Island"];
const DESCRIPTORS: [&str; 7] = [
    "Loud Music/Party",
    "Banging/Pounding",
    "Loud Talking",
    "Car/Truck Music",
    "Car/Truck Horn",
    "Engine Idling",
    "Barking Dog",
];

/// Cleaned table spread over the city, with timestamps unless `undated`
fn write_cleaned_table(dir: &Path, rows: usize, undated: bool) -> PathBuf {
    let records: Vec<NoiseComplaint> = (0..rows)
        .map(|i| {
            let created = if undated {
                "unknown".to_string()
            } else {
                format!(
                    "01/{:02}/2025 {:02}:{:02}:00 {}",
                    i % 28 + 1,
                    i % 12 + 1,
                    i % 60,
                    if i % 3 == 0 { "AM" } else { "PM" }
                )
            };
            NoiseComplaint::new(
                Some(created),
                Some("Noise - Residential".to_string()),
                DESCRIPTORS[(i * i) % DESCRIPTORS.len()].to_string(),
                BOROUGHS[i % BOROUGHS.len()].to_string(),
                (40_550_000 + (i * 7_919) % 350_000) as f64 / 1e6,
                (-74_150_000_i64 + ((i * 6_271) % 400_000) as i64) as f64 / 1e6,
            )
        })
        .collect();

    let path = dir.join("noise.csv");
    CsvWriter::new().write_records(&records, &path).unwrap();
    path
}

fn png_files(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".png"))
        .collect()
}

#[test]
fn test_analysis_renders_all_nine_charts() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let cleaned = write_cleaned_table(temp_dir.path(), 300, false);
    let charts_dir = temp_dir.path().join("charts");

    let report = ComplaintAnalyzer::new(AnalysisConfig::default())
        .with_max_workers(2)
        .with_silent(true)
        .analyze_file(&cleaned, &charts_dir)
        .unwrap();

    assert_eq!(report.rows, 300);
    assert_eq!(report.completed(), 9, "{:?}", report.outcomes);

    let expected: BTreeSet<String> = CHART_FILES.iter().map(|s| s.to_string()).collect();
    assert_eq!(png_files(&charts_dir), expected);

    for name in CHART_FILES {
        let path = charts_dir.join(name);
        assert!(fs::metadata(&path).unwrap().len() > 0, "{} is empty", name);
    }
    for outcome in &report.outcomes {
        let chart = outcome.chart.as_ref().unwrap();
        assert!(chart.exists(), "{} points at a missing file", outcome.name);
    }
}

#[test]
fn test_skipped_trend_charts_are_not_written() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let cleaned = write_cleaned_table(temp_dir.path(), 120, true);
    let charts_dir = temp_dir.path().join("charts");

    let report = ComplaintAnalyzer::new(AnalysisConfig::default())
        .with_max_workers(1)
        .with_silent(true)
        .analyze_file(&cleaned, &charts_dir)
        .unwrap();

    assert_eq!(report.completed(), 7, "{:?}", report.outcomes);
    for name in [HOURLY_TREND, WEEKLY_TREND] {
        let outcome = report.outcome(name).unwrap();
        assert!(matches!(outcome.status, OutcomeStatus::Skipped(_)));
        assert_eq!(outcome.chart, None);
    }

    let written = png_files(&charts_dir);
    assert_eq!(written.len(), 7);
    assert!(!written.contains("hourly_trend.png"));
    assert!(!written.contains("weekly_trend.png"));
    assert!(written.contains("heatmap_density.png"));
    assert!(written.contains("nnd_distribution.png"));
}

#[test]
fn test_summary_json_round_trip() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let raw = write_raw(temp_dir.path());
    let cleaned = temp_dir.path().join("noise.csv");
    cleaner().clean_file(&raw, &cleaned, None).unwrap();

    let report = ComplaintAnalyzer::new(AnalysisConfig::default())
        .with_charts(false)
        .with_silent(true)
        .analyze_file(&cleaned, temp_dir.path())
        .unwrap();
    let json_path = temp_dir.path().join("out").join("summary.json");
    report.write_json(&json_path).unwrap();

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(value["rows"], 6);
    assert_eq!(value["outcomes"].as_array().unwrap().len(), 9);
    assert_eq!(value["outcomes"][0]["status"], "completed");
    assert_eq!(value["temporal"]["hourly"].as_array().unwrap().len(), 24);
}

#[test]
fn test_reader_drops_incomplete_cleaned_rows() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("noise.csv");
    fs::write(
        &path,
        "Created Date,Complaint Type,Descriptor,Borough,Latitude,Longitude\n\
         01/03/2025 11:42:10 PM,Noise,Loud Music/Party,Brooklyn,40.7,-73.9\n\
         01/03/2025 11:42:10 PM,Noise,Loud Music/Party,,40.7,-73.9\n",
    )
    .unwrap();

    let (records, dropped) = ComplaintReader::new().read_cleaned(&path).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(dropped, 1);
}

#[test]
fn test_config_file_overrides_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("noise.toml");
    fs::write(
        &path,
        "[analysis]\ntop_descriptors = 3\n\n[analysis.nearest_neighbor]\nsample_cap = 10\n",
    )
    .unwrap();

    let config = PipelineConfig::load(Some(&path)).unwrap();
    assert_eq!(config.analysis.top_descriptors, 3);
    assert_eq!(config.analysis.nearest_neighbor.sample_cap, 10);
    assert_eq!(config.analysis.heatmap.bins, 60);
}

#[test]
fn test_run_command_without_charts() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let raw = write_raw(temp_dir.path());
    let cleaned = temp_dir.path().join("noise.csv");
    let summary = temp_dir.path().join("summary.json");
    let charts = temp_dir.path().join("charts");

    let args: Vec<OsString> = vec![
        "noise-processor".into(),
        "run".into(),
        "--input".into(),
        raw.into_os_string(),
        "--cleaned".into(),
        cleaned.clone().into_os_string(),
        "--output-dir".into(),
        charts.clone().into_os_string(),
        "--summary-json".into(),
        summary.clone().into_os_string(),
        "--no-charts".into(),
        "--max-workers".into(),
        "1".into(),
        "--preview".into(),
        "0".into(),
    ];
    let cli = Cli::parse_from(args);
    run(cli).unwrap();

    assert!(cleaned.exists());
    assert!(summary.exists());
    assert!(!charts.exists());
}
