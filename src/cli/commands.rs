use crate::analyzers::ComplaintAnalyzer;
use crate::cli::args::{AnalysisArgs, Cli, Commands};
use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::models::NoiseComplaint;
use crate::processors::Cleaner;
use crate::readers::ComplaintReader;
use crate::utils::default_summary_path;
use crate::utils::progress::ProgressReporter;
use std::path::Path;
use tabled::settings::Style;
use tabled::{Table, Tabled};
use tracing::debug;

pub fn run(cli: Cli) -> Result<()> {
    let config = PipelineConfig::load(cli.config.as_deref())?;
    debug!(?config, "loaded configuration");

    match cli.command {
        Commands::Clean {
            input,
            output,
            preview,
            delimiter,
        } => {
            clean(&config, &input, &output, preview, delimiter)?;
        }

        Commands::Analyze { input, analysis } => {
            analyze(&config, &input, &analysis)?;
        }

        Commands::Run {
            input,
            cleaned,
            preview,
            delimiter,
            analysis,
        } => {
            clean(&config, &input, &cleaned, preview, delimiter)?;
            // The analyzer only sees what was written to disk
            analyze(&config, &cleaned, &analysis)?;
        }
    }

    Ok(())
}

fn reader_for(delimiter: char) -> Result<ComplaintReader> {
    if !delimiter.is_ascii() {
        return Err(ProcessingError::Config(format!(
            "delimiter must be a single ASCII character, got '{}'",
            delimiter
        )));
    }
    Ok(ComplaintReader::with_delimiter(delimiter as u8))
}

fn clean(
    config: &PipelineConfig,
    input: &Path,
    output: &Path,
    preview: usize,
    delimiter: char,
) -> Result<()> {
    println!("Cleaning raw complaints...");
    println!("Input file: {}", input.display());
    println!("Output file: {}", output.display());

    let progress = ProgressReporter::new_spinner("Loading raw dataset...", false);
    let cleaner = Cleaner::new(config.cleaning.clone()).with_reader(reader_for(delimiter)?);
    let (records, report) = cleaner.clean_file(input, output, Some(&progress))?;
    progress.finish_with_message(&format!("Cleaned {} rows", records.len()));

    println!("\n{}", report.generate_summary());
    println!("Cleaned data saved to {}", output.display());

    if preview > 0 && !records.is_empty() {
        println!("\nFirst {} cleaned rows:", preview.min(records.len()));
        println!("{}", preview_table(&records, preview));
    }

    Ok(())
}

fn analyze(config: &PipelineConfig, input: &Path, args: &AnalysisArgs) -> Result<()> {
    println!("\nAnalyzing cleaned complaints...");
    println!("Input file: {}", input.display());
    if args.no_charts {
        println!("Chart rendering disabled");
    } else {
        println!("Chart directory: {}", args.output_dir.display());
    }

    let analyzer = ComplaintAnalyzer::new(config.analysis.clone())
        .with_charts(!args.no_charts)
        .with_max_workers(args.max_workers);
    let report = analyzer.analyze_file(input, &args.output_dir)?;

    println!("\n{}", report.generate_summary());

    if let Some(path) = &args.summary_json {
        let path = path
            .clone()
            .unwrap_or_else(|| default_summary_path(&args.output_dir));
        report.write_json(&path)?;
        println!("Summary written to {}", path.display());
    }

    Ok(())
}

#[derive(Tabled)]
struct PreviewRow {
    #[tabled(rename = "Created Date")]
    created_date: String,
    #[tabled(rename = "Complaint Type")]
    complaint_type: String,
    #[tabled(rename = "Descriptor")]
    descriptor: String,
    #[tabled(rename = "Borough")]
    borough: String,
    #[tabled(rename = "Latitude")]
    latitude: String,
    #[tabled(rename = "Longitude")]
    longitude: String,
}

impl From<&NoiseComplaint> for PreviewRow {
    fn from(record: &NoiseComplaint) -> Self {
        Self {
            created_date: record.created_date.clone().unwrap_or_default(),
            complaint_type: record.complaint_type.clone().unwrap_or_default(),
            descriptor: record.descriptor.clone(),
            borough: record.borough.clone(),
            latitude: format!("{:.6}", record.latitude),
            longitude: format!("{:.6}", record.longitude),
        }
    }
}

fn preview_table(records: &[NoiseComplaint], rows: usize) -> String {
    Table::new(records.iter().take(rows).map(PreviewRow::from))
        .with(Style::rounded())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_for_rejects_non_ascii() {
        assert!(reader_for(';').is_ok());
        assert!(matches!(reader_for('§'), Err(ProcessingError::Config(_))));
    }

    #[test]
    fn test_preview_table_limits_rows() {
        let records: Vec<NoiseComplaint> = (0..4)
            .map(|i| {
                NoiseComplaint::new(
                    None,
                    Some("Noise - Park".to_string()),
                    format!("Descriptor {}", i),
                    "Queens".to_string(),
                    40.7,
                    -73.8,
                )
            })
            .collect();

        let table = preview_table(&records, 2);
        assert!(table.contains("Descriptor 1"));
        assert!(!table.contains("Descriptor 2"));
        assert!(table.contains("40.700000"));
    }
}
