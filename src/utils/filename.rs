use std::path::{Path, PathBuf};

/// Path of a PNG chart inside the output directory, e.g. `output/borough_counts.png`
pub fn chart_file_path(output_dir: &Path, stem: &str) -> PathBuf {
    output_dir.join(format!("{}.png", stem))
}

/// Default location of the JSON summary next to the charts
pub fn default_summary_path(output_dir: &Path) -> PathBuf {
    output_dir.join("analysis_summary.json")
}
