use crate::utils::constants::{
    DEFAULT_CLEAN_PATH, DEFAULT_OUTPUT_DIR, DEFAULT_RAW_PATH, PREVIEW_ROWS,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "noise-processor")]
#[command(about = "Clean and analyze NYC 311 noise complaint exports")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(
        short,
        long,
        global = true,
        help = "Configuration file (TOML, JSON or YAML)"
    )]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Filter and validate a raw 311 export into a cleaned table
    Clean {
        #[arg(short, long, default_value = DEFAULT_RAW_PATH, help = "Raw CSV export")]
        input: PathBuf,

        #[arg(short, long, default_value = DEFAULT_CLEAN_PATH, help = "Cleaned CSV output")]
        output: PathBuf,

        #[arg(long, default_value_t = PREVIEW_ROWS, help = "Cleaned rows to print (0 = none)")]
        preview: usize,

        #[arg(long, default_value_t = ',', help = "Field delimiter of the raw export")]
        delimiter: char,
    },

    /// Compute statistics and charts from a cleaned table
    Analyze {
        #[arg(short, long, default_value = DEFAULT_CLEAN_PATH, help = "Cleaned CSV table")]
        input: PathBuf,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },

    /// Clean a raw export, then analyze the cleaned file
    Run {
        #[arg(short, long, default_value = DEFAULT_RAW_PATH, help = "Raw CSV export")]
        input: PathBuf,

        #[arg(long, default_value = DEFAULT_CLEAN_PATH, help = "Intermediate cleaned CSV")]
        cleaned: PathBuf,

        #[arg(long, default_value_t = PREVIEW_ROWS, help = "Cleaned rows to print (0 = none)")]
        preview: usize,

        #[arg(long, default_value_t = ',', help = "Field delimiter of the raw export")]
        delimiter: char,

        #[command(flatten)]
        analysis: AnalysisArgs,
    },
}

#[derive(Args)]
pub struct AnalysisArgs {
    #[arg(short = 'd', long, default_value = DEFAULT_OUTPUT_DIR, help = "Directory for PNG charts")]
    pub output_dir: PathBuf,

    #[arg(long, help = "Compute statistics without rendering charts")]
    pub no_charts: bool,

    #[arg(
        long,
        num_args = 0..=1,
        help = "Write the analysis report as JSON [default path: <output-dir>/analysis_summary.json]"
    )]
    pub summary_json: Option<Option<PathBuf>>,

    #[arg(long, default_value_t = num_cpus::get())]
    pub max_workers: usize,
}
