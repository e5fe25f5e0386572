pub mod constants;
pub mod coordinates;
pub mod filename;
pub mod progress;
pub mod text;

pub use constants::*;
pub use coordinates::{euclidean_distance, round_coordinate, GeoBounds};
pub use filename::{chart_file_path, default_summary_path};
pub use progress::ProgressReporter;
pub use text::title_case;
