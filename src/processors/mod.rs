pub mod cleaner;

pub use cleaner::{format_count, Cleaner, CleaningReport, StageCount};
