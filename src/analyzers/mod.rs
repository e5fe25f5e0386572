pub mod chi_square;
pub mod complaint_analyzer;
pub mod regions;
pub mod report;
pub mod spatial;
pub mod temporal;

pub use chi_square::{critical_value, goodness_of_fit, ChiSquareTest};
pub use complaint_analyzer::ComplaintAnalyzer;
pub use regions::{
    descriptor_crosstab, rank_by_density, region_counts, region_density, top_descriptors,
    DescriptorCrosstab, RegionCount, RegionDensity,
};
pub use report::{AnalysisOutcome, AnalysisReport, HeatmapSummary, OutcomeStatus};
pub use spatial::{nearest_neighbor_distances, DensityGrid, DistanceSummary, Histogram};
pub use temporal::{temporal_profile, TemporalProfile, WeekdayCount};
