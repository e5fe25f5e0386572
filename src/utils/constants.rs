/// Column names shared by the raw export and the cleaned table
pub const COL_CREATED_DATE: &str = "Created Date";
pub const COL_COMPLAINT_TYPE: &str = "Complaint Type";
pub const COL_DESCRIPTOR: &str = "Descriptor";
pub const COL_BOROUGH: &str = "Borough";
pub const COL_LATITUDE: &str = "Latitude";
pub const COL_LONGITUDE: &str = "Longitude";

pub const REQUIRED_COLUMNS: [&str; 6] = [
    COL_CREATED_DATE,
    COL_COMPLAINT_TYPE,
    COL_DESCRIPTOR,
    COL_BOROUGH,
    COL_LATITUDE,
    COL_LONGITUDE,
];

/// Cell values read as missing, matching common CSV export conventions
pub const NULL_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Default file locations
pub const DEFAULT_RAW_PATH: &str = "Data/data.csv";
pub const DEFAULT_CLEAN_PATH: &str = "cleanData/noise_complaints_clean.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Cleaning defaults
pub const NOISE_KEYWORD: &str = "noise";
pub const INVALID_BOROUGHS: [&str; 4] = ["Unspecified", "", "None", "N/a"];
pub const COORDINATE_PRECISION: u32 = 6;

/// NYC validity bounds
pub const NYC_MIN_LAT: f64 = 40.477;
pub const NYC_MAX_LAT: f64 = 40.917;
pub const NYC_MIN_LON: f64 = -74.259;
pub const NYC_MAX_LON: f64 = -73.700;

/// Heatmap extent and resolution
pub const HEATMAP_MIN_LAT: f64 = 40.47;
pub const HEATMAP_MAX_LAT: f64 = 40.92;
pub const HEATMAP_MIN_LON: f64 = -74.25;
pub const HEATMAP_MAX_LON: f64 = -73.70;
pub const HEATMAP_BINS: usize = 60;

/// Borough land areas in square kilometers
pub const BOROUGH_AREAS_SQ_KM: [(&str, f64); 5] = [
    ("Bronx", 109.3),
    ("Brooklyn", 183.4),
    ("Manhattan", 59.1),
    ("Queens", 280.0),
    ("Staten Island", 151.5),
];

/// Analysis defaults
pub const TOP_DESCRIPTORS: usize = 5;
pub const OTHER_DESCRIPTOR: &str = "Other";
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;
pub const NEIGHBOR_SAMPLE_CAP: usize = 1500;
pub const NEIGHBOR_COUNT: usize = 5;
pub const NEIGHBOR_HISTOGRAM_BINS: usize = 30;

/// Timestamp formats tried in order; the first is the 311 export format
pub const TIMESTAMP_FORMATS: [&str; 4] = [
    "%m/%d/%Y %I:%M:%S %p",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

/// Date-only values count as midnight
pub const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

/// Chart output
pub const CHART_WIDTH: u32 = 1200;
pub const CHART_HEIGHT: u32 = 800;
pub const PREVIEW_ROWS: usize = 5;
