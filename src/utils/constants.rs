/// Wind thresholds (km/h)
pub const WIND_OUTLIER_KPH: f64 = 60.0;
pub const WIND_ERROR_KPH: f64 = 120.0;

/// Minimum distinct observation dates a location needs before it gets weekly rollups
pub const MIN_DISTINCT_DATES: usize = 40;

/// Output file names
pub const CLEANED_FILE: &str = "cleaned.parquet";
pub const FEATURES_FILE: &str = "features.parquet";
pub const WEEKLY_FILE: &str = "weekly.parquet";
pub const OUTLIERS_FILE: &str = "outliers.csv";
pub const REPORT_FILE: &str = "report.json";

/// Accepted `last_updated` layouts, tried in order
pub const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Environment prefix for configuration overrides
pub const CONFIG_ENV_PREFIX: &str = "WEATHER_REPO";

/// Processing defaults
pub const DEFAULT_CHUNK_SIZE: usize = 10000;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
