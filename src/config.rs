use crate::error::{ProcessingError, Result};
use crate::utils::constants::{
    CONFIG_ENV_PREFIX, DEFAULT_CHUNK_SIZE, MIN_DISTINCT_DATES, WIND_ERROR_KPH, WIND_OUTLIER_KPH,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunable thresholds and execution settings for a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rows with wind above this are excluded as outliers.
    pub wind_outlier_kph: f64,
    /// Outliers above this are labelled "likely error".
    pub wind_error_kph: f64,
    /// Locations need strictly more distinct dates than this for weekly rollups.
    pub min_distinct_dates: usize,
    pub max_workers: usize,
    pub chunk_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            wind_outlier_kph: WIND_OUTLIER_KPH,
            wind_error_kph: WIND_ERROR_KPH,
            min_distinct_dates: MIN_DISTINCT_DATES,
            max_workers: num_cpus::get(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl PipelineConfig {
    /// Load from an optional TOML file, then apply `WEATHER_REPO_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(CONFIG_ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: PipelineConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_min_distinct_dates(mut self, min_distinct_dates: usize) -> Self {
        self.min_distinct_dates = min_distinct_dates;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.wind_outlier_kph > 0.0) {
            return Err(ProcessingError::InvalidConfig(format!(
                "wind_outlier_kph must be positive, got {}",
                self.wind_outlier_kph
            )));
        }

        if self.wind_error_kph.is_nan() || self.wind_error_kph < self.wind_outlier_kph {
            return Err(ProcessingError::InvalidConfig(format!(
                "wind_error_kph ({}) must not be below wind_outlier_kph ({})",
                self.wind_error_kph, self.wind_outlier_kph
            )));
        }

        if self.max_workers == 0 {
            return Err(ProcessingError::InvalidConfig(
                "max_workers must be at least 1".to_string(),
            ));
        }

        if self.chunk_size == 0 {
            return Err(ProcessingError::InvalidConfig(
                "chunk_size must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert_eq!(config.wind_outlier_kph, 60.0);
        assert_eq!(config.wind_error_kph, 120.0);
        assert_eq!(config.min_distinct_dates, 40);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_keeps_missing_defaults() -> Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "min_distinct_dates = 10")?;
        writeln!(file, "max_workers = 2")?;

        let config = PipelineConfig::load(Some(file.path()))?;
        assert_eq!(config.min_distinct_dates, 10);
        assert_eq!(config.max_workers, 2);
        assert_eq!(config.wind_outlier_kph, 60.0);
        Ok(())
    }

    #[test]
    fn test_rejects_inverted_wind_thresholds() {
        let config = PipelineConfig {
            wind_outlier_kph: 80.0,
            wind_error_kph: 70.0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ProcessingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_nan_error_threshold() {
        let config = PipelineConfig {
            wind_error_kph: f64::NAN,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ProcessingError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_rejects_zero_workers() {
        let config = PipelineConfig::default().with_max_workers(0);
        assert!(config.validate().is_err());
    }
}
