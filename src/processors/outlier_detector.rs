use crate::config::PipelineConfig;
use crate::models::{Observation, OutlierSeverity, WindOutlierFlag};
use rayon::prelude::*;

/// Flags observations whose wind speed is beyond physical plausibility.
///
/// Only wind is screened. Temperature, humidity, pressure and precipitation
/// have physical bounds too but are left untouched.
pub struct OutlierDetector {
    outlier_threshold_kph: f64,
    error_threshold_kph: f64,
}

impl OutlierDetector {
    pub fn new() -> Self {
        Self::from_config(&PipelineConfig::default())
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            outlier_threshold_kph: config.wind_outlier_kph,
            error_threshold_kph: config.wind_error_kph,
        }
    }

    pub fn with_thresholds(outlier_threshold_kph: f64, error_threshold_kph: f64) -> Self {
        Self {
            outlier_threshold_kph,
            error_threshold_kph,
        }
    }

    pub fn outlier_threshold_kph(&self) -> f64 {
        self.outlier_threshold_kph
    }

    /// Severity for a wind reading, `None` when it is within range.
    pub fn classify(&self, wind_kph: f64) -> Option<OutlierSeverity> {
        if wind_kph > self.error_threshold_kph {
            Some(OutlierSeverity::LikelyError)
        } else if wind_kph > self.outlier_threshold_kph {
            Some(OutlierSeverity::PotentiallyExtremeEvent)
        } else {
            None
        }
    }

    pub fn is_outlier(&self, observation: &Observation) -> bool {
        self.classify(observation.wind_kph).is_some()
    }

    pub fn check(&self, row: usize, observation: &Observation) -> Option<WindOutlierFlag> {
        self.classify(observation.wind_kph)
            .map(|severity| WindOutlierFlag {
                row,
                key: observation.key(),
                country: observation.country.clone(),
                last_updated: observation.last_updated,
                wind_kph: observation.wind_kph,
                severity,
            })
    }

    /// Flag every outlier in the snapshot, ordered by row position.
    pub fn detect(&self, observations: &[Observation]) -> Vec<WindOutlierFlag> {
        observations
            .par_iter()
            .enumerate()
            .filter_map(|(row, observation)| self.check(row, observation))
            .collect()
    }
}

impl Default for OutlierDetector {
    fn default() -> Self {
        Self::new()
    }
}
