use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{Observation, ObservationKey};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct IntegrityReport {
    pub total_records: usize,
    pub distinct_locations: usize,
    pub violations: Vec<IntegrityViolation>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct IntegrityViolation {
    pub key: ObservationKey,
    pub violation_type: ViolationType,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationType {
    DuplicateKey,
    WindAboveThreshold,
}

/// Re-verifies the guarantees of the cleaned table.
pub struct IntegrityChecker {
    wind_threshold_kph: f64,
}

impl IntegrityChecker {
    pub fn new() -> Self {
        Self::from_config(&PipelineConfig::default())
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            wind_threshold_kph: config.wind_outlier_kph,
        }
    }

    pub fn check_integrity(&self, cleaned: &[Observation]) -> IntegrityReport {
        let mut report = IntegrityReport {
            total_records: cleaned.len(),
            ..IntegrityReport::default()
        };

        let mut seen: HashMap<ObservationKey, usize> = HashMap::with_capacity(cleaned.len());
        for observation in cleaned {
            *seen.entry(observation.key()).or_default() += 1;

            if observation.wind_kph.is_nan() || observation.wind_kph > self.wind_threshold_kph {
                report.violations.push(IntegrityViolation {
                    key: observation.key(),
                    violation_type: ViolationType::WindAboveThreshold,
                    details: format!(
                        "wind {} km/h exceeds {} km/h",
                        observation.wind_kph, self.wind_threshold_kph
                    ),
                });
            }
        }

        let mut duplicates: Vec<(ObservationKey, usize)> =
            seen.into_iter().filter(|(_, count)| *count > 1).collect();
        duplicates.sort();

        for (key, count) in duplicates {
            report.violations.push(IntegrityViolation {
                key,
                violation_type: ViolationType::DuplicateKey,
                details: format!("{} rows share this location and date", count),
            });
        }

        report.distinct_locations = cleaned
            .iter()
            .map(|o| o.location_name.as_str())
            .collect::<std::collections::HashSet<_>>()
            .len();

        report
    }

    /// Fail on the first violation.
    pub fn enforce(&self, cleaned: &[Observation]) -> Result<IntegrityReport> {
        let report = self.check_integrity(cleaned);
        if let Some(violation) = report.violations.first() {
            return Err(ProcessingError::Invariant(format!(
                "{} ({}): {} violation(s) in total",
                violation.key,
                violation.details,
                report.violations.len()
            )));
        }
        Ok(report)
    }

    pub fn generate_summary(&self, report: &IntegrityReport) -> String {
        let mut summary = String::new();

        summary.push_str("=== Integrity Check Report ===\n");
        summary.push_str(&format!("Cleaned Records: {}\n", report.total_records));
        summary.push_str(&format!("Locations: {}\n", report.distinct_locations));
        summary.push_str(&format!("Violations: {}\n", report.violations.len()));

        if !report.violations.is_empty() {
            summary.push_str("\nTop 10 Violations:\n");
            for (i, violation) in report.violations.iter().take(10).enumerate() {
                summary.push_str(&format!(
                    "  {}. {:?} for {}: {}\n",
                    i + 1,
                    violation.violation_type,
                    violation.key,
                    violation.details
                ));
            }
        }

        summary
    }
}

impl Default for IntegrityChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::observation::fixtures::observation;

    #[test]
    fn test_clean_table_passes() {
        let cleaned = vec![
            observation("France", "Paris", "2024-05-16 07:00", 10.0, 0.0),
            observation("France", "Paris", "2024-05-17 07:00", 60.0, 0.0),
        ];

        let report = IntegrityChecker::new().enforce(&cleaned).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.distinct_locations, 1);
    }

    #[test]
    fn test_detects_duplicate_key_and_wind() {
        let cleaned = vec![
            observation("France", "Paris", "2024-05-16 07:00", 10.0, 0.0),
            observation("France", "Paris", "2024-05-16 19:00", 61.0, 0.0),
        ];

        let checker = IntegrityChecker::new();
        let report = checker.check_integrity(&cleaned);

        let types: Vec<ViolationType> = report.violations.iter().map(|v| v.violation_type).collect();
        assert_eq!(
            types,
            vec![ViolationType::WindAboveThreshold, ViolationType::DuplicateKey]
        );
        assert!(checker.enforce(&cleaned).is_err());
        assert!(checker.generate_summary(&report).contains("Violations: 2"));
    }

    #[test]
    fn test_nan_wind_is_a_violation() {
        let mut row = observation("Peru", "Lima", "2024-05-16 07:00", 10.0, 0.0);
        row.wind_kph = f64::NAN;

        let checker = IntegrityChecker::new();
        let report = checker.check_integrity(&[row.clone()]);

        assert_eq!(report.violations.len(), 1);
        assert_eq!(report.violations[0].violation_type, ViolationType::WindAboveThreshold);
        assert!(checker.enforce(&[row]).is_err());
    }
}
