use crate::config::PipelineConfig;
use crate::error::{ProcessingError, Result};
use crate::models::{
    CountryTranslation, DerivedFeatureRow, Observation, OutlierSeverity, WeeklyAggregate,
    WindOutlierFlag,
};
use crate::processors::{
    CleaningReconciler, DuplicateOutlierOverlap, FeatureDeriver, IntegrityChecker,
    IntegrityReport, OutlierDetector, Reconciliation, WeeklyAggregator,
};
use crate::readers::{SkippedRow, Snapshot};
use crate::utils::progress::ProgressReporter;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Counts describing one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub skipped_rows: Vec<SkippedRow>,
    pub outlier_rows: usize,
    pub likely_error_rows: usize,
    pub extreme_event_rows: usize,
    pub duplicate_groups: usize,
    pub rows_collapsed: usize,
    pub overlaps: Vec<DuplicateOutlierOverlap>,
    pub cleaned_rows: usize,
    pub feature_rows: usize,
    pub weekly_rows: usize,
    pub unmapped_countries: Vec<String>,
}

impl CleaningReport {
    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("=== Cleaning Report ===\n");
        summary.push_str(&format!("Snapshot Rows: {}\n", self.input_rows));
        summary.push_str(&format!("Skipped (malformed): {}\n", self.skipped_rows.len()));
        summary.push_str(&format!(
            "Wind Outliers Excluded: {} ({} likely error, {} potentially extreme event)\n",
            self.outlier_rows, self.likely_error_rows, self.extreme_event_rows
        ));
        summary.push_str(&format!(
            "Duplicate Groups: {} ({} rows collapsed)\n",
            self.duplicate_groups, self.rows_collapsed
        ));
        summary.push_str(&format!(
            "Duplicate/Outlier Overlaps: {}\n",
            self.overlaps.len()
        ));
        summary.push_str(&format!("Cleaned Rows: {}\n", self.cleaned_rows));
        summary.push_str(&format!("Weekly Aggregates: {}\n", self.weekly_rows));

        if !self.unmapped_countries.is_empty() {
            summary.push_str(&format!(
                "Untranslated country names: {}\n",
                self.unmapped_countries.join(", ")
            ));
        }

        summary
    }
}

/// Everything a pipeline run produces.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    pub cleaned: Vec<Observation>,
    pub features: Vec<DerivedFeatureRow>,
    pub weekly: Vec<WeeklyAggregate>,
    pub flags: Vec<WindOutlierFlag>,
    pub integrity: IntegrityReport,
    pub report: CleaningReport,
}

pub struct ParallelProcessor {
    config: PipelineConfig,
}

impl ParallelProcessor {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the full batch: clean, check, derive features, aggregate weeks.
    pub fn process(
        &self,
        snapshot: &Snapshot,
        translations: &CountryTranslation,
        progress: Option<&ProgressReporter>,
    ) -> Result<PipelineOutput> {
        self.thread_pool()?
            .install(|| self.run_stages(snapshot, translations, progress))
    }

    /// Cleaning and the integrity check only.
    pub fn clean_only(
        &self,
        snapshot: &Snapshot,
        translations: &CountryTranslation,
    ) -> Result<(Vec<Observation>, IntegrityReport, CleaningReport)> {
        self.thread_pool()?.install(|| {
            let reconciler =
                CleaningReconciler::new(translations, OutlierDetector::from_config(&self.config));
            let reconciliation = reconciler.clean(&snapshot.observations);
            let integrity = IntegrityChecker::from_config(&self.config)
                .check_integrity(&reconciliation.cleaned);

            let report = Self::cleaning_report(snapshot, &reconciliation);

            Ok((reconciliation.cleaned, integrity, report))
        })
    }

    /// Validated config, then a pool sized by `max_workers`.
    fn thread_pool(&self) -> Result<rayon::ThreadPool> {
        self.config.validate()?;

        rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.max_workers)
            .build()
            .map_err(|e| ProcessingError::InvalidConfig(e.to_string()))
    }

    fn run_stages(
        &self,
        snapshot: &Snapshot,
        translations: &CountryTranslation,
        progress: Option<&ProgressReporter>,
    ) -> Result<PipelineOutput> {
        if let Some(p) = progress {
            p.stage(1, "Detecting outliers and resolving duplicates...");
        }

        let reconciler =
            CleaningReconciler::new(translations, OutlierDetector::from_config(&self.config));
        let reconciliation = reconciler.clean(&snapshot.observations);

        if let Some(p) = progress {
            p.stage(2, "Checking cleaned table integrity...");
        }

        let integrity = IntegrityChecker::from_config(&self.config).enforce(&reconciliation.cleaned)?;

        if let Some(p) = progress {
            p.stage(3, "Deriving features...");
        }

        let features = FeatureDeriver::new().derive(&reconciliation.cleaned);

        if let Some(p) = progress {
            p.stage(4, "Aggregating weeks...");
        }

        let weekly = WeeklyAggregator::from_config(&self.config).aggregate(&reconciliation.cleaned);

        let mut report = Self::cleaning_report(snapshot, &reconciliation);
        report.feature_rows = features.len();
        report.weekly_rows = weekly.len();

        info!(
            "Pipeline complete: {} snapshot rows -> {} cleaned, {} weekly aggregates",
            report.input_rows, report.cleaned_rows, report.weekly_rows
        );

        Ok(PipelineOutput {
            cleaned: reconciliation.cleaned,
            features,
            weekly,
            flags: reconciliation.flags,
            integrity,
            report,
        })
    }

    fn cleaning_report(snapshot: &Snapshot, reconciliation: &Reconciliation) -> CleaningReport {
        let flags = &reconciliation.flags;
        let likely_error_rows = flags
            .iter()
            .filter(|f| f.severity == OutlierSeverity::LikelyError)
            .count();

        CleaningReport {
            input_rows: snapshot.observations.len() + snapshot.skipped.len(),
            skipped_rows: snapshot.skipped.clone(),
            outlier_rows: flags.len(),
            likely_error_rows,
            extreme_event_rows: flags.len() - likely_error_rows,
            duplicate_groups: reconciliation.resolution.group_count(),
            rows_collapsed: reconciliation.resolution.collapsed_rows(),
            overlaps: reconciliation.overlaps.clone(),
            cleaned_rows: reconciliation.cleaned.len(),
            unmapped_countries: reconciliation.unmapped_countries.clone(),
            ..CleaningReport::default()
        }
    }
}

impl Default for ParallelProcessor {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::observation::fixtures::observation;

    #[test]
    fn test_process_reports_counts() -> Result<()> {
        let snapshot = Snapshot {
            observations: vec![
                observation("Bélgica", "Brussels", "2024-05-16 06:00", 10.0, 0.2),
                observation("Bélgica", "Brussels", "2024-05-16 18:00", 14.0, 0.4),
                observation("Belgium", "Brussels", "2024-05-17 06:00", 130.0, 0.0),
                observation("Belgium", "Brussels", "2024-05-18 06:00", 70.0, 0.0),
            ],
            skipped: vec![SkippedRow {
                line: 7,
                reason: "unparseable timestamp".to_string(),
            }],
        };

        let processor = ParallelProcessor::new(PipelineConfig::default().with_max_workers(2));
        let output = processor.process(&snapshot, &CountryTranslation::reference(), None)?;

        assert_eq!(output.report.input_rows, 5);
        assert_eq!(output.report.skipped_rows.len(), 1);
        assert_eq!(output.report.outlier_rows, 2);
        assert_eq!(output.report.likely_error_rows, 1);
        assert_eq!(output.report.extreme_event_rows, 1);
        assert_eq!(output.report.duplicate_groups, 1);
        assert_eq!(output.report.rows_collapsed, 2);
        assert_eq!(output.cleaned.len(), 1);
        assert_eq!(output.cleaned[0].country, "Belgium");
        assert_eq!(output.features.len(), 1);
        assert!(output.weekly.is_empty());
        assert!(output.integrity.is_clean());
        Ok(())
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let processor = ParallelProcessor::new(PipelineConfig::default().with_max_workers(0));
        let result = processor.process(
            &Snapshot::default(),
            &CountryTranslation::reference(),
            None,
        );
        assert!(matches!(result, Err(ProcessingError::InvalidConfig(_))));
    }

    #[test]
    fn test_clean_only_validates_config() {
        let processor = ParallelProcessor::new(PipelineConfig::default().with_max_workers(0));
        let result = processor.clean_only(&Snapshot::default(), &CountryTranslation::reference());
        assert!(matches!(result, Err(ProcessingError::InvalidConfig(_))));
    }

    #[test]
    fn test_clean_only_runs_on_sized_pool() -> Result<()> {
        let snapshot = Snapshot::from_observations(vec![
            observation("Peru", "Lima", "2024-05-16 06:00", 10.0, 0.0),
            observation("Peru", "Lima", "2024-05-16 18:00", 20.0, 0.0),
            observation("Peru", "Lima", "2024-05-17 06:00", 90.0, 0.0),
        ]);

        let processor = ParallelProcessor::new(PipelineConfig::default().with_max_workers(1));
        let (cleaned, integrity, report) =
            processor.clean_only(&snapshot, &CountryTranslation::reference())?;

        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned[0].wind_kph, 15.0);
        assert!(integrity.is_clean());
        assert_eq!(report.outlier_rows, 1);
        assert_eq!(report.duplicate_groups, 1);
        Ok(())
    }
}
