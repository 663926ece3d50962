pub mod cleaning_reconciler;
pub mod country_normalizer;
pub mod duplicate_resolver;
pub mod feature_deriver;
pub mod integrity_checker;
pub mod outlier_detector;
pub mod parallel_processor;
pub mod weekly_aggregator;

pub use cleaning_reconciler::{
    CleaningReconciler, DuplicateOutlierOverlap, ExclusionSets, Reconciliation,
};
pub use country_normalizer::CountryNormalizer;
pub use duplicate_resolver::DuplicateResolver;
pub use feature_deriver::FeatureDeriver;
pub use integrity_checker::{IntegrityChecker, IntegrityReport, IntegrityViolation, ViolationType};
pub use outlier_detector::OutlierDetector;
pub use parallel_processor::{CleaningReport, ParallelProcessor, PipelineOutput};
pub use weekly_aggregator::WeeklyAggregator;
