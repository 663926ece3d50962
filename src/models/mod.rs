pub mod duplicate;
pub mod features;
pub mod observation;
pub mod outlier;
pub mod translation;
pub mod weekly;

pub use duplicate::{AveragedObservation, DuplicateResolution};
pub use features::{day_segment, iso_year_week, season, DaySegment, DerivedFeatureRow, Season};
pub use observation::{AirQuality, Observation, ObservationBuilder, ObservationKey};
pub use outlier::{OutlierSeverity, WindOutlierFlag};
pub use translation::{CountryTranslation, REFERENCE_TRANSLATIONS};
pub use weekly::{WeekPartition, WeeklyAggregate};
