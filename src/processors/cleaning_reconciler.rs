use crate::models::{
    CountryTranslation, DuplicateResolution, Observation, ObservationKey, OutlierSeverity,
    WindOutlierFlag,
};
use crate::processors::{CountryNormalizer, DuplicateResolver, OutlierDetector};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// A wind outlier that also sits in a same-day duplicate group.
///
/// Outlier exclusion takes precedence: the flagged row is dropped before the
/// group is averaged, so its wind never leaks into the averaged row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateOutlierOverlap {
    pub row: usize,
    pub key: ObservationKey,
    pub severity: OutlierSeverity,
    /// Rows sharing the key in the snapshot.
    pub group_size: usize,
    /// Rows of the group left after outlier exclusion.
    pub surviving_rows: usize,
}

/// The two exclusion sets, kept apart so their intersection is visible.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExclusionSets {
    pub outlier_rows: BTreeSet<usize>,
    pub duplicate_keys: BTreeSet<ObservationKey>,
}

impl ExclusionSets {
    pub fn excludes(&self, row: usize, observation: &Observation) -> bool {
        self.outlier_rows.contains(&row) || self.duplicate_keys.contains(&observation.key())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub cleaned: Vec<Observation>,
    pub flags: Vec<WindOutlierFlag>,
    pub resolution: DuplicateResolution,
    pub overlaps: Vec<DuplicateOutlierOverlap>,
    pub unmapped_countries: Vec<String>,
}

/// Merges kept originals, averaged duplicates and excluded outliers into the
/// cleaned table.
pub struct CleaningReconciler<'a> {
    normalizer: CountryNormalizer<'a>,
    detector: OutlierDetector,
    resolver: DuplicateResolver,
}

impl<'a> CleaningReconciler<'a> {
    pub fn new(translations: &'a CountryTranslation, detector: OutlierDetector) -> Self {
        Self {
            normalizer: CountryNormalizer::new(translations),
            detector,
            resolver: DuplicateResolver::new(),
        }
    }

    /// Produce the cleaned table from a snapshot.
    ///
    /// Flagged rows are removed first and duplicate groups are resolved over
    /// what remains. A group that keeps two or more rows is averaged, a group
    /// left with one row keeps that row as is.
    pub fn clean(&self, snapshot: &[Observation]) -> Reconciliation {
        let flags = self.detector.detect(snapshot);
        let overlaps = self.find_overlaps(snapshot, &flags);

        for overlap in &overlaps {
            warn!(
                "Row {} ({}) is both a wind outlier ({}) and in a duplicate group of {}; excluding it before averaging ({} rows remain)",
                overlap.row, overlap.key, overlap.severity, overlap.group_size, overlap.surviving_rows
            );
        }

        let outlier_rows: BTreeSet<usize> = flags.iter().map(|f| f.row).collect();
        let survivors: Vec<Observation> = snapshot
            .iter()
            .enumerate()
            .filter(|(row, _)| !outlier_rows.contains(row))
            .map(|(_, observation)| observation.clone())
            .collect();

        let resolution = self.resolver.resolve(&survivors);
        let cleaned = self.reconcile_sets(snapshot, &flags, &resolution);
        let unmapped_countries = self.normalizer.unmapped_non_latin(snapshot);

        info!(
            "Cleaned {} snapshot rows into {} ({} outliers, {} duplicate groups, {} overlaps)",
            snapshot.len(),
            cleaned.len(),
            flags.len(),
            resolution.group_count(),
            overlaps.len()
        );

        Reconciliation {
            cleaned,
            flags,
            resolution,
            overlaps,
            unmapped_countries,
        }
    }

    /// Originals minus duplicate keys minus flagged rows, plus the averaged
    /// rows, with countries normalised. Sorted by location and time.
    pub fn reconcile_sets(
        &self,
        snapshot: &[Observation],
        flags: &[WindOutlierFlag],
        resolution: &DuplicateResolution,
    ) -> Vec<Observation> {
        let exclusions = ExclusionSets {
            outlier_rows: flags.iter().map(|f| f.row).collect(),
            duplicate_keys: resolution.keys.iter().cloned().collect(),
        };

        let kept = snapshot
            .iter()
            .enumerate()
            .filter(|(row, observation)| !exclusions.excludes(*row, observation))
            .map(|(_, observation)| observation.clone());

        let averaged = resolution
            .averaged
            .iter()
            .map(|averaged| averaged.observation.clone());

        let mut cleaned: Vec<Observation> = kept
            .chain(averaged)
            .map(|observation| self.normalizer.normalize_observation(observation))
            .collect();

        cleaned.sort_by(|a, b| {
            a.location_name
                .cmp(&b.location_name)
                .then_with(|| a.last_updated.cmp(&b.last_updated))
                .then_with(|| a.country.cmp(&b.country))
        });

        cleaned
    }

    /// Outlier rows whose key is shared with other snapshot rows.
    fn find_overlaps(
        &self,
        snapshot: &[Observation],
        flags: &[WindOutlierFlag],
    ) -> Vec<DuplicateOutlierOverlap> {
        let duplicate_keys = self.resolver.duplicate_keys(snapshot);
        if duplicate_keys.is_empty() || flags.is_empty() {
            return Vec::new();
        }

        let mut group_sizes: BTreeMap<&ObservationKey, usize> = BTreeMap::new();
        for key in &duplicate_keys {
            group_sizes.insert(key, 0);
        }
        for observation in snapshot {
            let key = observation.key();
            if let Some(size) = group_sizes.get_mut(&key) {
                *size += 1;
            }
        }

        let mut flagged_per_key: BTreeMap<&ObservationKey, usize> = BTreeMap::new();
        for flag in flags {
            if duplicate_keys.contains(&flag.key) {
                *flagged_per_key.entry(&flag.key).or_default() += 1;
            }
        }

        flags
            .iter()
            .filter(|flag| duplicate_keys.contains(&flag.key))
            .map(|flag| {
                let group_size = group_sizes.get(&flag.key).copied().unwrap_or(0);
                let flagged = flagged_per_key.get(&flag.key).copied().unwrap_or(0);
                DuplicateOutlierOverlap {
                    row: flag.row,
                    key: flag.key.clone(),
                    severity: flag.severity,
                    group_size,
                    surviving_rows: group_size.saturating_sub(flagged),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::observation::fixtures::{observation, timestamp};
    use std::collections::HashSet;

    fn reconciler(table: &CountryTranslation) -> CleaningReconciler<'_> {
        CleaningReconciler::new(table, OutlierDetector::new())
    }

    #[test]
    fn test_duplicates_collapse_and_outliers_drop() {
        let table = CountryTranslation::reference();
        let snapshot = vec![
            observation("Польша", "Warsaw", "2024-05-16 06:00", 10.0, 0.0),
            observation("Польша", "Warsaw", "2024-05-16 18:00", 20.0, 1.0),
            observation("Польша", "Warsaw", "2024-05-17 12:00", 75.0, 0.0),
            observation("France", "Paris", "2024-05-16 12:00", 5.0, 0.0),
        ];

        let result = reconciler(&table).clean(&snapshot);

        assert_eq!(result.cleaned.len(), 2);
        assert_eq!(result.flags.len(), 1);
        assert_eq!(result.flags[0].row, 2);
        assert!(result.overlaps.is_empty());

        let paris = &result.cleaned[0];
        assert_eq!(paris.location_name, "Paris");
        assert_eq!(paris.country, "France");

        let warsaw = &result.cleaned[1];
        assert_eq!(warsaw.country, "Poland");
        assert!((warsaw.wind_kph - 15.0).abs() < 1e-9);
        assert_eq!(warsaw.last_updated, timestamp("2024-05-16 12:00"));
    }

    #[test]
    fn test_outlier_inside_duplicate_group_is_excluded_before_averaging() {
        let table = CountryTranslation::reference();
        let snapshot = vec![
            observation("France", "Brest", "2024-05-16 06:00", 10.0, 0.0),
            observation("France", "Brest", "2024-05-16 12:00", 130.0, 0.0),
            observation("France", "Brest", "2024-05-16 18:00", 20.0, 0.0),
        ];

        let result = reconciler(&table).clean(&snapshot);

        assert_eq!(result.overlaps.len(), 1);
        assert_eq!(result.overlaps[0].row, 1);
        assert_eq!(result.overlaps[0].severity, OutlierSeverity::LikelyError);
        assert_eq!(result.overlaps[0].group_size, 3);
        assert_eq!(result.overlaps[0].surviving_rows, 2);

        assert_eq!(result.cleaned.len(), 1);
        assert!((result.cleaned[0].wind_kph - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_group_reduced_to_single_row_keeps_original() {
        let table = CountryTranslation::reference();
        let snapshot = vec![
            observation("France", "Brest", "2024-05-16 06:00", 10.0, 0.4),
            observation("France", "Brest", "2024-05-16 12:00", 90.0, 0.0),
        ];

        let result = reconciler(&table).clean(&snapshot);

        assert_eq!(result.overlaps[0].surviving_rows, 1);
        assert_eq!(result.resolution.group_count(), 0);
        assert_eq!(result.cleaned, vec![snapshot[0].clone()]);
    }

    #[test]
    fn test_cleaned_keys_unique_and_wind_bounded() {
        let table = CountryTranslation::reference();
        let mut snapshot = Vec::new();
        for day in 1..=9 {
            for (hour, wind) in [("03:00", 20.0), ("09:00", 65.0 * (day % 2) as f64), ("21:00", 40.0)] {
                snapshot.push(observation(
                    "Турция",
                    "Ankara",
                    &format!("2024-03-0{} {}", day, hour),
                    wind,
                    0.1,
                ));
            }
        }

        let result = reconciler(&table).clean(&snapshot);

        let keys: HashSet<ObservationKey> = result.cleaned.iter().map(|o| o.key()).collect();
        assert_eq!(keys.len(), result.cleaned.len());
        assert!(result.cleaned.iter().all(|o| o.wind_kph <= 60.0));
        assert!(result.cleaned.iter().all(|o| o.country == "Turkey"));
    }

    #[test]
    fn test_clean_is_idempotent() {
        let table = CountryTranslation::reference();
        let snapshot = vec![
            observation("火鸡", "Izmir", "2024-05-16 06:00", 10.0, 0.3),
            observation("Турция", "Izmir", "2024-05-16 07:30", 12.0, 0.2),
            observation("France", "Paris", "2024-05-16 12:00", 5.0, 0.0),
            observation("France", "Paris", "2024-05-16 13:00", 61.0, 0.0),
        ];

        let first = reconciler(&table).clean(&snapshot);
        let second = reconciler(&table).clean(&snapshot);
        assert_eq!(first.cleaned, second.cleaned);
        assert_eq!(first.flags, second.flags);
    }
}
