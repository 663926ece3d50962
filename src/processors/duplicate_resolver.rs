use crate::models::{AveragedObservation, DuplicateResolution, Observation, ObservationKey};
use chrono::Duration;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Collapses same-location, same-day readings into one averaged row.
pub struct DuplicateResolver;

impl DuplicateResolver {
    pub fn new() -> Self {
        Self
    }

    /// Group observations by (location, calendar date). Members keep their
    /// input order within equal timestamps.
    pub fn group_by_key<'a>(
        &self,
        observations: &'a [Observation],
    ) -> BTreeMap<ObservationKey, Vec<&'a Observation>> {
        let mut groups: BTreeMap<ObservationKey, Vec<&Observation>> = BTreeMap::new();
        for observation in observations {
            groups.entry(observation.key()).or_default().push(observation);
        }

        for members in groups.values_mut() {
            members.sort_by_key(|o| o.last_updated);
        }

        groups
    }

    /// Keys shared by more than one observation.
    pub fn duplicate_keys(&self, observations: &[Observation]) -> BTreeSet<ObservationKey> {
        let mut counts: BTreeMap<ObservationKey, usize> = BTreeMap::new();
        for observation in observations {
            *counts.entry(observation.key()).or_default() += 1;
        }

        counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(key, _)| key)
            .collect()
    }

    /// Find every duplicate group and average it. Does not look at wind
    /// outliers; callers decide which rows are eligible.
    pub fn resolve(&self, observations: &[Observation]) -> DuplicateResolution {
        let groups: Vec<(ObservationKey, Vec<&Observation>)> = self
            .group_by_key(observations)
            .into_iter()
            .filter(|(_, members)| members.len() > 1)
            .collect();

        let averaged: Vec<AveragedObservation> = groups
            .par_iter()
            .map(|(key, members)| Self::average_group(key, members))
            .collect();

        debug!(
            "Resolved {} duplicate groups covering {} rows",
            averaged.len(),
            averaged.iter().map(|a| a.source_rows).sum::<usize>()
        );

        DuplicateResolution {
            keys: groups.into_iter().map(|(key, _)| key).collect(),
            averaged,
        }
    }

    /// Mean of every numeric field. The timestamp is the earliest date in the
    /// group plus the mean time of day, rounded to the second.
    pub fn average_group(key: &ObservationKey, members: &[&Observation]) -> AveragedObservation {
        let n = members.len().max(1) as f64;

        let mut sums = [0.0f64; Observation::NUMERIC_FIELD_COUNT];
        let mut seconds_sum = 0.0f64;
        for member in members {
            for (sum, value) in sums.iter_mut().zip(member.numeric_fields()) {
                *sum += value;
            }
            seconds_sum += member.seconds_since_midnight() as f64;
        }

        let means = sums.map(|sum| sum / n);
        let mean_seconds = (seconds_sum / n).round() as i64;

        let earliest_date = members
            .iter()
            .map(|m| m.date())
            .min()
            .unwrap_or(key.date);
        let last_updated = earliest_date
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight + Duration::seconds(mean_seconds))
            .unwrap_or_else(|| members[0].last_updated);

        let country = members
            .first()
            .map(|m| m.country.clone())
            .unwrap_or_default();

        AveragedObservation {
            key: key.clone(),
            observation: Observation::from_numeric_fields(
                country,
                key.location_name.clone(),
                last_updated,
                means,
            ),
            source_rows: members.len(),
        }
    }
}

impl Default for DuplicateResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::observation::fixtures::{observation, timestamp};
    use chrono::NaiveDate;

    #[test]
    fn test_duplicate_keys_only_for_groups_above_one() {
        let observations = vec![
            observation("France", "Paris", "2024-05-16 07:00", 10.0, 0.0),
            observation("France", "Paris", "2024-05-16 19:00", 20.0, 1.0),
            observation("France", "Paris", "2024-05-17 07:00", 10.0, 0.0),
            observation("France", "Lyon", "2024-05-16 07:00", 10.0, 0.0),
        ];

        let keys = DuplicateResolver::new().duplicate_keys(&observations);
        let date = NaiveDate::from_ymd_opt(2024, 5, 16).unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys.contains(&ObservationKey::new("Paris", date)));
    }

    #[test]
    fn test_average_is_field_by_field_mean() {
        let mut a = observation("France", "Paris", "2024-05-16 06:00", 10.0, 0.5);
        a.temperature_celsius = 12.0;
        a.air_quality.ozone = 40.0;
        let mut b = observation("France", "Paris", "2024-05-16 12:00", 20.0, 1.0);
        b.temperature_celsius = 18.0;
        b.air_quality.ozone = 50.0;
        let mut c = observation("France", "Paris", "2024-05-16 18:00", 30.0, 2.1);
        c.temperature_celsius = 21.0;
        c.air_quality.ozone = 90.0;

        let observations = vec![a, b, c];
        let resolution = DuplicateResolver::new().resolve(&observations);

        assert_eq!(resolution.group_count(), 1);
        assert_eq!(resolution.collapsed_rows(), 3);

        let averaged = &resolution.averaged[0].observation;
        assert!((averaged.wind_kph - 20.0).abs() < 1e-9);
        assert!((averaged.temperature_celsius - 17.0).abs() < 1e-9);
        assert!((averaged.precip_mm - 3.6 / 3.0).abs() < 1e-9);
        assert!((averaged.air_quality.ozone - 60.0).abs() < 1e-9);
        assert_eq!(averaged.last_updated, timestamp("2024-05-16 12:00"));
    }

    #[test]
    fn test_average_time_rounds_to_second() {
        let observations = vec![
            observation("France", "Paris", "2024-05-16 00:00", 10.0, 0.0),
            observation("France", "Paris", "2024-05-16 00:01", 10.0, 0.0),
        ];

        let resolution = DuplicateResolver::new().resolve(&observations);
        let averaged = &resolution.averaged[0].observation;
        assert_eq!(averaged.seconds_since_midnight(), 30);
        assert_eq!(averaged.date(), NaiveDate::from_ymd_opt(2024, 5, 16).unwrap());
    }

    #[test]
    fn test_country_taken_from_earliest_member() {
        let observations = vec![
            observation("Poland", "Warsaw", "2024-05-16 18:00", 10.0, 0.0),
            observation("Польша", "Warsaw", "2024-05-16 06:00", 10.0, 0.0),
        ];

        let resolution = DuplicateResolver::new().resolve(&observations);
        assert_eq!(resolution.averaged[0].observation.country, "Польша");
    }

    #[test]
    fn test_no_duplicates_yields_empty_resolution() {
        let observations = vec![
            observation("France", "Paris", "2024-05-16 07:00", 10.0, 0.0),
            observation("France", "Paris", "2024-05-17 07:00", 10.0, 0.0),
        ];

        let resolution = DuplicateResolver::new().resolve(&observations);
        assert_eq!(resolution, DuplicateResolution::default());
    }
}
