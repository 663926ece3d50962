use crate::models::{
    day_segment, iso_year_week, season, DerivedFeatureRow, Observation, WeekPartition,
};
use crate::utils::round_to;
use chrono::Datelike;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Attaches day segment, season and a running weekly rainfall total to each
/// cleaned observation.
pub struct FeatureDeriver {
    rain_decimals: u32,
}

impl FeatureDeriver {
    pub fn new() -> Self {
        Self { rain_decimals: 2 }
    }

    pub fn partition_of(observation: &Observation) -> WeekPartition {
        let (iso_year, iso_week) = iso_year_week(observation.date());
        WeekPartition {
            country: observation.country.clone(),
            location_name: observation.location_name.clone(),
            iso_year,
            iso_week,
        }
    }

    /// One feature row per cleaned observation, in the input order.
    pub fn derive(&self, cleaned: &[Observation]) -> Vec<DerivedFeatureRow> {
        let mut partitions: BTreeMap<WeekPartition, Vec<usize>> = BTreeMap::new();
        for (index, observation) in cleaned.iter().enumerate() {
            partitions
                .entry(Self::partition_of(observation))
                .or_default()
                .push(index);
        }

        let partitions: Vec<(WeekPartition, Vec<usize>)> = partitions.into_iter().collect();

        let mut indexed: Vec<(usize, DerivedFeatureRow)> = partitions
            .par_iter()
            .flat_map_iter(|(partition, indices)| self.scan_partition(partition, indices, cleaned))
            .collect();

        indexed.sort_by_key(|(index, _)| *index);
        indexed.into_iter().map(|(_, row)| row).collect()
    }

    /// Running precipitation sum over one partition in timestamp order,
    /// inclusive of the current row.
    fn scan_partition(
        &self,
        partition: &WeekPartition,
        indices: &[usize],
        cleaned: &[Observation],
    ) -> Vec<(usize, DerivedFeatureRow)> {
        let mut ordered = indices.to_vec();
        ordered.sort_by_key(|&index| (cleaned[index].last_updated, index));

        let mut running = 0.0;
        ordered
            .into_iter()
            .map(|index| {
                let observation = &cleaned[index];
                running += observation.precip_mm;

                let date = observation.date();
                let row = DerivedFeatureRow {
                    observation: observation.clone(),
                    day_segment: day_segment(observation.hour()),
                    season: season(observation.latitude, date.month(), date.day()),
                    iso_year: partition.iso_year,
                    iso_week: partition.iso_week,
                    weekly_accumulated_rain: round_to(running, self.rain_decimals),
                };
                (index, row)
            })
            .collect()
    }
}

impl Default for FeatureDeriver {
    fn default() -> Self {
        Self::new()
    }
}
