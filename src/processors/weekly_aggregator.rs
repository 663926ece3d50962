use crate::config::PipelineConfig;
use crate::models::{AirQuality, Observation, WeekPartition, WeeklyAggregate};
use crate::processors::FeatureDeriver;
use crate::utils::round_to;
use chrono::NaiveDate;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Weekly rollups for locations with enough distinct observation dates.
pub struct WeeklyAggregator {
    min_distinct_dates: usize,
}

impl WeeklyAggregator {
    pub fn new() -> Self {
        Self::from_config(&PipelineConfig::default())
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            min_distinct_dates: config.min_distinct_dates,
        }
    }

    pub fn with_min_distinct_dates(min_distinct_dates: usize) -> Self {
        Self { min_distinct_dates }
    }

    /// (country, location) pairs with strictly more than the minimum number
    /// of distinct dates.
    pub fn eligible_locations<'a>(
        &self,
        cleaned: &'a [Observation],
    ) -> BTreeSet<(&'a str, &'a str)> {
        let mut dates: BTreeMap<(&str, &str), BTreeSet<NaiveDate>> = BTreeMap::new();
        for observation in cleaned {
            dates
                .entry((observation.country.as_str(), observation.location_name.as_str()))
                .or_default()
                .insert(observation.date());
        }

        for ((country, location), distinct) in &dates {
            if distinct.len() <= self.min_distinct_dates {
                debug!(
                    "{} / {} has {} distinct dates; excluded from weekly rollup",
                    location,
                    country,
                    distinct.len()
                );
            }
        }

        dates
            .into_iter()
            .filter(|(_, distinct)| distinct.len() > self.min_distinct_dates)
            .map(|(pair, _)| pair)
            .collect()
    }

    pub fn aggregate(&self, cleaned: &[Observation]) -> Vec<WeeklyAggregate> {
        let eligible = self.eligible_locations(cleaned);

        let mut weeks: BTreeMap<WeekPartition, Vec<&Observation>> = BTreeMap::new();
        for observation in cleaned {
            let pair = (observation.country.as_str(), observation.location_name.as_str());
            if eligible.contains(&pair) {
                weeks
                    .entry(FeatureDeriver::partition_of(observation))
                    .or_default()
                    .push(observation);
            }
        }

        let weeks: Vec<(WeekPartition, Vec<&Observation>)> = weeks.into_iter().collect();
        let aggregates: Vec<WeeklyAggregate> = weeks
            .par_iter()
            .map(|(partition, members)| Self::summarise(partition, members))
            .collect();

        info!(
            "Built {} weekly aggregates for {} eligible locations",
            aggregates.len(),
            eligible.len()
        );

        aggregates
    }

    fn summarise(partition: &WeekPartition, members: &[&Observation]) -> WeeklyAggregate {
        let n = members.len() as f64;

        let mut max_temperature = f64::NEG_INFINITY;
        let mut min_temperature = f64::INFINITY;
        let mut wind = 0.0;
        let mut pressure = 0.0;
        let mut precip = 0.0;
        let mut humidity = 0.0;
        let mut air_quality = [0.0f64; AirQuality::FIELD_COUNT];
        let mut week_start = members[0].date();

        for member in members {
            max_temperature = max_temperature.max(member.temperature_celsius);
            min_temperature = min_temperature.min(member.temperature_celsius);
            wind += member.wind_kph;
            pressure += member.pressure_mb;
            precip += member.precip_mm;
            humidity += member.humidity;
            for (sum, value) in air_quality.iter_mut().zip(member.air_quality.to_array()) {
                *sum += value;
            }
            week_start = week_start.min(member.date());
        }

        WeeklyAggregate {
            country: partition.country.clone(),
            location_name: partition.location_name.clone(),
            iso_year: partition.iso_year,
            iso_week: partition.iso_week,
            week_start,
            observation_count: members.len(),
            max_temperature: max_temperature.round() as i32,
            min_temperature: min_temperature.round() as i32,
            avg_wind_kph: round_to(wind / n, 1),
            avg_pressure_mb: (pressure / n).round() as i32,
            total_precip_mm: round_to(precip, 1),
            avg_humidity: round_to(humidity / n, 1),
            avg_air_quality: AirQuality::from_array(air_quality.map(|sum| round_to(sum / n, 1))),
        }
    }
}

impl Default for WeeklyAggregator {
    fn default() -> Self {
        Self::new()
    }
}
