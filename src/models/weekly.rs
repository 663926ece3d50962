use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::AirQuality;

/// Partition key shared by the running rain sum and the weekly rollup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WeekPartition {
    pub country: String,
    pub location_name: String,
    pub iso_year: i32,
    pub iso_week: u32,
}

/// Weekly summary for one well-sampled location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyAggregate {
    pub country: String,
    pub location_name: String,
    pub iso_year: i32,
    pub iso_week: u32,
    /// Earliest observation date in the week.
    pub week_start: NaiveDate,
    pub observation_count: usize,
    pub max_temperature: i32,
    pub min_temperature: i32,
    pub avg_wind_kph: f64,
    pub avg_pressure_mb: i32,
    pub total_precip_mm: f64,
    pub avg_humidity: f64,
    /// Weekly means, each rounded to one decimal.
    pub avg_air_quality: AirQuality,
}
