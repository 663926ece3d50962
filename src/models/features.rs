use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::Observation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DaySegment {
    Midnight, // 00-05
    Dawn,     // 06-11
    Noon,     // 12-17
    Dusk,     // 18-23
}

impl DaySegment {
    pub fn display_name(&self) -> &'static str {
        match self {
            DaySegment::Midnight => "Midnight",
            DaySegment::Dawn => "Dawn",
            DaySegment::Noon => "Noon",
            DaySegment::Dusk => "Dusk",
        }
    }
}

impl std::fmt::Display for DaySegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    pub fn display_name(&self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
        }
    }

    /// The season occurring at the same time in the other hemisphere.
    pub fn opposite(&self) -> Self {
        match self {
            Season::Winter => Season::Summer,
            Season::Spring => Season::Fall,
            Season::Summer => Season::Winter,
            Season::Fall => Season::Spring,
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Classify an hour of the day (0-23) into a six-hour segment.
pub fn day_segment(hour: u32) -> DaySegment {
    match hour {
        0..=5 => DaySegment::Midnight,
        6..=11 => DaySegment::Dawn,
        12..=17 => DaySegment::Noon,
        _ => DaySegment::Dusk,
    }
}

/// Astronomical season with fixed boundaries on the 21st of March, June,
/// September and December. Latitudes below zero get the opposite season.
pub fn season(latitude: f64, month: u32, day: u32) -> Season {
    let month_day = month * 100 + day;

    let northern = match month_day {
        321..=620 => Season::Spring,
        621..=920 => Season::Summer,
        921..=1220 => Season::Fall,
        _ => Season::Winter,
    };

    if latitude < 0.0 {
        northern.opposite()
    } else {
        northern
    }
}

/// A cleaned observation with its derived classification and rainfall features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedFeatureRow {
    pub observation: Observation,
    pub day_segment: DaySegment,
    pub season: Season,
    pub iso_year: i32,
    pub iso_week: u32,
    pub weekly_accumulated_rain: f64,
}

impl DerivedFeatureRow {
    pub fn date(&self) -> NaiveDate {
        self.observation.date()
    }
}

/// ISO year and week for a date.
pub fn iso_year_week(date: NaiveDate) -> (i32, u32) {
    let week = date.iso_week();
    (week.year(), week.week())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_segment_boundaries() {
        assert_eq!(day_segment(0), DaySegment::Midnight);
        assert_eq!(day_segment(5), DaySegment::Midnight);
        assert_eq!(day_segment(6), DaySegment::Dawn);
        assert_eq!(day_segment(11), DaySegment::Dawn);
        assert_eq!(day_segment(12), DaySegment::Noon);
        assert_eq!(day_segment(17), DaySegment::Noon);
        assert_eq!(day_segment(18), DaySegment::Dusk);
        assert_eq!(day_segment(23), DaySegment::Dusk);
    }

    #[test]
    fn test_season_march_equinox() {
        assert_eq!(season(45.0, 3, 20), Season::Winter);
        assert_eq!(season(45.0, 3, 21), Season::Spring);
        assert_eq!(season(-45.0, 3, 21), Season::Fall);
        assert_eq!(season(-45.0, 3, 20), Season::Summer);
    }

    #[test]
    fn test_season_northern_windows() {
        assert_eq!(season(10.0, 6, 20), Season::Spring);
        assert_eq!(season(10.0, 6, 21), Season::Summer);
        assert_eq!(season(10.0, 9, 20), Season::Summer);
        assert_eq!(season(10.0, 9, 21), Season::Fall);
        assert_eq!(season(10.0, 12, 20), Season::Fall);
        assert_eq!(season(10.0, 12, 21), Season::Winter);
        assert_eq!(season(10.0, 1, 1), Season::Winter);
    }

    #[test]
    fn test_equator_counts_as_northern() {
        assert_eq!(season(0.0, 7, 1), Season::Summer);
        assert_eq!(season(-0.1, 7, 1), Season::Winter);
    }

    #[test]
    fn test_iso_week_crosses_year() {
        // 2024-12-30 is Monday of ISO week 1 of 2025
        let date = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert_eq!(iso_year_week(date), (2025, 1));
    }
}
