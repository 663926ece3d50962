use chrono::{NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{ProcessingError, Result};

/// The eight air-quality readings carried by every observation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AirQuality {
    pub carbon_monoxide: f64,
    pub ozone: f64,
    pub nitrogen_dioxide: f64,
    pub sulphur_dioxide: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    pub us_epa_index: f64,
    pub gb_defra_index: f64,
}

impl AirQuality {
    pub const FIELD_COUNT: usize = 8;

    pub fn to_array(&self) -> [f64; Self::FIELD_COUNT] {
        [
            self.carbon_monoxide,
            self.ozone,
            self.nitrogen_dioxide,
            self.sulphur_dioxide,
            self.pm2_5,
            self.pm10,
            self.us_epa_index,
            self.gb_defra_index,
        ]
    }

    pub fn from_array(values: [f64; Self::FIELD_COUNT]) -> Self {
        Self {
            carbon_monoxide: values[0],
            ozone: values[1],
            nitrogen_dioxide: values[2],
            sulphur_dioxide: values[3],
            pm2_5: values[4],
            pm10: values[5],
            us_epa_index: values[6],
            gb_defra_index: values[7],
        }
    }
}

/// Grouping key for duplicate detection: one location on one calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObservationKey {
    pub location_name: String,
    pub date: NaiveDate,
}

impl ObservationKey {
    pub fn new(location_name: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            location_name: location_name.into(),
            date,
        }
    }
}

impl std::fmt::Display for ObservationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} on {}", self.location_name, self.date)
    }
}

/// A single weather and air-quality reading for one location.
///
/// The same shape is used for raw snapshot rows and for rows of the cleaned
/// table; the cleaned table only differs in the guarantees it carries (at most
/// one row per [`ObservationKey`], no wind outliers, normalised country).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Observation {
    pub country: String,

    #[validate(length(min = 1))]
    pub location_name: String,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    pub last_updated: NaiveDateTime,

    pub temperature_celsius: f64,
    pub wind_kph: f64,
    pub pressure_mb: f64,
    pub precip_mm: f64,
    pub humidity: f64,

    pub air_quality: AirQuality,
}

impl Observation {
    /// Number of numeric measurement fields averaged when collapsing duplicates
    /// (coordinates included).
    pub const NUMERIC_FIELD_COUNT: usize = 7 + AirQuality::FIELD_COUNT;

    pub fn builder() -> ObservationBuilder {
        ObservationBuilder::new()
    }

    pub fn date(&self) -> NaiveDate {
        self.last_updated.date()
    }

    pub fn key(&self) -> ObservationKey {
        ObservationKey::new(self.location_name.clone(), self.date())
    }

    pub fn hour(&self) -> u32 {
        self.last_updated.hour()
    }

    pub fn seconds_since_midnight(&self) -> u32 {
        self.last_updated.num_seconds_from_midnight()
    }

    /// Numeric fields in a fixed order, used by the duplicate averager.
    pub fn numeric_fields(&self) -> [f64; Self::NUMERIC_FIELD_COUNT] {
        let aq = self.air_quality.to_array();
        [
            self.latitude,
            self.longitude,
            self.temperature_celsius,
            self.wind_kph,
            self.pressure_mb,
            self.precip_mm,
            self.humidity,
            aq[0],
            aq[1],
            aq[2],
            aq[3],
            aq[4],
            aq[5],
            aq[6],
            aq[7],
        ]
    }

    /// Rebuild an observation from identity fields and values laid out as in
    /// [`Observation::numeric_fields`].
    pub fn from_numeric_fields(
        country: String,
        location_name: String,
        last_updated: NaiveDateTime,
        values: [f64; Self::NUMERIC_FIELD_COUNT],
    ) -> Self {
        let mut aq = [0.0; AirQuality::FIELD_COUNT];
        aq.copy_from_slice(&values[7..]);

        Self {
            country,
            location_name,
            latitude: values[0],
            longitude: values[1],
            last_updated,
            temperature_celsius: values[2],
            wind_kph: values[3],
            pressure_mb: values[4],
            precip_mm: values[5],
            humidity: values[6],
            air_quality: AirQuality::from_array(aq),
        }
    }
}

#[derive(Default)]
pub struct ObservationBuilder {
    country: Option<String>,
    location_name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    last_updated: Option<NaiveDateTime>,
    temperature_celsius: Option<f64>,
    wind_kph: Option<f64>,
    pressure_mb: Option<f64>,
    precip_mm: Option<f64>,
    humidity: Option<f64>,
    air_quality: AirQuality,
}

impl ObservationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn location_name(mut self, name: impl Into<String>) -> Self {
        self.location_name = Some(name.into());
        self
    }

    pub fn coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    pub fn last_updated(mut self, timestamp: NaiveDateTime) -> Self {
        self.last_updated = Some(timestamp);
        self
    }

    pub fn temperature_celsius(mut self, temp: f64) -> Self {
        self.temperature_celsius = Some(temp);
        self
    }

    pub fn wind_kph(mut self, wind: f64) -> Self {
        self.wind_kph = Some(wind);
        self
    }

    pub fn pressure_mb(mut self, pressure: f64) -> Self {
        self.pressure_mb = Some(pressure);
        self
    }

    pub fn precip_mm(mut self, precip: f64) -> Self {
        self.precip_mm = Some(precip);
        self
    }

    pub fn humidity(mut self, humidity: f64) -> Self {
        self.humidity = Some(humidity);
        self
    }

    pub fn air_quality(mut self, air_quality: AirQuality) -> Self {
        self.air_quality = air_quality;
        self
    }

    pub fn build(self) -> Result<Observation> {
        let observation = Observation {
            country: self
                .country
                .ok_or_else(|| missing("country"))?,
            location_name: self
                .location_name
                .ok_or_else(|| missing("location_name"))?,
            latitude: self.latitude.ok_or_else(|| missing("latitude"))?,
            longitude: self.longitude.ok_or_else(|| missing("longitude"))?,
            last_updated: self.last_updated.ok_or_else(|| missing("last_updated"))?,
            temperature_celsius: self
                .temperature_celsius
                .ok_or_else(|| missing("temperature_celsius"))?,
            wind_kph: self.wind_kph.ok_or_else(|| missing("wind_kph"))?,
            pressure_mb: self.pressure_mb.ok_or_else(|| missing("pressure_mb"))?,
            precip_mm: self.precip_mm.ok_or_else(|| missing("precip_mm"))?,
            humidity: self.humidity.ok_or_else(|| missing("humidity"))?,
            air_quality: self.air_quality,
        };

        if !observation.numeric_fields().iter().all(|v| v.is_finite()) {
            return Err(ProcessingError::InvalidFormat(format!(
                "non-finite measurement for {}",
                observation.key()
            )));
        }

        observation.validate()?;
        Ok(observation)
    }
}

fn missing(field: &str) -> ProcessingError {
    ProcessingError::InvalidFormat(format!("missing required field: {}", field))
}


#[cfg(test)]
mod tests {
    use super::*;

    fn timestamp(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    fn sample() -> Observation {
        Observation::builder()
            .country("Poland")
            .location_name("Warsaw")
            .coordinates(52.25, 21.0)
            .last_updated(timestamp("2024-05-16 13:15"))
            .temperature_celsius(18.0)
            .wind_kph(12.2)
            .pressure_mb(1016.0)
            .precip_mm(0.1)
            .humidity(55.0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_key_uses_calendar_date() {
        let obs = sample();
        assert_eq!(
            obs.key(),
            ObservationKey::new("Warsaw", NaiveDate::from_ymd_opt(2024, 5, 16).unwrap())
        );
        assert_eq!(obs.hour(), 13);
        assert_eq!(obs.seconds_since_midnight(), 13 * 3600 + 15 * 60);
    }

    #[test]
    fn test_numeric_fields_roundtrip_preserves_identity() {
        let obs = sample();
        let rebuilt = Observation::from_numeric_fields(
            obs.country.clone(),
            obs.location_name.clone(),
            obs.last_updated,
            obs.numeric_fields(),
        );
        assert_eq!(rebuilt, obs);
    }

    #[test]
    fn test_builder_rejects_invalid_latitude() {
        let result = Observation::builder()
            .country("Nowhere")
            .location_name("Pole")
            .coordinates(91.0, 0.0)
            .last_updated(timestamp("2024-05-16 13:15"))
            .temperature_celsius(0.0)
            .wind_kph(0.0)
            .pressure_mb(1000.0)
            .precip_mm(0.0)
            .humidity(50.0)
            .build();

        assert!(matches!(result, Err(ProcessingError::Validation(_))));
    }

    #[test]
    fn test_builder_rejects_nan_latitude() {
        let result = Observation::builder()
            .country("Peru")
            .location_name("Cusco")
            .coordinates(f64::NAN, -71.97)
            .last_updated(timestamp("2024-05-16 13:15"))
            .temperature_celsius(12.0)
            .wind_kph(9.0)
            .pressure_mb(1014.0)
            .precip_mm(0.0)
            .humidity(70.0)
            .build();

        assert!(matches!(result, Err(ProcessingError::InvalidFormat(_))));
    }

    #[test]
    fn test_builder_requires_fields() {
        let result = Observation::builder().country("Poland").build();
        assert!(matches!(result, Err(ProcessingError::InvalidFormat(_))));
    }
}
