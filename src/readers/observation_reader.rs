use crate::error::{ProcessingError, Result};
use crate::models::{AirQuality, Observation};
use crate::utils::constants::TIMESTAMP_FORMATS;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// A snapshot row that could not be turned into an [`Observation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub line: usize,
    pub reason: String,
}

impl From<ProcessingError> for SkippedRow {
    fn from(error: ProcessingError) -> Self {
        match error {
            ProcessingError::MalformedRow { line, reason } => SkippedRow { line, reason },
            other => SkippedRow {
                line: 0,
                reason: other.to_string(),
            },
        }
    }
}

/// Rows loaded from the snapshot, plus the rows that were dropped on the way.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub observations: Vec<Observation>,
    pub skipped: Vec<SkippedRow>,
}

impl Snapshot {
    pub fn from_observations(observations: Vec<Observation>) -> Self {
        Self {
            observations,
            skipped: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

// Column names follow the Global Weather Repository CSV export.
#[derive(Debug, Deserialize)]
struct RawRow {
    country: Option<String>,
    location_name: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    last_updated: Option<String>,
    temperature_celsius: Option<f64>,
    wind_kph: Option<f64>,
    pressure_mb: Option<f64>,
    precip_mm: Option<f64>,
    humidity: Option<f64>,
    #[serde(rename = "air_quality_Carbon_Monoxide")]
    carbon_monoxide: Option<f64>,
    #[serde(rename = "air_quality_Ozone")]
    ozone: Option<f64>,
    #[serde(rename = "air_quality_Nitrogen_dioxide")]
    nitrogen_dioxide: Option<f64>,
    #[serde(rename = "air_quality_Sulphur_dioxide")]
    sulphur_dioxide: Option<f64>,
    #[serde(rename = "air_quality_PM2.5")]
    pm2_5: Option<f64>,
    #[serde(rename = "air_quality_PM10")]
    pm10: Option<f64>,
    #[serde(rename = "air_quality_us-epa-index")]
    us_epa_index: Option<f64>,
    #[serde(rename = "air_quality_gb-defra-index")]
    gb_defra_index: Option<f64>,
}

pub struct ObservationReader {
    delimiter: u8,
}

impl ObservationReader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Read the snapshot CSV, skipping malformed rows.
    pub fn read_snapshot(&self, path: &Path) -> Result<Snapshot> {
        let bytes = fs::read(path)?;
        let snapshot = self.read_bytes(&bytes)?;

        info!(
            "Loaded {} observations from {} ({} rows skipped)",
            snapshot.observations.len(),
            path.display(),
            snapshot.skipped.len()
        );

        Ok(snapshot)
    }

    pub fn read_from_reader<R: Read>(&self, mut reader: R) -> Result<Snapshot> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        self.read_bytes(&bytes)
    }

    fn read_bytes(&self, bytes: &[u8]) -> Result<Snapshot> {
        let text = decode_text(bytes);

        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(text.as_bytes());

        let headers = csv_reader.headers()?.clone();
        let mut snapshot = Snapshot::default();

        for result in csv_reader.records() {
            let parsed = result.map_err(|e| malformed_from_csv(&e)).and_then(|record| {
                let line = record.position().map_or(0, |p| p.line() as usize);
                let row: RawRow = record
                    .deserialize(Some(&headers))
                    .map_err(|e| malformed(line, e.to_string()))?;
                self.convert_row(row, line)
            });

            match parsed {
                Ok(observation) => snapshot.observations.push(observation),
                Err(error) => {
                    let skipped = SkippedRow::from(error);
                    warn!("Skipping row at line {}: {}", skipped.line, skipped.reason);
                    snapshot.skipped.push(skipped);
                }
            }
        }

        debug!(
            "Parsed {} rows, skipped {}",
            snapshot.observations.len(),
            snapshot.skipped.len()
        );

        Ok(snapshot)
    }

    fn convert_row(&self, row: RawRow, line: usize) -> Result<Observation> {
        let location_name = required(row.location_name, "location_name", line)?;
        if location_name.is_empty() {
            return Err(malformed(line, "location_name is blank".to_string()));
        }

        let raw_timestamp = required(row.last_updated, "last_updated", line)?;
        let last_updated = parse_timestamp(&raw_timestamp)
            .ok_or_else(|| malformed(line, format!("unparseable timestamp '{}'", raw_timestamp)))?;

        let air_quality = AirQuality {
            carbon_monoxide: measurement(row.carbon_monoxide, "air_quality_Carbon_Monoxide", line)?,
            ozone: measurement(row.ozone, "air_quality_Ozone", line)?,
            nitrogen_dioxide: measurement(row.nitrogen_dioxide, "air_quality_Nitrogen_dioxide", line)?,
            sulphur_dioxide: measurement(row.sulphur_dioxide, "air_quality_Sulphur_dioxide", line)?,
            pm2_5: measurement(row.pm2_5, "air_quality_PM2.5", line)?,
            pm10: measurement(row.pm10, "air_quality_PM10", line)?,
            us_epa_index: measurement(row.us_epa_index, "air_quality_us-epa-index", line)?,
            gb_defra_index: measurement(row.gb_defra_index, "air_quality_gb-defra-index", line)?,
        };

        Observation::builder()
            .country(required(row.country, "country", line)?)
            .location_name(location_name)
            .coordinates(
                measurement(row.latitude, "latitude", line)?,
                measurement(row.longitude, "longitude", line)?,
            )
            .last_updated(last_updated)
            .temperature_celsius(measurement(row.temperature_celsius, "temperature_celsius", line)?)
            .wind_kph(measurement(row.wind_kph, "wind_kph", line)?)
            .pressure_mb(measurement(row.pressure_mb, "pressure_mb", line)?)
            .precip_mm(measurement(row.precip_mm, "precip_mm", line)?)
            .humidity(measurement(row.humidity, "humidity", line)?)
            .air_quality(air_quality)
            .build()
            .map_err(|e| malformed(line, e.to_string()))
    }
}

impl Default for ObservationReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `last_updated` in any of the accepted layouts.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// Decode snapshot bytes, honouring a UTF-8 or UTF-16 byte order mark.
fn decode_text(bytes: &[u8]) -> String {
    let (encoding, bom_length) =
        encoding_rs::Encoding::for_bom(bytes).unwrap_or((encoding_rs::UTF_8, 0));
    let (text, had_errors) = encoding.decode_without_bom_handling(&bytes[bom_length..]);

    if had_errors {
        warn!(
            "Snapshot contains invalid {} sequences; replaced with U+FFFD",
            encoding.name()
        );
    }

    text.into_owned()
}

fn required<T>(value: Option<T>, field: &str, line: usize) -> Result<T> {
    value.ok_or_else(|| malformed(line, format!("missing required field '{}'", field)))
}

/// A required numeric field that must also be finite.
fn measurement(value: Option<f64>, field: &str, line: usize) -> Result<f64> {
    let value = required(value, field, line)?;
    if !value.is_finite() {
        return Err(malformed(
            line,
            format!("non-finite value {} in field '{}'", value, field),
        ));
    }
    Ok(value)
}

fn malformed(line: usize, reason: String) -> ProcessingError {
    ProcessingError::MalformedRow { line, reason }
}

fn malformed_from_csv(error: &csv::Error) -> ProcessingError {
    let line = error.position().map_or(0, |p| p.line() as usize);
    malformed(line, error.to_string())
}
