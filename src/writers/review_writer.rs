use crate::error::Result;
use crate::models::WindOutlierFlag;
use crate::processors::CleaningReport;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// One line of the outlier review sheet.
#[derive(Debug, Serialize)]
struct FlagRow<'a> {
    row: usize,
    location_name: &'a str,
    country: &'a str,
    date: String,
    last_updated: String,
    wind_kph: f64,
    severity: &'static str,
}

impl<'a> From<&'a WindOutlierFlag> for FlagRow<'a> {
    fn from(flag: &'a WindOutlierFlag) -> Self {
        Self {
            row: flag.row,
            location_name: &flag.key.location_name,
            country: &flag.country,
            date: flag.key.date.format("%Y-%m-%d").to_string(),
            last_updated: flag.last_updated.format("%Y-%m-%d %H:%M:%S").to_string(),
            wind_kph: flag.wind_kph,
            severity: flag.severity.label(),
        }
    }
}

/// Writes the artefacts meant for a person rather than a query engine.
pub struct ReviewWriter;

impl ReviewWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_outliers(&self, flags: &[WindOutlierFlag], path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_outliers_to(flags, file)
    }

    pub fn write_outliers_to<W: Write>(&self, flags: &[WindOutlierFlag], writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for flag in flags {
            csv_writer.serialize(FlagRow::from(flag))?;
        }
        csv_writer.flush()?;

        debug!("Wrote {} outlier flags for review", flags.len());
        Ok(())
    }

    pub fn write_report(&self, report: &CleaningReport, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, report)?;
        writer.flush()?;
        Ok(())
    }
}

impl Default for ReviewWriter {
    fn default() -> Self {
        Self::new()
    }
}
