use crate::error::{ProcessingError, Result};
use crate::models::{DerivedFeatureRow, Observation, WeeklyAggregate};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_CHUNK_SIZE, DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Days from 0001-01-01 to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

const AIR_QUALITY_COLUMNS: [&str; 8] = [
    "air_quality_carbon_monoxide",
    "air_quality_ozone",
    "air_quality_nitrogen_dioxide",
    "air_quality_sulphur_dioxide",
    "air_quality_pm2_5",
    "air_quality_pm10",
    "air_quality_us_epa_index",
    "air_quality_gb_defra_index",
];

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
    batch_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
            batch_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::InvalidConfig(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Write the cleaned observation table.
    pub fn write_cleaned(&self, observations: &[Observation], path: &Path) -> Result<()> {
        let schema = Arc::new(Schema::new(observation_fields()));
        self.write_in_batches(observations, path, schema, |chunk, schema| {
            let columns = observation_columns(chunk.iter());
            Ok(RecordBatch::try_new(schema, columns)?)
        })
    }

    /// Write cleaned observations with their derived features.
    pub fn write_features(&self, rows: &[DerivedFeatureRow], path: &Path) -> Result<()> {
        let mut fields = observation_fields();
        fields.extend([
            Field::new("day_segment", DataType::Utf8, false),
            Field::new("season", DataType::Utf8, false),
            Field::new("iso_year", DataType::Int32, false),
            Field::new("iso_week", DataType::UInt32, false),
            Field::new("weekly_accumulated_rain", DataType::Float64, false),
        ]);
        let schema = Arc::new(Schema::new(fields));

        self.write_in_batches(rows, path, schema, |chunk, schema| {
            let mut columns = observation_columns(chunk.iter().map(|r| &r.observation));
            columns.push(Arc::new(StringArray::from_iter_values(
                chunk.iter().map(|r| r.day_segment.display_name()),
            )));
            columns.push(Arc::new(StringArray::from_iter_values(
                chunk.iter().map(|r| r.season.display_name()),
            )));
            columns.push(Arc::new(Int32Array::from_iter_values(
                chunk.iter().map(|r| r.iso_year),
            )));
            columns.push(Arc::new(UInt32Array::from_iter_values(
                chunk.iter().map(|r| r.iso_week),
            )));
            columns.push(Arc::new(Float64Array::from_iter_values(
                chunk.iter().map(|r| r.weekly_accumulated_rain),
            )));
            Ok(RecordBatch::try_new(schema, columns)?)
        })
    }

    /// Write the weekly rollup table.
    pub fn write_weekly(&self, aggregates: &[WeeklyAggregate], path: &Path) -> Result<()> {
        let mut fields = vec![
            Field::new("country", DataType::Utf8, false),
            Field::new("location_name", DataType::Utf8, false),
            Field::new("iso_year", DataType::Int32, false),
            Field::new("iso_week", DataType::UInt32, false),
            Field::new("week_start", DataType::Date32, false),
            Field::new("observation_count", DataType::UInt64, false),
            Field::new("max_temperature", DataType::Int32, false),
            Field::new("min_temperature", DataType::Int32, false),
            Field::new("avg_wind_kph", DataType::Float64, false),
            Field::new("avg_pressure_mb", DataType::Int32, false),
            Field::new("total_precip_mm", DataType::Float64, false),
            Field::new("avg_humidity", DataType::Float64, false),
        ];
        fields.extend(
            AIR_QUALITY_COLUMNS
                .iter()
                .map(|name| Field::new(format!("avg_{}", name), DataType::Float64, false)),
        );
        let schema = Arc::new(Schema::new(fields));

        self.write_in_batches(aggregates, path, schema, |chunk, schema| {
            let mut columns: Vec<ArrayRef> = vec![
                Arc::new(StringArray::from_iter_values(chunk.iter().map(|a| a.country.as_str()))),
                Arc::new(StringArray::from_iter_values(
                    chunk.iter().map(|a| a.location_name.as_str()),
                )),
                Arc::new(Int32Array::from_iter_values(chunk.iter().map(|a| a.iso_year))),
                Arc::new(UInt32Array::from_iter_values(chunk.iter().map(|a| a.iso_week))),
                Arc::new(Date32Array::from_iter_values(
                    chunk.iter().map(|a| days_since_epoch(a.week_start)),
                )),
                Arc::new(UInt64Array::from_iter_values(
                    chunk.iter().map(|a| a.observation_count as u64),
                )),
                Arc::new(Int32Array::from_iter_values(chunk.iter().map(|a| a.max_temperature))),
                Arc::new(Int32Array::from_iter_values(chunk.iter().map(|a| a.min_temperature))),
                Arc::new(Float64Array::from_iter_values(chunk.iter().map(|a| a.avg_wind_kph))),
                Arc::new(Int32Array::from_iter_values(chunk.iter().map(|a| a.avg_pressure_mb))),
                Arc::new(Float64Array::from_iter_values(
                    chunk.iter().map(|a| a.total_precip_mm),
                )),
                Arc::new(Float64Array::from_iter_values(chunk.iter().map(|a| a.avg_humidity))),
            ];
            for i in 0..AIR_QUALITY_COLUMNS.len() {
                columns.push(Arc::new(Float64Array::from_iter_values(
                    chunk.iter().map(|a| a.avg_air_quality.to_array()[i]),
                )));
            }
            Ok(RecordBatch::try_new(schema, columns)?)
        })
    }

    /// Write rows in chunks so large tables do not need one giant batch.
    fn write_in_batches<T, F>(
        &self,
        rows: &[T],
        path: &Path,
        schema: Arc<Schema>,
        to_batch: F,
    ) -> Result<()>
    where
        F: Fn(&[T], Arc<Schema>) -> Result<RecordBatch>,
    {
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        for chunk in rows.chunks(self.batch_size) {
            let batch = to_batch(chunk, schema.clone())?;
            writer.write(&batch)?;
        }

        writer.close()?;
        Ok(())
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let file_metadata = metadata.file_metadata();
        let row_groups = metadata.num_row_groups();
        let total_rows = file_metadata.num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let columns = file_metadata
            .schema_descr()
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut row_group_sizes = Vec::new();
        let mut compression = None;
        for i in 0..row_groups {
            let rg_metadata = metadata.row_group(i);
            row_group_sizes.push(rg_metadata.num_rows());
            if compression.is_none() && rg_metadata.num_columns() > 0 {
                compression = Some(rg_metadata.column(0).compression());
            }
        }

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression: compression.unwrap_or(self.compression),
            columns,
        })
    }
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

fn observation_fields() -> Vec<Field> {
    let mut fields = vec![
        Field::new("country", DataType::Utf8, false),
        Field::new("location_name", DataType::Utf8, false),
        Field::new("latitude", DataType::Float64, false),
        Field::new("longitude", DataType::Float64, false),
        Field::new(
            "last_updated",
            DataType::Timestamp(TimeUnit::Second, None),
            false,
        ),
        Field::new("temperature_celsius", DataType::Float64, false),
        Field::new("wind_kph", DataType::Float64, false),
        Field::new("pressure_mb", DataType::Float64, false),
        Field::new("precip_mm", DataType::Float64, false),
        Field::new("humidity", DataType::Float64, false),
    ];
    fields.extend(
        AIR_QUALITY_COLUMNS
            .iter()
            .map(|name| Field::new(*name, DataType::Float64, false)),
    );
    fields
}

fn observation_columns<'a, I>(observations: I) -> Vec<ArrayRef>
where
    I: Iterator<Item = &'a Observation> + Clone,
{
    let float_column = |f: fn(&Observation) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from_iter_values(observations.clone().map(f)))
    };

    let mut columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            observations.clone().map(|o| o.country.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            observations.clone().map(|o| o.location_name.as_str()),
        )),
        float_column(|o| o.latitude),
        float_column(|o| o.longitude),
        Arc::new(TimestampSecondArray::from_iter_values(
            observations.clone().map(|o| o.last_updated.and_utc().timestamp()),
        )),
        float_column(|o| o.temperature_celsius),
        float_column(|o| o.wind_kph),
        float_column(|o| o.pressure_mb),
        float_column(|o| o.precip_mm),
        float_column(|o| o.humidity),
    ];

    for i in 0..AIR_QUALITY_COLUMNS.len() {
        columns.push(Arc::new(Float64Array::from_iter_values(
            observations.clone().map(|o| o.air_quality.to_array()[i]),
        )));
    }

    columns
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
    pub columns: Vec<String>,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}\n\
            - Columns: {}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0, // Convert to MB
            self.compression,
            self.total_rows as f64 / self.row_groups.max(1) as f64,
            self.columns.join(", ")
        )
    }
}
