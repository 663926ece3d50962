pub mod parquet_writer;
pub mod review_writer;

pub use parquet_writer::{ParquetFileInfo, ParquetWriter};
pub use review_writer::ReviewWriter;
