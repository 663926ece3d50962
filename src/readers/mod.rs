pub mod concurrent_reader;
pub mod observation_reader;
pub mod translation_reader;

pub use concurrent_reader::ConcurrentReader;
pub use observation_reader::{parse_timestamp, ObservationReader, SkippedRow, Snapshot};
pub use translation_reader::TranslationReader;
