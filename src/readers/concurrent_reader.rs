use crate::error::Result;
use crate::models::CountryTranslation;
use crate::readers::{ObservationReader, Snapshot, TranslationReader};
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;

/// Loads the snapshot and the translation table side by side.
pub struct ConcurrentReader;

impl ConcurrentReader {
    pub fn new() -> Self {
        Self
    }

    /// Read both inputs on blocking worker threads. Without a translation
    /// file the built-in reference table is used.
    pub async fn load_inputs(
        &self,
        snapshot_path: &Path,
        translations_path: Option<&Path>,
    ) -> Result<(Snapshot, CountryTranslation)> {
        let snapshot_path: PathBuf = snapshot_path.to_path_buf();
        let translations_path: Option<PathBuf> = translations_path.map(Path::to_path_buf);

        let snapshot_handle: JoinHandle<Result<Snapshot>> =
            tokio::task::spawn_blocking(move || {
                ObservationReader::new().read_snapshot(&snapshot_path)
            });

        let translation_handle: JoinHandle<Result<CountryTranslation>> =
            tokio::task::spawn_blocking(move || match translations_path {
                Some(path) => TranslationReader::new().read_translations(&path),
                None => Ok(CountryTranslation::reference()),
            });

        let (snapshot, translations) = tokio::try_join!(snapshot_handle, translation_handle)?;

        Ok((snapshot?, translations?))
    }
}

impl Default for ConcurrentReader {
    fn default() -> Self {
        Self::new()
    }
}
