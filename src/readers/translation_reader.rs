use crate::error::{ProcessingError, Result};
use crate::models::CountryTranslation;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::info;

#[derive(Debug, Deserialize)]
struct TranslationRow {
    raw: String,
    canonical: String,
}

/// Reads a `raw,canonical` CSV into a [`CountryTranslation`].
pub struct TranslationReader;

impl TranslationReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read_translations(&self, path: &Path) -> Result<CountryTranslation> {
        let file = std::fs::File::open(path)?;
        let table = self.read_from_reader(file)?;
        info!(
            "Loaded {} country translations from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn read_from_reader<R: Read>(&self, reader: R) -> Result<CountryTranslation> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries: HashMap<String, String> = HashMap::new();

        for result in csv_reader.deserialize::<TranslationRow>() {
            let row = result?;
            if row.raw.is_empty() {
                continue;
            }

            if let Some(existing) = entries.get(&row.raw) {
                if existing != &row.canonical {
                    return Err(ProcessingError::InvalidFormat(format!(
                        "Conflicting translations for '{}': '{}' and '{}'",
                        row.raw, existing, row.canonical
                    )));
                }
                continue;
            }

            entries.insert(row.raw, row.canonical);
        }

        Ok(CountryTranslation::from_pairs(entries))
    }
}

impl Default for TranslationReader {
    fn default() -> Self {
        Self::new()
    }
}
