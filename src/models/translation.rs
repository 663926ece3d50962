use std::collections::HashMap;

/// Raw country strings seen in the reference snapshot and their canonical names.
pub const REFERENCE_TRANSLATIONS: [(&str, &str); 10] = [
    ("Malásia", "Malaysia"),
    ("كولومبيا", "Colombia"),
    ("Гватемала", "Guatemala"),
    ("Польша", "Poland"),
    ("Polônia", "Poland"),
    ("Турция", "Turkey"),
    ("Südkorea", "South Korea"),
    ("Bélgica", "Belgium"),
    ("Turkménistan", "Turkmenistan"),
    ("火鸡", "Turkey"),
];

/// Immutable lookup from raw country strings to canonical Latin-script names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryTranslation {
    entries: HashMap<String, String>,
}

impl CountryTranslation {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(raw, canonical)| (raw.into(), canonical.into()))
                .collect(),
        }
    }

    /// The ten pairs used by the reference dataset.
    pub fn reference() -> Self {
        Self::from_pairs(REFERENCE_TRANSLATIONS)
    }

    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn lookup(&self, raw: &str) -> Option<&str> {
        self.entries.get(raw).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for CountryTranslation {
    fn default() -> Self {
        Self::reference()
    }
}
