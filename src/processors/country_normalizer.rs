use crate::models::{CountryTranslation, Observation};
use std::collections::BTreeSet;

/// Best-effort substitution of raw country strings through a fixed table.
pub struct CountryNormalizer<'a> {
    translations: &'a CountryTranslation,
}

impl<'a> CountryNormalizer<'a> {
    pub fn new(translations: &'a CountryTranslation) -> Self {
        Self { translations }
    }

    /// Canonical name if the table has one, otherwise the input unchanged.
    pub fn normalize(&self, country: &str) -> String {
        self.translations
            .lookup(country)
            .unwrap_or(country)
            .to_string()
    }

    pub fn normalize_observation(&self, mut observation: Observation) -> Observation {
        if let Some(canonical) = self.translations.lookup(&observation.country) {
            observation.country = canonical.to_string();
        }
        observation
    }

    /// Country strings outside ASCII that have no translation. These pass
    /// through unchanged and are only reported.
    pub fn unmapped_non_latin<'o, I>(&self, observations: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'o Observation>,
    {
        observations
            .into_iter()
            .map(|o| o.country.as_str())
            .filter(|c| !c.is_ascii() && self.translations.lookup(c).is_none())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}
