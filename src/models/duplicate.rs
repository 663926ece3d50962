use serde::{Deserialize, Serialize};

use crate::models::{Observation, ObservationKey};

/// One representative row standing in for a group of same-day readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AveragedObservation {
    pub key: ObservationKey,
    pub observation: Observation,
    /// Number of snapshot rows collapsed into this one.
    pub source_rows: usize,
}

/// Output of duplicate resolution: keys to drop and rows to put back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DuplicateResolution {
    pub keys: Vec<ObservationKey>,
    pub averaged: Vec<AveragedObservation>,
}

impl DuplicateResolution {
    pub fn group_count(&self) -> usize {
        self.keys.len()
    }

    pub fn collapsed_rows(&self) -> usize {
        self.averaged.iter().map(|a| a.source_rows).sum()
    }
}
