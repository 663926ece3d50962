use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::ObservationKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OutlierSeverity {
    PotentiallyExtremeEvent, // above the outlier threshold
    LikelyError,             // above the error threshold
}

impl OutlierSeverity {
    pub fn label(&self) -> &'static str {
        match self {
            OutlierSeverity::PotentiallyExtremeEvent => "potentially extreme event",
            OutlierSeverity::LikelyError => "likely error",
        }
    }
}

impl std::fmt::Display for OutlierSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Advisory flag for a snapshot row whose wind speed is implausible.
///
/// Flagged rows are excluded from the cleaned table; the flag itself is kept
/// so the exclusion can be reviewed by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindOutlierFlag {
    /// Position of the flagged row in the snapshot.
    pub row: usize,
    pub key: ObservationKey,
    pub country: String,
    pub last_updated: NaiveDateTime,
    pub wind_kph: f64,
    pub severity: OutlierSeverity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_labels() {
        assert_eq!(
            OutlierSeverity::PotentiallyExtremeEvent.label(),
            "potentially extreme event"
        );
        assert_eq!(OutlierSeverity::LikelyError.to_string(), "likely error");
    }
}
