//! Dose log models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MedicationId;

/// Store-assigned dose log identifier. Later inserts get larger ids.
pub type DoseLogId = i64;

/// What the caregiver asserts happened to a scheduled dose.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DoseStatus {
    Taken,
    Missed,
}

impl DoseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DoseStatus::Taken => "taken",
            DoseStatus::Missed => "missed",
        }
    }
}

impl fmt::Display for DoseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a status string other than `taken` / `missed`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown dose status: {0:?} (expected \"taken\" or \"missed\")")]
pub struct UnknownDoseStatus(pub String);

impl FromStr for DoseStatus {
    type Err = UnknownDoseStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "taken" => Ok(DoseStatus::Taken),
            "missed" => Ok(DoseStatus::Missed),
            other => Err(UnknownDoseStatus(other.to_string())),
        }
    }
}

/// One append-only dose log record.
///
/// Entries are never mutated. When several exist for the same medication and
/// calendar day, only the latest determines that day's status; the rest stay
/// for audit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DoseLogEntry {
    pub id: DoseLogId,
    pub medication_id: MedicationId,
    pub status: DoseStatus,
    /// When the dose event is asserted to have happened (caller-supplied)
    pub logged_at: DateTime<Utc>,
    /// When the service received the log
    pub recorded_at: DateTime<Utc>,
}

impl DoseLogEntry {
    /// Ordering key for latest-wins: `logged_at`, ties broken by insertion order.
    pub fn recency_key(&self) -> (DateTime<Utc>, DoseLogId) {
        (self.logged_at, self.id)
    }
}
