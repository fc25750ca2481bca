//! Wire-level request shapes, as sent by the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{TrackerError, TrackerResult, TrackingService};
use crate::models::{DoseLogEntry, DoseStatus, Medication, MedicationId};

/// Body of a create-medication request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateMedicationRequest {
    pub name: String,
    pub dosage: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body of a log-dose request. `status` and `logged_at` arrive untyped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogDoseRequest {
    pub medication_id: MedicationId,
    pub status: String,
    pub logged_at: String,
}

/// A log-dose request after parsing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoseLogInput {
    pub medication_id: MedicationId,
    pub status: DoseStatus,
    pub logged_at: DateTime<Utc>,
}

impl LogDoseRequest {
    pub fn parse(&self) -> TrackerResult<DoseLogInput> {
        let status = self
            .status
            .parse::<DoseStatus>()
            .map_err(|e| TrackerError::Validation(e.to_string()))?;
        let logged_at = parse_logged_at(&self.logged_at)?;

        Ok(DoseLogInput {
            medication_id: self.medication_id,
            status,
            logged_at,
        })
    }
}

/// Parse an RFC 3339 timestamp with any offset into UTC.
pub fn parse_logged_at(raw: &str) -> TrackerResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            TrackerError::Validation(format!(
                "loggedAt must be an RFC 3339 timestamp, got {:?}: {}",
                raw, e
            ))
        })
}

impl TrackingService {
    pub fn create_from_request(&self, request: &CreateMedicationRequest) -> TrackerResult<Medication> {
        self.create_medication(&request.name, &request.dosage, request.notes.as_deref())
    }

    /// Parse and log. Nothing is stored when parsing fails.
    pub fn log_dose_from_request(&self, request: &LogDoseRequest) -> TrackerResult<DoseLogEntry> {
        let input = request.parse()?;
        self.log_dose(input.medication_id, input.status, input.logged_at)
    }
}
