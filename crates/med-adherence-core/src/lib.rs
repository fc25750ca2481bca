//! Med-Adherence Core Library
//!
//! Local-first medication tracking: caregivers register medications and log
//! whether each scheduled dose was taken or missed; the core derives a
//! per-day adherence window from the log.
//!
//! # Architecture
//!
//! ```text
//!   Client (mobile / web view)
//!            │  list / create / logDose
//!            ▼
//!   ┌────────────────────┐
//!   │  TrackingService   │── validates, stamps time via Clock
//!   └─────────┬──────────┘
//!             │
//!     ┌───────┴─────────┐
//!     ▼                 ▼
//!  Medication       Dose Log Store ──► Adherence Aggregator
//!    Store          (append-only)      (latest-wins per day)
//! ```
//!
//! # Core Principle
//!
//! **The dose log is append-only.** Logging twice on one day never rewrites
//! history; the later entry simply wins when the window is read.
//!
//! # Modules
//!
//! - [`db`]: SQLite storage for medications and dose logs
//! - [`models`]: Domain types (Medication, DoseLogEntry, DayStatus, etc.)
//! - [`adherence`]: Trailing-window aggregation
//! - [`tracker`]: Tracking service and error taxonomy
//! - [`clock`]: Time source and reference timezone
//! - [`config`]: TOML + environment configuration

pub mod adherence;
pub mod clock;
pub mod config;
pub mod db;
pub mod models;
pub mod tracker;

// Re-export commonly used types
pub use adherence::{adherence_window, DEFAULT_WINDOW_DAYS};
pub use clock::{Clock, FixedClock, ReferenceZone, SystemClock};
pub use config::TrackerConfig;
pub use db::Database;
pub use models::{
    AdherenceReport, AdherenceSummary, DayState, DayStatus, DoseLogEntry, DoseStatus, Medication,
    MedicationOverview,
};
pub use tracker::{
    CreateMedicationRequest, LogDoseRequest, TrackerError, TrackerResult, TrackingService,
};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a tracker database at the given path.
#[uniffi::export]
pub fn open_tracker(path: String) -> Result<Arc<MedTracker>, TrackerError> {
    let config = TrackerConfig {
        database_path: Some(path.into()),
        ..Default::default()
    };
    Ok(Arc::new(MedTracker {
        service: TrackingService::open(&config)?,
    }))
}

/// Open a tracker from a TOML config file (environment overrides apply).
#[uniffi::export]
pub fn open_tracker_with_config(config_path: String) -> Result<Arc<MedTracker>, TrackerError> {
    let config = TrackerConfig::load(&config_path)?;
    Ok(Arc::new(MedTracker {
        service: TrackingService::open(&config)?,
    }))
}

/// Create an in-memory tracker (for testing).
#[uniffi::export]
pub fn open_tracker_in_memory() -> Result<Arc<MedTracker>, TrackerError> {
    Ok(Arc::new(MedTracker {
        service: TrackingService::open(&TrackerConfig::default())?,
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe tracker handle for FFI.
#[derive(uniffi::Object)]
pub struct MedTracker {
    service: TrackingService,
}

impl MedTracker {
    /// Wrap an existing service (custom clock, tests).
    pub fn from_service(service: TrackingService) -> Arc<Self> {
        Arc::new(Self { service })
    }
}

#[uniffi::export]
impl MedTracker {
    // =========================================================================
    // Client Operations
    // =========================================================================

    /// List medications with their last 7 days of adherence.
    pub fn list_medications(&self) -> Result<Vec<FfiMedicationOverview>, TrackerError> {
        let overviews = self.service.list_medications()?;
        Ok(overviews.into_iter().map(|o| o.into()).collect())
    }

    /// Same as `list_medications`, serialized as JSON.
    pub fn list_medications_json(&self) -> Result<String, TrackerError> {
        let overviews = self.service.list_medications()?;
        serde_json::to_string(&overviews).map_err(|e| {
            tracing::error!("Failed to serialize medication list: {}", e);
            TrackerError::Storage
        })
    }

    /// Register a new medication.
    pub fn create_medication(
        &self,
        name: String,
        dosage: String,
        notes: Option<String>,
    ) -> Result<FfiMedication, TrackerError> {
        let medication = self
            .service
            .create_medication(&name, &dosage, notes.as_deref())?;
        Ok(medication.into())
    }

    /// Log a dose. `status` is "taken" or "missed"; `logged_at` is RFC 3339.
    pub fn log_dose(
        &self,
        medication_id: i64,
        status: String,
        logged_at: String,
    ) -> Result<FfiDoseLogEntry, TrackerError> {
        let request = LogDoseRequest {
            medication_id,
            status,
            logged_at,
        };
        let entry = self.service.log_dose_from_request(&request)?;
        Ok(entry.into())
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Get a medication by id.
    pub fn get_medication(&self, medication_id: i64) -> Result<FfiMedication, TrackerError> {
        Ok(self.service.get_medication(medication_id)?.into())
    }

    /// Full dose log for a medication, including superseded entries.
    pub fn dose_history(&self, medication_id: i64) -> Result<Vec<FfiDoseLogEntry>, TrackerError> {
        let entries = self.service.dose_history(medication_id)?;
        Ok(entries.into_iter().map(|e| e.into()).collect())
    }

    /// Adherence over the trailing `days` ending today.
    pub fn adherence(
        &self,
        medication_id: i64,
        days: u32,
    ) -> Result<FfiAdherenceReport, TrackerError> {
        Ok(self.service.adherence(medication_id, days)?.into())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe medication.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedication {
    pub id: i64,
    pub name: String,
    pub dosage: String,
    pub notes: Option<String>,
    /// RFC 3339
    pub created_at: String,
}

impl From<Medication> for FfiMedication {
    fn from(medication: Medication) -> Self {
        Self {
            id: medication.id,
            name: medication.name,
            dosage: medication.dosage,
            notes: medication.notes,
            created_at: medication.created_at.to_rfc3339(),
        }
    }
}

/// FFI-safe day status.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDayStatus {
    pub day_index: u32,
    /// YYYY-MM-DD in the reference timezone
    pub date: String,
    /// "taken", "missed" or "pending"
    pub status: String,
}

impl From<DayStatus> for FfiDayStatus {
    fn from(day: DayStatus) -> Self {
        Self {
            day_index: day.day_index,
            date: day.date.format("%Y-%m-%d").to_string(),
            status: day.status.as_str().to_string(),
        }
    }
}

/// FFI-safe list entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicationOverview {
    pub medication: FfiMedication,
    pub last_7_days: Vec<FfiDayStatus>,
}

impl From<MedicationOverview> for FfiMedicationOverview {
    fn from(overview: MedicationOverview) -> Self {
        Self {
            medication: overview.medication.into(),
            last_7_days: overview.last_7_days.into_iter().map(|d| d.into()).collect(),
        }
    }
}

/// FFI-safe dose log entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoseLogEntry {
    pub id: i64,
    pub medication_id: i64,
    pub status: String,
    pub logged_at: String,
    pub recorded_at: String,
}

impl From<DoseLogEntry> for FfiDoseLogEntry {
    fn from(entry: DoseLogEntry) -> Self {
        Self {
            id: entry.id,
            medication_id: entry.medication_id,
            status: entry.status.as_str().to_string(),
            logged_at: entry.logged_at.to_rfc3339(),
            recorded_at: entry.recorded_at.to_rfc3339(),
        }
    }
}

/// FFI-safe adherence report.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAdherenceReport {
    pub medication_id: i64,
    pub days: Vec<FfiDayStatus>,
    pub taken: u32,
    pub missed: u32,
    pub pending: u32,
    pub adherence_rate: Option<f64>,
}

impl From<AdherenceReport> for FfiAdherenceReport {
    fn from(report: AdherenceReport) -> Self {
        Self {
            medication_id: report.medication_id,
            taken: report.summary.taken,
            missed: report.summary.missed,
            pending: report.summary.pending,
            adherence_rate: report.summary.adherence_rate(),
            days: report.days.into_iter().map(|d| d.into()).collect(),
        }
    }
}
