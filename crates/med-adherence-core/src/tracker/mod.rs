//! Tracking service: the request/response boundary the client talks to.
//!
//! Writes are single inserts into the append-only stores. Same-day
//! supersession is resolved on read by the adherence aggregator, so
//! concurrent `log_dose` calls never conflict; the store mutex is the only
//! point of mutual exclusion and it serializes id assignment.

mod requests;

pub use requests::*;

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use thiserror::Error;

use crate::adherence::{adherence_window, window_bounds, DEFAULT_WINDOW_DAYS, MAX_WINDOW_DAYS};
use crate::clock::{Clock, ReferenceZone, SystemClock};
use crate::config::{ConfigError, TrackerConfig};
use crate::db::{Database, DbError};
use crate::models::{
    AdherenceReport, AdherenceSummary, DayStatus, DoseLogEntry, DoseStatus, Medication,
    MedicationId, MedicationOverview,
};

/// Errors surfaced to callers of the tracking service.
#[derive(Debug, Error, uniffi::Error)]
pub enum TrackerError {
    /// Malformed or missing input; safe to show to the user
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Persistence failure; details are logged, not returned
    #[error("Storage failure")]
    Storage,

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type TrackerResult<T> = Result<T, TrackerError>;

impl From<DbError> for TrackerError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::Validation(msg) => TrackerError::Validation(msg),
            DbError::NotFound(msg) => TrackerError::NotFound(msg),
            other => {
                tracing::error!(error = %other, "storage operation failed");
                TrackerError::Storage
            }
        }
    }
}

impl From<ConfigError> for TrackerError {
    fn from(e: ConfigError) -> Self {
        TrackerError::Config(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for TrackerError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        tracing::error!("Lock poisoned: {}", e);
        TrackerError::Storage
    }
}

/// Years a `loggedAt` may fall in; the store keeps four-digit years only.
const LOGGED_AT_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Medication tracking core.
pub struct TrackingService {
    db: Mutex<Database>,
    clock: Arc<dyn Clock>,
    zone: ReferenceZone,
    max_future_skew: Option<Duration>,
}

impl TrackingService {
    /// Build a service over an opened database.
    pub fn new(db: Database, clock: Arc<dyn Clock>, config: &TrackerConfig) -> TrackerResult<Self> {
        config.validate()?;
        Ok(Self {
            db: Mutex::new(db),
            clock,
            zone: config.reference_zone(),
            max_future_skew: config.max_future_skew(),
        })
    }

    /// Open the configured database (in-memory when no path is set) on the wall clock.
    pub fn open(config: &TrackerConfig) -> TrackerResult<Self> {
        let db = match &config.database_path {
            Some(path) => Database::open(path)?,
            None => Database::open_in_memory()?,
        };
        tracing::info!(
            path = ?config.database_path,
            utc_offset_minutes = config.utc_offset_minutes,
            "Opened medication tracker"
        );
        Self::new(db, Arc::new(SystemClock), config)
    }

    fn db(&self) -> TrackerResult<MutexGuard<'_, Database>> {
        Ok(self.db.lock()?)
    }

    /// Current calendar day in the reference zone.
    pub fn today(&self) -> NaiveDate {
        self.zone.today(self.clock.as_ref())
    }

    // =========================================================================
    // Client operations
    // =========================================================================

    /// All medications in creation order, each with its last 7 days.
    pub fn list_medications(&self) -> TrackerResult<Vec<MedicationOverview>> {
        let db = self.db()?;
        let today = self.today();

        let medications = db.list_medications()?;
        let mut overviews = Vec::with_capacity(medications.len());
        for medication in medications {
            let last_7_days = self.window_for(&db, medication.id, today, DEFAULT_WINDOW_DAYS)?;
            overviews.push(MedicationOverview {
                medication,
                last_7_days,
            });
        }

        tracing::debug!(count = overviews.len(), %today, "Listed medications");
        Ok(overviews)
    }

    /// Register a new medication.
    pub fn create_medication(
        &self,
        name: &str,
        dosage: &str,
        notes: Option<&str>,
    ) -> TrackerResult<Medication> {
        let created_at = self.clock.now();
        let result = self
            .db()?
            .create_medication(name, dosage, notes, created_at);

        match result {
            Ok(medication) => {
                tracing::info!(medication_id = medication.id, name = %medication.name, "Created medication");
                Ok(medication)
            }
            Err(e) => {
                if let DbError::Validation(msg) = &e {
                    tracing::warn!("Rejected medication: {}", msg);
                }
                Err(e.into())
            }
        }
    }

    /// Record that a dose was taken or missed at `logged_at`.
    ///
    /// Always appends. A later log for the same day supersedes earlier ones
    /// when the window is read.
    pub fn log_dose(
        &self,
        medication_id: MedicationId,
        status: DoseStatus,
        logged_at: DateTime<Utc>,
    ) -> TrackerResult<DoseLogEntry> {
        if !LOGGED_AT_YEARS.contains(&logged_at.year()) {
            return Err(TrackerError::Validation(format!(
                "loggedAt year {} is outside {}..={}",
                logged_at.year(),
                LOGGED_AT_YEARS.start(),
                LOGGED_AT_YEARS.end()
            )));
        }

        let now = self.clock.now();
        // A limit past the end of representable time bounds nothing
        let latest_allowed = self
            .max_future_skew
            .and_then(|max_skew| now.checked_add_signed(max_skew).map(|limit| (max_skew, limit)));
        if let Some((max_skew, limit)) = latest_allowed {
            if logged_at > limit {
                tracing::warn!(
                    medication_id,
                    %logged_at,
                    %now,
                    "Rejected dose log too far in the future"
                );
                return Err(TrackerError::Validation(format!(
                    "loggedAt {} is more than {}s ahead of the current time",
                    logged_at.to_rfc3339(),
                    max_skew.num_seconds()
                )));
            }
        }

        let entry = self
            .db()?
            .append_dose_log(medication_id, status, logged_at, now)?;

        tracing::info!(
            medication_id,
            dose_log_id = entry.id,
            status = %entry.status,
            day = %self.zone.calendar_day(entry.logged_at),
            "Logged dose"
        );
        Ok(entry)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn get_medication(&self, medication_id: MedicationId) -> TrackerResult<Medication> {
        Ok(self.db()?.get_medication(medication_id)?)
    }

    /// Every log entry for a medication, superseded ones included, oldest first.
    pub fn dose_history(&self, medication_id: MedicationId) -> TrackerResult<Vec<DoseLogEntry>> {
        let db = self.db()?;
        if !db.medication_exists(medication_id)? {
            return Err(TrackerError::NotFound(format!("medication {}", medication_id)));
        }
        Ok(db.list_dose_logs(medication_id)?)
    }

    /// Adherence over an arbitrary trailing window ending today.
    pub fn adherence(&self, medication_id: MedicationId, days: u32) -> TrackerResult<AdherenceReport> {
        if days == 0 || days > MAX_WINDOW_DAYS {
            return Err(TrackerError::Validation(format!(
                "window must be between 1 and {} days, got {}",
                MAX_WINDOW_DAYS, days
            )));
        }

        let db = self.db()?;
        if !db.medication_exists(medication_id)? {
            return Err(TrackerError::NotFound(format!("medication {}", medication_id)));
        }

        let days = self.window_for(&db, medication_id, self.today(), days)?;
        let summary = AdherenceSummary::from_days(&days);
        Ok(AdherenceReport {
            medication_id,
            days,
            summary,
        })
    }

    fn window_for(
        &self,
        db: &Database,
        medication_id: MedicationId,
        today: NaiveDate,
        days: u32,
    ) -> TrackerResult<Vec<DayStatus>> {
        let (from, to) = window_bounds(today, days, &self.zone);
        let entries = db.list_dose_logs_between(medication_id, from, to)?;
        Ok(adherence_window(&entries, today, days, &self.zone))
    }
}
