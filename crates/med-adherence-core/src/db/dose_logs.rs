//! Dose log store.
//!
//! A pure append-only log. It does not enforce one entry per day; readers
//! resolve same-day entries with the latest-wins rule.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use super::{decode_timestamp, encode_timestamp, Database, DbError, DbResult};
use crate::models::{DoseLogEntry, DoseStatus, MedicationId};

const DOSE_LOG_COLUMNS: &str = "id, medication_id, status, logged_at, recorded_at";

impl Database {
    /// Append a dose log entry for an existing medication.
    pub fn append_dose_log(
        &self,
        medication_id: MedicationId,
        status: DoseStatus,
        logged_at: DateTime<Utc>,
        recorded_at: DateTime<Utc>,
    ) -> DbResult<DoseLogEntry> {
        let tx = self.conn.unchecked_transaction()?;

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM medications WHERE id = ?)",
            [medication_id],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(DbError::NotFound(format!("medication {}", medication_id)));
        }

        tx.execute(
            r#"
            INSERT INTO dose_logs (medication_id, status, logged_at, recorded_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                medication_id,
                status.as_str(),
                encode_timestamp(logged_at),
                encode_timestamp(recorded_at),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(DoseLogEntry {
            id,
            medication_id,
            status,
            logged_at,
            recorded_at,
        })
    }

    /// All entries for a medication, ordered by `logged_at` then id.
    pub fn list_dose_logs(&self, medication_id: MedicationId) -> DbResult<Vec<DoseLogEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM dose_logs WHERE medication_id = ? ORDER BY logged_at, id",
            DOSE_LOG_COLUMNS
        ))?;
        let rows = stmt.query_map([medication_id], DoseLogRow::from_row)?;
        collect_entries(rows)
    }

    /// Entries for a medication with `from <= logged_at < to`.
    pub fn list_dose_logs_between(
        &self,
        medication_id: MedicationId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> DbResult<Vec<DoseLogEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM dose_logs
            WHERE medication_id = ?1 AND logged_at >= ?2 AND logged_at < ?3
            ORDER BY logged_at, id
            "#,
            DOSE_LOG_COLUMNS
        ))?;
        let rows = stmt.query_map(
            params![medication_id, encode_timestamp(from), encode_timestamp(to)],
            DoseLogRow::from_row,
        )?;
        collect_entries(rows)
    }

    pub fn count_dose_logs(&self, medication_id: MedicationId) -> DbResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM dose_logs WHERE medication_id = ?",
            [medication_id],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

fn collect_entries(
    rows: impl Iterator<Item = rusqlite::Result<DoseLogRow>>,
) -> DbResult<Vec<DoseLogEntry>> {
    let mut entries = Vec::new();
    for row in rows {
        entries.push(row?.try_into()?);
    }
    Ok(entries)
}

/// Intermediate row struct for database mapping.
struct DoseLogRow {
    id: i64,
    medication_id: i64,
    status: String,
    logged_at: String,
    recorded_at: String,
}

impl DoseLogRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            medication_id: row.get(1)?,
            status: row.get(2)?,
            logged_at: row.get(3)?,
            recorded_at: row.get(4)?,
        })
    }
}

impl TryFrom<DoseLogRow> for DoseLogEntry {
    type Error = DbError;

    fn try_from(row: DoseLogRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<DoseStatus>()
            .map_err(|e| DbError::Corrupt(e.to_string()))?;

        Ok(DoseLogEntry {
            id: row.id,
            medication_id: row.medication_id,
            status,
            logged_at: decode_timestamp(&row.logged_at)?,
            recorded_at: decode_timestamp(&row.recorded_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_medication("Aricept", "10mg", None, at("2024-03-01T00:00:00Z"))
            .unwrap();
        db.create_medication("Namenda", "5mg", None, at("2024-03-01T00:00:00Z"))
            .unwrap();
        db
    }

    #[test]
    fn test_append_and_list() {
        let db = setup_db();
        let received = at("2024-03-10T21:00:05Z");

        let entry = db
            .append_dose_log(1, DoseStatus::Taken, at("2024-03-10T09:00:00Z"), received)
            .unwrap();
        assert_eq!(entry.id, 1);
        assert_eq!(entry.medication_id, 1);
        assert_eq!(entry.recorded_at, received);

        let entries = db.list_dose_logs(1).unwrap();
        assert_eq!(entries, vec![entry]);
        assert!(db.list_dose_logs(2).unwrap().is_empty());
    }

    #[test]
    fn test_append_unknown_medication() {
        let db = setup_db();

        let result = db.append_dose_log(
            99,
            DoseStatus::Taken,
            at("2024-03-10T09:00:00Z"),
            at("2024-03-10T09:00:00Z"),
        );
        assert!(matches!(result, Err(DbError::NotFound(_))));
        assert_eq!(db.count_dose_logs(99).unwrap(), 0);
    }

    #[test]
    fn test_same_day_entries_all_kept() {
        let db = setup_db();
        let now = at("2024-03-10T22:00:00Z");

        db.append_dose_log(1, DoseStatus::Taken, at("2024-03-10T09:00:00Z"), now)
            .unwrap();
        db.append_dose_log(1, DoseStatus::Missed, at("2024-03-10T21:00:00Z"), now)
            .unwrap();
        db.append_dose_log(1, DoseStatus::Missed, at("2024-03-10T21:00:00Z"), now)
            .unwrap();

        assert_eq!(db.count_dose_logs(1).unwrap(), 3);
    }

    #[test]
    fn test_list_ordered_by_logged_at() {
        let db = setup_db();
        let now = at("2024-03-12T00:00:00Z");

        // Inserted out of order
        db.append_dose_log(1, DoseStatus::Missed, at("2024-03-11T08:00:00Z"), now)
            .unwrap();
        db.append_dose_log(1, DoseStatus::Taken, at("2024-03-09T08:00:00Z"), now)
            .unwrap();
        db.append_dose_log(1, DoseStatus::Taken, at("2024-03-10T08:00:00Z"), now)
            .unwrap();

        let ids: Vec<_> = db.list_dose_logs(1).unwrap().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_list_between_is_half_open() {
        let db = setup_db();
        let now = at("2024-03-12T00:00:00Z");

        db.append_dose_log(1, DoseStatus::Taken, at("2024-03-09T23:59:59Z"), now)
            .unwrap();
        db.append_dose_log(1, DoseStatus::Taken, at("2024-03-10T00:00:00Z"), now)
            .unwrap();
        db.append_dose_log(1, DoseStatus::Taken, at("2024-03-10T23:59:59.999Z"), now)
            .unwrap();
        db.append_dose_log(1, DoseStatus::Taken, at("2024-03-11T00:00:00Z"), now)
            .unwrap();

        let entries = db
            .list_dose_logs_between(1, at("2024-03-10T00:00:00Z"), at("2024-03-11T00:00:00Z"))
            .unwrap();
        let ids: Vec<_> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }
}
