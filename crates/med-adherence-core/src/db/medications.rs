//! Medication store.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{decode_timestamp, encode_timestamp, Database, DbError, DbResult};
use crate::models::{Medication, MedicationId, NewMedication};

const MEDICATION_COLUMNS: &str = "id, name, dosage, notes, created_at";

impl Database {
    /// Validate and insert a medication, returning it with its assigned id.
    pub fn create_medication(
        &self,
        name: &str,
        dosage: &str,
        notes: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> DbResult<Medication> {
        let new = NewMedication::new(name, dosage, notes)
            .map_err(|field| DbError::Validation(format!("{} must not be empty", field)))?;
        self.insert_medication(&new, created_at)
    }

    /// Insert an already validated medication.
    pub fn insert_medication(
        &self,
        new: &NewMedication,
        created_at: DateTime<Utc>,
    ) -> DbResult<Medication> {
        self.conn.execute(
            r#"
            INSERT INTO medications (name, dosage, notes, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                new.name(),
                new.dosage(),
                new.notes(),
                encode_timestamp(created_at),
            ],
        )?;

        Ok(Medication {
            id: self.conn.last_insert_rowid(),
            name: new.name().to_string(),
            dosage: new.dosage().to_string(),
            notes: new.notes().map(str::to_string),
            created_at,
        })
    }

    /// Get a medication by id, or `None` if unknown.
    pub fn find_medication(&self, id: MedicationId) -> DbResult<Option<Medication>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM medications WHERE id = ?", MEDICATION_COLUMNS),
                [id],
                MedicationRow::from_row,
            )
            .optional()?
            .map(Medication::try_from)
            .transpose()
    }

    /// Get a medication by id.
    pub fn get_medication(&self, id: MedicationId) -> DbResult<Medication> {
        self.find_medication(id)?
            .ok_or_else(|| DbError::NotFound(format!("medication {}", id)))
    }

    /// Check whether a medication id has been assigned.
    pub fn medication_exists(&self, id: MedicationId) -> DbResult<bool> {
        let exists: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM medications WHERE id = ?)",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// List all medications in creation order.
    pub fn list_medications(&self) -> DbResult<Vec<Medication>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM medications ORDER BY id",
            MEDICATION_COLUMNS
        ))?;

        let rows = stmt.query_map([], MedicationRow::from_row)?;

        let mut medications = Vec::new();
        for row in rows {
            medications.push(row?.try_into()?);
        }
        Ok(medications)
    }

    pub fn count_medications(&self) -> DbResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM medications", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// Intermediate row struct for database mapping.
struct MedicationRow {
    id: i64,
    name: String,
    dosage: String,
    notes: Option<String>,
    created_at: String,
}

impl MedicationRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            dosage: row.get(2)?,
            notes: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

impl TryFrom<MedicationRow> for Medication {
    type Error = DbError;

    fn try_from(row: MedicationRow) -> Result<Self, Self::Error> {
        Ok(Medication {
            id: row.id,
            name: row.name,
            dosage: row.dosage,
            notes: row.notes,
            created_at: decode_timestamp(&row.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn created() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-03-10T08:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_create_and_get() {
        let db = setup_db();

        let med = db
            .create_medication("Aricept", "10mg", Some("Take with breakfast"), created())
            .unwrap();
        assert_eq!(med.id, 1);

        let retrieved = db.get_medication(med.id).unwrap();
        assert_eq!(retrieved, med);
        assert_eq!(retrieved.notes, Some("Take with breakfast".into()));
        assert_eq!(retrieved.created_at, created());
    }

    #[test]
    fn test_create_rejects_blank_fields() {
        let db = setup_db();

        let result = db.create_medication("", "10mg", None, created());
        assert!(matches!(result, Err(DbError::Validation(_))));

        let result = db.create_medication("Aricept", "   ", None, created());
        assert!(matches!(result, Err(DbError::Validation(_))));

        assert_eq!(db.count_medications().unwrap(), 0);
    }

    #[test]
    fn test_ids_are_sequential() {
        let db = setup_db();

        let a = db.create_medication("Aricept", "10mg", None, created()).unwrap();
        let b = db.create_medication("Namenda", "5mg", None, created()).unwrap();
        let c = db.create_medication("Lisinopril", "20mg", None, created()).unwrap();

        assert_eq!((a.id, b.id, c.id), (1, 2, 3));
    }

    #[test]
    fn test_list_in_creation_order() {
        let db = setup_db();

        db.create_medication("Zoloft", "50mg", None, created()).unwrap();
        db.create_medication("Aricept", "10mg", None, created()).unwrap();
        db.create_medication("Metformin", "500mg", None, created()).unwrap();

        let names: Vec<_> = db
            .list_medications()
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["Zoloft", "Aricept", "Metformin"]);
    }

    #[test]
    fn test_get_unknown() {
        let db = setup_db();
        assert!(db.find_medication(42).unwrap().is_none());
        assert!(matches!(db.get_medication(42), Err(DbError::NotFound(_))));
        assert!(!db.medication_exists(42).unwrap());
    }
}
