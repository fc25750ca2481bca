//! SQLite schema definition.

/// Complete database schema for medication tracking.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Medications (ids never reused; no deletes)
-- ============================================================================

CREATE TABLE IF NOT EXISTS medications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL CHECK (length(trim(name)) > 0),
    dosage TEXT NOT NULL CHECK (length(trim(dosage)) > 0),
    notes TEXT,
    created_at TEXT NOT NULL
);

CREATE TRIGGER IF NOT EXISTS medications_no_delete BEFORE DELETE ON medications
BEGIN
    SELECT RAISE(ABORT, 'Medications cannot be deleted');
END;

CREATE TRIGGER IF NOT EXISTS medications_immutable BEFORE UPDATE OF id, name, dosage, created_at ON medications
BEGIN
    SELECT RAISE(ABORT, 'Medication identity fields are immutable');
END;

-- ============================================================================
-- Dose Logs (Append-Only - Immutable after creation)
-- ============================================================================

CREATE TABLE IF NOT EXISTS dose_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    medication_id INTEGER NOT NULL REFERENCES medications(id),
    status TEXT NOT NULL CHECK (status IN ('taken', 'missed')),
    logged_at TEXT NOT NULL,                     -- caller-asserted event time (RFC 3339 UTC)
    recorded_at TEXT NOT NULL                    -- server receipt time (RFC 3339 UTC)
);

CREATE TRIGGER IF NOT EXISTS dose_logs_no_update BEFORE UPDATE ON dose_logs
BEGIN
    SELECT RAISE(ABORT, 'Dose logs are append-only');
END;

CREATE TRIGGER IF NOT EXISTS dose_logs_no_delete BEFORE DELETE ON dose_logs
BEGIN
    SELECT RAISE(ABORT, 'Dose logs are append-only');
END;

-- Window queries scan one medication's logs by time
CREATE INDEX IF NOT EXISTS idx_dose_logs_medication_time ON dose_logs(medication_id, logged_at);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn setup_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute(
            "INSERT INTO medications (name, dosage, created_at) VALUES ('Aricept', '10mg', '2024-03-10T00:00:00.000000000Z')",
            [],
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);

        // Applying twice must be harmless
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        let conn = setup_conn();
        let result = conn.execute(
            "INSERT INTO medications (name, dosage, created_at) VALUES ('  ', '10mg', 'x')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_medication_cannot_be_deleted_or_renamed() {
        let conn = setup_conn();
        assert!(conn.execute("DELETE FROM medications WHERE id = 1", []).is_err());
        assert!(conn
            .execute("UPDATE medications SET name = 'Other' WHERE id = 1", [])
            .is_err());

        // Notes stay editable
        assert!(conn
            .execute("UPDATE medications SET notes = 'with food' WHERE id = 1", [])
            .is_ok());
    }

    #[test]
    fn test_dose_log_constraints() {
        let conn = setup_conn();

        // Unknown status
        let result = conn.execute(
            "INSERT INTO dose_logs (medication_id, status, logged_at, recorded_at) VALUES (1, 'skipped', 'a', 'b')",
            [],
        );
        assert!(result.is_err());

        // Dangling medication reference
        let result = conn.execute(
            "INSERT INTO dose_logs (medication_id, status, logged_at, recorded_at) VALUES (99, 'taken', 'a', 'b')",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "INSERT INTO dose_logs (medication_id, status, logged_at, recorded_at) VALUES (1, 'taken', 'a', 'b')",
            [],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_dose_logs_append_only() {
        let conn = setup_conn();
        conn.execute(
            "INSERT INTO dose_logs (medication_id, status, logged_at, recorded_at) VALUES (1, 'taken', 'a', 'b')",
            [],
        )
        .unwrap();

        assert!(conn
            .execute("UPDATE dose_logs SET status = 'missed' WHERE id = 1", [])
            .is_err());
        assert!(conn.execute("DELETE FROM dose_logs WHERE id = 1", []).is_err());
    }
}
