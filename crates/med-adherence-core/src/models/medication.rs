//! Medication models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::DayStatus;

/// Store-assigned medication identifier. Monotonic, never reused.
pub type MedicationId = i64;

/// A medication registered by the caregiver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    /// Assigned by the store on creation
    pub id: MedicationId,
    /// Display name (e.g., "Aricept")
    pub name: String,
    /// Free-form dosage text (e.g., "10mg"), never parsed
    pub dosage: String,
    /// Caregiver notes (e.g., "Take with breakfast")
    pub notes: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Fields for a medication that has not been stored yet.
///
/// Construction trims `name` and `dosage` and folds blank notes to `None`,
/// so a value of this type is always storable.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMedication {
    name: String,
    dosage: String,
    notes: Option<String>,
}

impl NewMedication {
    /// Validate raw input. Returns the name of the first offending field on failure.
    pub fn new(name: &str, dosage: &str, notes: Option<&str>) -> Result<Self, &'static str> {
        let name = name.trim();
        if name.is_empty() {
            return Err("name");
        }
        let dosage = dosage.trim();
        if dosage.is_empty() {
            return Err("dosage");
        }
        let notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Ok(Self {
            name: name.to_string(),
            dosage: dosage.to_string(),
            notes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dosage(&self) -> &str {
        &self.dosage
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }
}

/// A medication with its trailing 7-day adherence window, as shown in the list view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationOverview {
    #[serde(flatten)]
    pub medication: Medication,
    /// Oldest day first, today last
    #[serde(rename = "last7Days")]
    pub last_7_days: Vec<DayStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_medication_trims() {
        let med = NewMedication::new("  Aricept ", "10mg\n", Some("  with breakfast  ")).unwrap();
        assert_eq!(med.name(), "Aricept");
        assert_eq!(med.dosage(), "10mg");
        assert_eq!(med.notes(), Some("with breakfast"));
    }

    #[test]
    fn test_new_medication_rejects_blank_fields() {
        assert_eq!(NewMedication::new("", "10mg", None), Err("name"));
        assert_eq!(NewMedication::new("   ", "10mg", None), Err("name"));
        assert_eq!(NewMedication::new("Aricept", "", None), Err("dosage"));
        assert_eq!(NewMedication::new("Aricept", " \t", None), Err("dosage"));
    }

    #[test]
    fn test_overview_wire_names() {
        let overview = MedicationOverview {
            medication: Medication {
                id: 1,
                name: "Aricept".into(),
                dosage: "10mg".into(),
                notes: None,
                created_at: DateTime::parse_from_rfc3339("2024-03-10T08:00:00Z")
                    .unwrap()
                    .with_timezone(&Utc),
            },
            last_7_days: Vec::new(),
        };

        let value = serde_json::to_value(&overview).unwrap();
        assert_eq!(value["id"], 1);
        assert_eq!(value["createdAt"], "2024-03-10T08:00:00Z");
        assert!(value["last7Days"].as_array().unwrap().is_empty());
        assert!(value.get("last_7_days").is_none());
        assert!(value.get("created_at").is_none());

        let back: MedicationOverview = serde_json::from_value(value).unwrap();
        assert_eq!(back, overview);
    }

    #[test]
    fn test_blank_notes_become_none() {
        let med = NewMedication::new("Aricept", "10mg", Some("")).unwrap();
        assert_eq!(med.notes(), None);
        let med = NewMedication::new("Aricept", "10mg", Some("   ")).unwrap();
        assert_eq!(med.notes(), None);
    }
}
