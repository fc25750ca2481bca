//! Adherence window models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::DoseStatus;

/// Aggregated status of one calendar day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DayState {
    /// Latest entry that day is `taken`
    Taken,
    /// Latest entry that day is `missed`
    Missed,
    /// Nothing logged that day (not the same as a recorded miss)
    Pending,
}

impl DayState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayState::Taken => "taken",
            DayState::Missed => "missed",
            DayState::Pending => "pending",
        }
    }
}

impl From<DoseStatus> for DayState {
    fn from(status: DoseStatus) -> Self {
        match status {
            DoseStatus::Taken => DayState::Taken,
            DoseStatus::Missed => DayState::Missed,
        }
    }
}

/// One slot of an adherence window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayStatus {
    /// Position in the window; 0 is the oldest day
    pub day_index: u32,
    /// Calendar day in the reference timezone
    pub date: NaiveDate,
    pub status: DayState,
}

/// Per-state day counts for a window.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceSummary {
    pub taken: u32,
    pub missed: u32,
    pub pending: u32,
}

impl AdherenceSummary {
    /// Tally a window.
    pub fn from_days(days: &[DayStatus]) -> Self {
        days.iter().fold(Self::default(), |mut acc, day| {
            match day.status {
                DayState::Taken => acc.taken += 1,
                DayState::Missed => acc.missed += 1,
                DayState::Pending => acc.pending += 1,
            }
            acc
        })
    }

    /// Fraction of recorded days that were taken. `None` when nothing was recorded.
    pub fn adherence_rate(&self) -> Option<f64> {
        let recorded = self.taken + self.missed;
        if recorded == 0 {
            None
        } else {
            Some(f64::from(self.taken) / f64::from(recorded))
        }
    }
}

/// Window plus summary for one medication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceReport {
    pub medication_id: super::MedicationId,
    pub days: Vec<DayStatus>,
    pub summary: AdherenceSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(index: u32, status: DayState) -> DayStatus {
        DayStatus {
            day_index: index,
            date: NaiveDate::from_ymd_opt(2024, 3, 1 + index).unwrap(),
            status,
        }
    }

    #[test]
    fn test_summary_counts() {
        let days = vec![
            day(0, DayState::Taken),
            day(1, DayState::Pending),
            day(2, DayState::Missed),
            day(3, DayState::Taken),
            day(4, DayState::Taken),
        ];
        let summary = AdherenceSummary::from_days(&days);
        assert_eq!(summary.taken, 3);
        assert_eq!(summary.missed, 1);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.adherence_rate(), Some(0.75));
    }

    #[test]
    fn test_rate_ignores_pending() {
        let days = vec![day(0, DayState::Pending), day(1, DayState::Pending)];
        let summary = AdherenceSummary::from_days(&days);
        assert_eq!(summary.pending, 2);
        assert_eq!(summary.adherence_rate(), None);
    }

    #[test]
    fn test_day_status_wire_names() {
        let value = serde_json::to_value(day(0, DayState::Taken)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"dayIndex": 0, "date": "2024-03-01", "status": "taken"})
        );
    }

    #[test]
    fn test_day_state_serde() {
        assert_eq!(serde_json::to_string(&DayState::Pending).unwrap(), "\"pending\"");
        assert_eq!(DayState::from(DoseStatus::Missed), DayState::Missed);
    }
}
