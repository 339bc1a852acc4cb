use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One bookable time window within a day. The `is_available` bit is the
/// single source of truth for whether the slot can be claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlot {
    pub id: String,
    pub time: String,
    pub is_available: bool,
}

/// The full slot map for one doctor on one calendar date. The slot list is
/// persisted as a single JSON column so one row version guards the whole
/// day; `version` is the compare-and-swap token for every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time_slots: Vec<TimeSlot>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    /// Fresh schedule seeded with the default template, all slots open.
    pub fn with_default_template(doctor_id: Uuid, date: NaiveDate) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            doctor_id,
            date,
            time_slots: default_slot_template(),
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn slot_by_id(&self, slot_id: &str) -> Option<&TimeSlot> {
        self.time_slots.iter().find(|s| s.id == slot_id)
    }
}

/// Read-only projection of a day. `id` is `None` when no row is persisted
/// and the default template was synthesized for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleView {
    pub id: Option<Uuid>,
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub time_slots: Vec<TimeSlot>,
}

impl ScheduleView {
    pub fn from_schedule(schedule: &Schedule) -> Self {
        Self {
            id: Some(schedule.id),
            doctor_id: schedule.doctor_id,
            date: schedule.date,
            time_slots: schedule.time_slots.clone(),
        }
    }

    pub fn synthesized(doctor_id: Uuid, date: NaiveDate) -> Self {
        Self {
            id: None,
            doctor_id,
            date,
            time_slots: default_slot_template(),
        }
    }
}

/// Result of a successful slot claim: the canonical slot (label as stored,
/// not as the caller wrote it) plus the schedule row it lives in.
#[derive(Debug, Clone)]
pub struct ClaimedSlot {
    pub schedule_id: Uuid,
    pub slot: TimeSlot,
}

/// Eight hourly consultation windows per day, ids stable across the fleet.
pub fn default_slot_template() -> Vec<TimeSlot> {
    const HOURS: [(&str, &str); 8] = [
        ("1", "8:00 - 9:00"),
        ("2", "9:00 - 10:00"),
        ("3", "10:00 - 11:00"),
        ("4", "11:00 - 12:00"),
        ("5", "13:00 - 14:00"),
        ("6", "14:00 - 15:00"),
        ("7", "15:00 - 16:00"),
        ("8", "16:00 - 17:00"),
    ];

    HOURS
        .iter()
        .map(|(id, time)| TimeSlot {
            id: (*id).to_string(),
            time: (*time).to_string(),
            is_available: true,
        })
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDaySlotsRequest {
    pub date: NaiveDate,
    pub time_slots: Vec<TimeSlot>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ScheduleError {
    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Time slot not found: {0}")]
    SlotNotFound(String),

    #[error("Time slot is no longer available: {0}")]
    SlotUnavailable(String),

    #[error("Slot claim contention was not resolved")]
    ClaimContention,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
