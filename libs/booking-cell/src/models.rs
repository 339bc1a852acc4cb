use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub clinic_id: Uuid,
    /// The schedule row whose slot this booking claimed.
    pub schedule_id: Uuid,
    pub date: NaiveDate,
    /// Canonical slot label as stored in the schedule, not the raw client
    /// input.
    pub time_slot: String,
    /// Slot id within the schedule, kept so cancellation can release
    /// without re-resolving the label.
    pub slot_id: String,
    pub reason: String,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub payment_url: Option<String>,
    /// Raw payment callback payload kept for audit once reconciled.
    pub payment_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    /// Pending and Confirmed hold the patient-doctor pair exclusively; a
    /// patient cannot open a second booking with the same doctor while one
    /// of these exists.
    pub fn is_active(&self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingStatus::Pending => write!(f, "pending"),
            BookingStatus::Confirmed => write!(f, "confirmed"),
            BookingStatus::Completed => write!(f, "completed"),
            BookingStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Fields arrive optional so presence validation can name everything that
/// is missing in one response instead of failing at deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub clinic_id: Option<Uuid>,
    pub date: Option<String>,
    pub time_slot: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingRequest {
    pub status: Option<BookingStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum BookingError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Clinic not found")]
    ClinicNotFound,

    #[error("Booking not found")]
    BookingNotFound,

    #[error("Patient already has an unresolved booking with this doctor")]
    DuplicateBooking,

    #[error("Time slot not found: {0}")]
    SlotNotFound(String),

    #[error("Time slot is no longer available: {0}")]
    SlotUnavailable(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Canonicalize a client-supplied date into a timezone-naive calendar
/// date. Accepts `YYYY-MM-DD` or an RFC 3339 instant (whose calendar date
/// is taken as written, without timezone shifting).
pub fn normalize_date(raw: &str) -> Result<NaiveDate, BookingError> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.date_naive());
    }

    Err(BookingError::ValidationError(format!(
        "date must be YYYY-MM-DD or an RFC 3339 timestamp, got: {}",
        raw
    )))
}
