use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    Booking, BookingError, BookingFilter, BookingStatus, CreateBookingRequest,
    UpdateBookingRequest,
};
use crate::services::engine::BookingEngine;
use crate::services::lifecycle::BookingLifecycle;

/// Shared state for the booking routes. The lifecycle is shared with the
/// payment cell, which drives the same state machine from callbacks.
pub struct BookingState {
    pub engine: Arc<BookingEngine>,
    pub lifecycle: Arc<BookingLifecycle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingQueryParams {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
}

pub fn map_booking_error(e: BookingError) -> AppError {
    match e {
        BookingError::ValidationError(msg) => AppError::Validation(msg),
        BookingError::PatientNotFound => AppError::NotFound("Patient not found".to_string()),
        BookingError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        BookingError::ClinicNotFound => AppError::NotFound("Clinic not found".to_string()),
        BookingError::BookingNotFound => AppError::NotFound("Booking not found".to_string()),
        BookingError::DuplicateBooking => AppError::Conflict(
            "You already have an unresolved booking with this doctor, cancel it first".to_string(),
        ),
        BookingError::SlotNotFound(selector) => {
            AppError::BadRequest(format!("Time slot not found: {}", selector))
        }
        BookingError::SlotUnavailable(label) => {
            AppError::Conflict(format!("Time slot is no longer available: {}", label))
        }
        BookingError::InvalidStatusTransition { from, to } => {
            AppError::InvalidTransition(format!("cannot move booking from {} to {}", from, to))
        }
        BookingError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn can_view(booking: &Booking, user: &User) -> bool {
    booking.patient_id.to_string() == user.id
        || booking.doctor_id.to_string() == user.id
        || user.role.as_deref() == Some("admin")
}

#[axum::debug_handler]
pub async fn create_booking(
    State(state): State<Arc<BookingState>>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    // A patient books for themselves; staff may book on a patient's behalf.
    let is_patient = request
        .patient_id
        .map(|id| id.to_string() == user.id)
        .unwrap_or(false);
    let is_staff = matches!(user.role.as_deref(), Some("admin") | Some("doctor"));

    if !is_patient && !is_staff {
        return Err(AppError::Auth(
            "Not authorized to book for this patient".to_string(),
        ));
    }

    let booking = state
        .engine
        .create_booking(request)
        .await
        .map_err(map_booking_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "booking": booking,
            "message": "Booking created, awaiting confirmation",
        })),
    ))
}

#[axum::debug_handler]
pub async fn get_booking(
    State(state): State<Arc<BookingState>>,
    Path(booking_id): Path<Uuid>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let booking = state
        .engine
        .get_booking(booking_id)
        .await
        .map_err(map_booking_error)?;

    if !can_view(&booking, &user) {
        return Err(AppError::Auth(
            "Not authorized to view this booking".to_string(),
        ));
    }

    Ok(Json(json!({ "booking": booking })))
}

#[axum::debug_handler]
pub async fn search_bookings(
    State(state): State<Arc<BookingState>>,
    Query(params): Query<BookingQueryParams>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let mut filter = BookingFilter {
        patient_id: params.patient_id,
        doctor_id: params.doctor_id,
        status: params.status,
    };

    // Non-admin callers only ever see their own side of the ledger.
    if user.role.as_deref() != Some("admin") {
        let own_id = Uuid::parse_str(&user.id)
            .map_err(|_| AppError::Auth("Session subject is not a valid id".to_string()))?;

        if user.role.as_deref() == Some("doctor") {
            filter.doctor_id = Some(own_id);
        } else {
            filter.patient_id = Some(own_id);
        }
    }

    let bookings = state
        .engine
        .search_bookings(filter)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({ "bookings": bookings })))
}

#[axum::debug_handler]
pub async fn update_booking(
    State(state): State<Arc<BookingState>>,
    Path(booking_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateBookingRequest>,
) -> Result<Json<Value>, AppError> {
    let booking = state
        .engine
        .get_booking(booking_id)
        .await
        .map_err(map_booking_error)?;

    if !can_view(&booking, &user) {
        return Err(AppError::Auth(
            "Not authorized to update this booking".to_string(),
        ));
    }

    // Patients may cancel their own booking or edit notes; the remaining
    // transitions are doctor/admin actions.
    let is_patient_only = booking.patient_id.to_string() == user.id
        && booking.doctor_id.to_string() != user.id
        && user.role.as_deref() != Some("admin");
    if is_patient_only {
        if let Some(status) = request.status {
            if status != BookingStatus::Cancelled {
                return Err(AppError::Auth(
                    "Patients can only cancel their bookings".to_string(),
                ));
            }
        }
    }

    let updated = state
        .lifecycle
        .apply(booking_id, request)
        .await
        .map_err(map_booking_error)?;

    Ok(Json(json!({
        "success": true,
        "booking": updated,
    })))
}
