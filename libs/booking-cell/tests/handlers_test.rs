mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use booking_cell::handlers::{self, BookingState};
use booking_cell::models::{BookingStatus, UpdateBookingRequest};
use shared_models::auth::User;
use shared_models::error::AppError;

use common::{booking_harness, BookingHarness};

fn user(id: Uuid, role: &str) -> Extension<User> {
    Extension(User {
        id: id.to_string(),
        email: Some(format!("{}@example.com", role)),
        role: Some(role.to_string()),
        metadata: None,
        created_at: Some(chrono::Utc::now()),
    })
}

fn booking_state(h: &BookingHarness) -> Arc<BookingState> {
    Arc::new(BookingState {
        engine: h.engine.clone(),
        lifecycle: h.lifecycle.clone(),
    })
}

#[tokio::test]
async fn patient_creates_own_booking_with_201() {
    let h = booking_harness().await;
    let state = booking_state(&h);

    let (status, Json(body)) = handlers::create_booking(
        State(state),
        user(h.patient.id, "patient"),
        Json(h.request("2025-11-24", "3")),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["booking"]["status"], "pending");
    assert_eq!(body["booking"]["timeSlot"], "10:00 - 11:00");
}

#[tokio::test]
async fn stranger_cannot_book_for_another_patient() {
    let h = booking_harness().await;
    let state = booking_state(&h);

    let err = handlers::create_booking(
        State(state),
        user(Uuid::new_v4(), "patient"),
        Json(h.request("2025-11-24", "3")),
    )
    .await
    .unwrap_err();

    assert_matches!(err, AppError::Auth(_));
}

#[tokio::test]
async fn double_booking_maps_to_conflict() {
    let h = booking_harness().await;
    let state = booking_state(&h);

    handlers::create_booking(
        State(state.clone()),
        user(h.patient.id, "patient"),
        Json(h.request("2025-11-24", "3")),
    )
    .await
    .unwrap();

    let err = handlers::create_booking(
        State(state),
        user(h.patient.id, "patient"),
        Json(h.request("2025-11-25", "5")),
    )
    .await
    .unwrap_err();

    assert_matches!(err, AppError::Conflict(_));
    assert_eq!(err.kind(), "conflict");
}

#[tokio::test]
async fn invalid_transition_maps_to_bad_request_kind() {
    let h = booking_harness().await;
    let state = booking_state(&h);

    let booking = h
        .engine
        .create_booking(h.request("2025-11-24", "3"))
        .await
        .unwrap();
    h.lifecycle
        .apply(
            booking.id,
            UpdateBookingRequest {
                status: Some(BookingStatus::Cancelled),
                notes: None,
            },
        )
        .await
        .unwrap();

    let err = handlers::update_booking(
        State(state),
        Path(booking.id),
        user(h.patient.id, "admin"),
        Json(UpdateBookingRequest {
            status: Some(BookingStatus::Confirmed),
            notes: None,
        }),
    )
    .await
    .unwrap_err();

    assert_matches!(err, AppError::InvalidTransition(_));
    assert_eq!(err.kind(), "invalid_transition");
}

#[tokio::test]
async fn patient_may_cancel_but_not_confirm() {
    let h = booking_harness().await;
    let state = booking_state(&h);

    let booking = h
        .engine
        .create_booking(h.request("2025-11-24", "3"))
        .await
        .unwrap();

    let err = handlers::update_booking(
        State(state.clone()),
        Path(booking.id),
        user(h.patient.id, "patient"),
        Json(UpdateBookingRequest {
            status: Some(BookingStatus::Confirmed),
            notes: None,
        }),
    )
    .await
    .unwrap_err();
    assert_matches!(err, AppError::Auth(_));

    let Json(body) = handlers::update_booking(
        State(state),
        Path(booking.id),
        user(h.patient.id, "patient"),
        Json(UpdateBookingRequest {
            status: Some(BookingStatus::Cancelled),
            notes: None,
        }),
    )
    .await
    .unwrap();
    assert_eq!(body["booking"]["status"], "cancelled");
}

#[tokio::test]
async fn doctor_confirms_their_booking() {
    let h = booking_harness().await;
    let state = booking_state(&h);

    let booking = h
        .engine
        .create_booking(h.request("2025-11-24", "3"))
        .await
        .unwrap();

    let Json(body) = handlers::update_booking(
        State(state),
        Path(booking.id),
        user(h.doctor.id, "doctor"),
        Json(UpdateBookingRequest {
            status: Some(BookingStatus::Confirmed),
            notes: None,
        }),
    )
    .await
    .unwrap();

    assert_eq!(body["booking"]["status"], "confirmed");
}

#[tokio::test]
async fn uninvolved_user_cannot_view_booking() {
    let h = booking_harness().await;
    let state = booking_state(&h);

    let booking = h
        .engine
        .create_booking(h.request("2025-11-24", "3"))
        .await
        .unwrap();

    let err = handlers::get_booking(
        State(state),
        Path(booking.id),
        user(Uuid::new_v4(), "patient"),
    )
    .await
    .unwrap_err();

    assert_matches!(err, AppError::Auth(_));
}
