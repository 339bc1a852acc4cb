use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{ScheduleError, ScheduleView, SetDaySlotsRequest};
use crate::services::ledger::AvailabilityLedger;

#[derive(Debug, Deserialize)]
pub struct ScheduleQueryParams {
    pub date: Option<NaiveDate>,
    pub start: Option<NaiveDate>,
    pub days: Option<i64>,
}

pub fn map_schedule_error(e: ScheduleError) -> AppError {
    match e {
        ScheduleError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        ScheduleError::SlotNotFound(selector) => {
            AppError::BadRequest(format!("Time slot not found: {}", selector))
        }
        ScheduleError::SlotUnavailable(label) => {
            AppError::Conflict(format!("Time slot is no longer available: {}", label))
        }
        ScheduleError::ClaimContention => {
            AppError::Conflict("Schedule is being modified concurrently, retry".to_string())
        }
        ScheduleError::ValidationError(msg) => AppError::Validation(msg),
        ScheduleError::DatabaseError(msg) => AppError::Database(msg),
    }
}

/// `?date=` returns one day; `?start=&days=` returns a consecutive range.
/// Both synthesize the default template for unpersisted dates.
#[axum::debug_handler]
pub async fn get_doctor_schedule(
    State(ledger): State<Arc<AvailabilityLedger>>,
    Path(doctor_id): Path<Uuid>,
    Query(params): Query<ScheduleQueryParams>,
) -> Result<Json<Value>, AppError> {
    match (params.date, params.start) {
        (Some(date), None) => {
            let views = ledger
                .get_range(doctor_id, date, 1)
                .await
                .map_err(map_schedule_error)?;
            let view: &ScheduleView = views
                .first()
                .ok_or_else(|| AppError::Internal("empty schedule projection".to_string()))?;

            Ok(Json(json!(view)))
        }
        (None, Some(start)) => {
            let days = params.days.unwrap_or(7);
            let views = ledger
                .get_range(doctor_id, start, days)
                .await
                .map_err(map_schedule_error)?;

            Ok(Json(json!(views)))
        }
        _ => Err(AppError::Validation(
            "provide either date= or start= (with optional days=)".to_string(),
        )),
    }
}

/// Doctor-side full overwrite of one day's slot list.
#[axum::debug_handler]
pub async fn set_doctor_schedule(
    State(ledger): State<Arc<AvailabilityLedger>>,
    Path(doctor_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<SetDaySlotsRequest>,
) -> Result<Json<Value>, AppError> {
    let is_owner = user.id == doctor_id.to_string();
    let is_admin = user.role.as_deref() == Some("admin");

    if !is_owner && !is_admin {
        return Err(AppError::Auth(
            "Not authorized to edit this doctor's schedule".to_string(),
        ));
    }

    let schedule = ledger
        .set_day_slots(doctor_id, request.date, request.time_slots)
        .await
        .map_err(map_schedule_error)?;

    Ok(Json(json!({
        "success": true,
        "schedule": schedule,
    })))
}
