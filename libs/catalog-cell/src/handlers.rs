use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;

use crate::models::CatalogError;
use crate::services::catalog::CatalogService;

pub fn map_catalog_error(e: CatalogError) -> AppError {
    match e {
        CatalogError::DoctorNotFound => AppError::NotFound("Doctor not found".to_string()),
        CatalogError::PatientNotFound => AppError::NotFound("Patient not found".to_string()),
        CatalogError::ClinicNotFound => AppError::NotFound("Clinic not found".to_string()),
        CatalogError::SpecialtyNotFound => AppError::NotFound("Specialty not found".to_string()),
        CatalogError::DatabaseError(msg) => AppError::Database(msg),
    }
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(catalog): State<Arc<CatalogService>>,
) -> Result<Json<Value>, AppError> {
    let doctors = catalog.list_doctors().await.map_err(map_catalog_error)?;

    Ok(Json(json!({ "doctors": doctors })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(catalog): State<Arc<CatalogService>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let doctor = catalog.get_doctor(doctor_id).await.map_err(map_catalog_error)?;

    Ok(Json(json!({ "doctor": doctor })))
}

#[axum::debug_handler]
pub async fn list_specialties(
    State(catalog): State<Arc<CatalogService>>,
) -> Result<Json<Value>, AppError> {
    let specialties = catalog.list_specialties().await.map_err(map_catalog_error)?;

    Ok(Json(json!({ "specialties": specialties })))
}

#[axum::debug_handler]
pub async fn list_clinics(
    State(catalog): State<Arc<CatalogService>>,
) -> Result<Json<Value>, AppError> {
    let clinics = catalog.list_clinics().await.map_err(map_catalog_error)?;

    Ok(Json(json!({ "clinics": clinics })))
}
