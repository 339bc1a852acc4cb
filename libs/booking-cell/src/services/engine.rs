use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info};
use uuid::Uuid;

use catalog_cell::models::CatalogError;
use catalog_cell::services::catalog::CatalogService;
use schedule_cell::models::ScheduleError;
use schedule_cell::services::ledger::AvailabilityLedger;
use shared_database::StoreError;

use crate::models::{
    normalize_date, Booking, BookingError, BookingFilter, BookingStatus, CreateBookingRequest,
};
use crate::services::store::BookingStore;

/// Turns a booking request into a persisted booking plus a slot claim,
/// treated as one logical transaction: a claim that cannot be paired with
/// a booking row is rolled back before the error leaves this service.
pub struct BookingEngine {
    catalog: CatalogService,
    ledger: Arc<AvailabilityLedger>,
    store: Arc<dyn BookingStore>,
}

impl BookingEngine {
    pub fn new(
        catalog: CatalogService,
        ledger: Arc<AvailabilityLedger>,
        store: Arc<dyn BookingStore>,
    ) -> Self {
        Self {
            catalog,
            ledger,
            store,
        }
    }

    pub async fn create_booking(
        &self,
        request: CreateBookingRequest,
    ) -> Result<Booking, BookingError> {
        // Presence validation names every missing field at once.
        let mut missing = Vec::new();
        if request.patient_id.is_none() {
            missing.push("patientId");
        }
        if request.doctor_id.is_none() {
            missing.push("doctorId");
        }
        if request.date.is_none() {
            missing.push("date");
        }
        if request.time_slot.is_none() {
            missing.push("timeSlot");
        }
        if request.reason.as_deref().map_or(true, |r| r.trim().is_empty()) {
            missing.push("reason");
        }
        if !missing.is_empty() {
            return Err(BookingError::ValidationError(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        let patient_id = request.patient_id.unwrap();
        let doctor_id = request.doctor_id.unwrap();
        let raw_date = request.date.unwrap();
        let time_slot = request.time_slot.unwrap();
        let reason = request.reason.unwrap();

        info!("Creating booking for patient {} with doctor {}", patient_id, doctor_id);

        let patient = self.catalog.get_patient(patient_id).await.map_err(map_catalog_error)?;
        let doctor = self.catalog.get_doctor(doctor_id).await.map_err(map_catalog_error)?;

        // The doctor's home clinic backs the booking unless the request
        // names one explicitly.
        let clinic_id = request.clinic_id.unwrap_or(doctor.clinic_id);
        let clinic = self.catalog.get_clinic(clinic_id).await.map_err(map_catalog_error)?;

        if let Some(existing) = self
            .store
            .find_active_for_pair(patient.id, doctor.id)
            .await
            .map_err(map_store_error)?
        {
            debug!(
                "Booking refused: patient {} already holds booking {} ({}) with doctor {}",
                patient.id, existing.id, existing.status, doctor.id
            );
            return Err(BookingError::DuplicateBooking);
        }

        let date = normalize_date(&raw_date)?;

        let claimed = self
            .ledger
            .claim_slot(doctor.id, date, &time_slot)
            .await
            .map_err(map_schedule_error)?;

        let now = Utc::now();
        let booking = Booking {
            id: Uuid::new_v4(),
            patient_id: patient.id,
            doctor_id: doctor.id,
            clinic_id: clinic.id,
            schedule_id: claimed.schedule_id,
            date,
            time_slot: claimed.slot.time.clone(),
            slot_id: claimed.slot.id.clone(),
            reason,
            status: BookingStatus::Pending,
            notes: None,
            payment_url: None,
            payment_ref: None,
            created_at: now,
            updated_at: now,
        };

        match self.store.insert_active_unique(booking).await {
            Ok(created) => {
                info!(
                    "Booking {} created for slot {} on {} (doctor {})",
                    created.id, created.slot_id, created.date, created.doctor_id
                );
                Ok(created)
            }
            Err(insert_err) => {
                // The slot is claimed but no booking backs it; release it
                // before surfacing the failure.
                if let Err(release_err) = self
                    .ledger
                    .release_slot(doctor.id, date, &claimed.slot.id)
                    .await
                {
                    error!(
                        "Failed to release slot {} after booking insert failure: {}",
                        claimed.slot.id, release_err
                    );
                }

                Err(match insert_err {
                    StoreError::Conflict(_) => BookingError::DuplicateBooking,
                    other => map_store_error(other),
                })
            }
        }
    }

    pub async fn get_booking(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        self.store
            .get(booking_id)
            .await
            .map_err(map_store_error)?
            .ok_or(BookingError::BookingNotFound)
    }

    pub async fn search_bookings(
        &self,
        filter: BookingFilter,
    ) -> Result<Vec<Booking>, BookingError> {
        self.store.search(&filter).await.map_err(map_store_error)
    }
}

fn map_catalog_error(e: CatalogError) -> BookingError {
    match e {
        CatalogError::PatientNotFound => BookingError::PatientNotFound,
        CatalogError::DoctorNotFound => BookingError::DoctorNotFound,
        CatalogError::ClinicNotFound => BookingError::ClinicNotFound,
        other => BookingError::DatabaseError(other.to_string()),
    }
}

fn map_schedule_error(e: ScheduleError) -> BookingError {
    match e {
        ScheduleError::DoctorNotFound => BookingError::DoctorNotFound,
        ScheduleError::SlotNotFound(selector) => BookingError::SlotNotFound(selector),
        ScheduleError::SlotUnavailable(label) => BookingError::SlotUnavailable(label),
        ScheduleError::ClaimContention => {
            BookingError::SlotUnavailable("claim contention".to_string())
        }
        ScheduleError::ValidationError(msg) => BookingError::ValidationError(msg),
        ScheduleError::DatabaseError(msg) => BookingError::DatabaseError(msg),
    }
}

fn map_store_error(e: StoreError) -> BookingError {
    match e {
        StoreError::NotFound => BookingError::BookingNotFound,
        StoreError::Conflict(msg) => BookingError::DatabaseError(msg),
        StoreError::Backend(msg) => BookingError::DatabaseError(msg),
    }
}
