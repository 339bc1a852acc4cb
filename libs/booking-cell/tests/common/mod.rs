// Shared across several test binaries; not every binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use booking_cell::models::CreateBookingRequest;
use booking_cell::services::engine::BookingEngine;
use booking_cell::services::lifecycle::BookingLifecycle;
use booking_cell::services::notify::RecordingNotifier;
use booking_cell::services::store::MemoryBookingStore;
use catalog_cell::models::{Clinic, Doctor, Patient, RecordStatus, Specialty};
use catalog_cell::services::catalog::CatalogService;
use catalog_cell::services::store::MemoryCatalog;
use schedule_cell::services::ledger::AvailabilityLedger;
use schedule_cell::services::store::MemoryScheduleStore;

pub struct BookingHarness {
    pub engine: Arc<BookingEngine>,
    pub lifecycle: Arc<BookingLifecycle>,
    pub ledger: Arc<AvailabilityLedger>,
    pub catalog_store: Arc<MemoryCatalog>,
    pub schedule_store: Arc<MemoryScheduleStore>,
    pub booking_store: Arc<MemoryBookingStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub patient: Patient,
    pub doctor: Doctor,
    pub clinic: Clinic,
}

impl BookingHarness {
    /// A complete, valid request for the seeded patient/doctor.
    pub fn request(&self, date: &str, time_slot: &str) -> CreateBookingRequest {
        CreateBookingRequest {
            patient_id: Some(self.patient.id),
            doctor_id: Some(self.doctor.id),
            clinic_id: None,
            date: Some(date.to_string()),
            time_slot: Some(time_slot.to_string()),
            reason: Some("khám tổng quát".to_string()),
        }
    }

    pub async fn add_patient(&self) -> Patient {
        let patient = make_patient();
        self.catalog_store.insert_patient(patient.clone()).await;
        patient
    }
}

pub fn make_doctor(clinic_id: Uuid, specialty_id: Uuid) -> Doctor {
    let now = Utc::now();
    Doctor {
        id: Uuid::new_v4(),
        first_name: "An".to_string(),
        last_name: "Nguyen".to_string(),
        email: "an.nguyen@example.com".to_string(),
        specialty_id,
        clinic_id,
        price: 300_000,
        position: Some("Consultant".to_string()),
        bio: None,
        status: RecordStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

pub fn make_patient() -> Patient {
    let now = Utc::now();
    Patient {
        id: Uuid::new_v4(),
        first_name: "Binh".to_string(),
        last_name: "Tran".to_string(),
        email: "binh.tran@example.com".to_string(),
        phone: None,
        status: RecordStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

pub async fn booking_harness() -> BookingHarness {
    let now = Utc::now();
    let catalog_store = Arc::new(MemoryCatalog::new());

    let clinic = Clinic {
        id: Uuid::new_v4(),
        name: "Downtown Clinic".to_string(),
        address: "12 Main St".to_string(),
        description: None,
        status: RecordStatus::Active,
        created_at: now,
        updated_at: now,
    };
    let specialty = Specialty {
        id: Uuid::new_v4(),
        name: "General practice".to_string(),
        description: None,
        image_url: None,
        status: RecordStatus::Active,
        created_at: now,
        updated_at: now,
    };
    let doctor = make_doctor(clinic.id, specialty.id);
    let patient = make_patient();

    catalog_store.insert_clinic(clinic.clone()).await;
    catalog_store.insert_specialty(specialty).await;
    catalog_store.insert_doctor(doctor.clone()).await;
    catalog_store.insert_patient(patient.clone()).await;

    let catalog = CatalogService::new(catalog_store.clone());
    let schedule_store = Arc::new(MemoryScheduleStore::new());
    let ledger = Arc::new(AvailabilityLedger::new(catalog.clone(), schedule_store.clone()));

    let booking_store = Arc::new(MemoryBookingStore::new());
    let notifier = Arc::new(RecordingNotifier::new());

    let engine = Arc::new(BookingEngine::new(
        catalog,
        ledger.clone(),
        booking_store.clone(),
    ));
    let lifecycle = Arc::new(BookingLifecycle::new(
        booking_store.clone(),
        ledger.clone(),
        notifier.clone(),
    ));

    BookingHarness {
        engine,
        lifecycle,
        ledger,
        catalog_store,
        schedule_store,
        booking_store,
        notifier,
        patient,
        doctor,
        clinic,
    }
}
