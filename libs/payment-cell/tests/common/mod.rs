use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use booking_cell::models::{Booking, CreateBookingRequest};
use booking_cell::services::engine::BookingEngine;
use booking_cell::services::lifecycle::BookingLifecycle;
use booking_cell::services::notify::RecordingNotifier;
use booking_cell::services::store::MemoryBookingStore;
use catalog_cell::models::{Clinic, Doctor, Patient, RecordStatus, Specialty};
use catalog_cell::services::catalog::CatalogService;
use catalog_cell::services::store::MemoryCatalog;
use payment_cell::services::gateway::PaymentGateway;
use schedule_cell::services::ledger::AvailabilityLedger;
use schedule_cell::services::store::MemoryScheduleStore;
use shared_config::AppConfig;
use shared_utils::test_utils::TestConfig;

pub struct PaymentHarness {
    pub gateway: PaymentGateway,
    pub engine: Arc<BookingEngine>,
    pub lifecycle: Arc<BookingLifecycle>,
    pub booking_store: Arc<MemoryBookingStore>,
    pub schedule_store: Arc<MemoryScheduleStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub config: Arc<AppConfig>,
    pub patient: Patient,
    pub doctor: Doctor,
}

impl PaymentHarness {
    pub async fn pending_booking(&self) -> Booking {
        self.engine
            .create_booking(CreateBookingRequest {
                patient_id: Some(self.patient.id),
                doctor_id: Some(self.doctor.id),
                clinic_id: None,
                date: Some("2025-11-24".to_string()),
                time_slot: Some("3".to_string()),
                reason: Some("khám tổng quát".to_string()),
            })
            .await
            .unwrap()
    }
}

pub async fn payment_harness() -> PaymentHarness {
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
    let doctor = Doctor {
        id: Uuid::new_v4(),
        first_name: "An".to_string(),
        last_name: "Nguyen".to_string(),
        email: "an.nguyen@example.com".to_string(),
        specialty_id: specialty.id,
        clinic_id: clinic.id,
        price: 300_000,
        position: None,
        bio: None,
        status: RecordStatus::Active,
        created_at: now,
        updated_at: now,
    };
    let patient = Patient {
        id: Uuid::new_v4(),
        first_name: "Binh".to_string(),
        last_name: "Tran".to_string(),
        email: "binh.tran@example.com".to_string(),
        phone: None,
        status: RecordStatus::Active,
        created_at: now,
        updated_at: now,
    };

    catalog_store.insert_clinic(clinic).await;
    catalog_store.insert_specialty(specialty).await;
    catalog_store.insert_doctor(doctor.clone()).await;
    catalog_store.insert_patient(patient.clone()).await;

    let catalog = CatalogService::new(catalog_store);
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
        ledger,
        notifier.clone(),
    ));

    let config = TestConfig::default().to_arc();
    let gateway = PaymentGateway::new(booking_store.clone(), lifecycle.clone(), config.clone());

    PaymentHarness {
        gateway,
        engine,
        lifecycle,
        booking_store,
        schedule_store,
        notifier,
        config,
        patient,
        doctor,
    }
}
