use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use catalog_cell::models::{Clinic, Doctor, RecordStatus, Specialty};
use catalog_cell::services::catalog::CatalogService;
use catalog_cell::services::store::MemoryCatalog;
use schedule_cell::services::ledger::AvailabilityLedger;
use schedule_cell::services::store::MemoryScheduleStore;

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

pub fn make_clinic() -> Clinic {
    let now = Utc::now();
    Clinic {
        id: Uuid::new_v4(),
        name: "Downtown Clinic".to_string(),
        address: "12 Main St".to_string(),
        description: None,
        status: RecordStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

pub fn make_specialty() -> Specialty {
    let now = Utc::now();
    Specialty {
        id: Uuid::new_v4(),
        name: "General practice".to_string(),
        description: None,
        image_url: None,
        status: RecordStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

pub struct LedgerHarness {
    pub ledger: Arc<AvailabilityLedger>,
    pub schedule_store: Arc<MemoryScheduleStore>,
    pub doctor: Doctor,
}

/// In-memory ledger wired to a catalog seeded with one doctor.
pub async fn ledger_harness() -> LedgerHarness {
    let catalog_store = Arc::new(MemoryCatalog::new());
    let clinic = make_clinic();
    let specialty = make_specialty();
    let doctor = make_doctor(clinic.id, specialty.id);

    catalog_store.insert_clinic(clinic).await;
    catalog_store.insert_specialty(specialty).await;
    catalog_store.insert_doctor(doctor.clone()).await;

    let schedule_store = Arc::new(MemoryScheduleStore::new());
    let ledger = Arc::new(AvailabilityLedger::new(
        CatalogService::new(catalog_store.clone()),
        schedule_store.clone(),
    ));

    LedgerHarness {
        ledger,
        schedule_store,
        doctor,
    }
}
