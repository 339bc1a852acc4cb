use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use shared_database::StoreError;

use crate::models::{CatalogError, Clinic, Doctor, Patient, Specialty};
use crate::services::store::CatalogStore;

/// Read-side facade over the catalog records. Tombstoned records are
/// filtered here so no caller ever sees a logically deleted row.
#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CatalogStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub async fn get_doctor(&self, id: Uuid) -> Result<Doctor, CatalogError> {
        debug!("Fetching doctor: {}", id);

        let doctor = self
            .store
            .get_doctor(id)
            .await
            .map_err(map_store_error)?
            .filter(|d| d.status.is_active())
            .ok_or(CatalogError::DoctorNotFound)?;

        Ok(doctor)
    }

    pub async fn get_patient(&self, id: Uuid) -> Result<Patient, CatalogError> {
        debug!("Fetching patient: {}", id);

        let patient = self
            .store
            .get_patient(id)
            .await
            .map_err(map_store_error)?
            .filter(|p| p.status.is_active())
            .ok_or(CatalogError::PatientNotFound)?;

        Ok(patient)
    }

    pub async fn get_clinic(&self, id: Uuid) -> Result<Clinic, CatalogError> {
        debug!("Fetching clinic: {}", id);

        let clinic = self
            .store
            .get_clinic(id)
            .await
            .map_err(map_store_error)?
            .filter(|c| c.status.is_active())
            .ok_or(CatalogError::ClinicNotFound)?;

        Ok(clinic)
    }

    pub async fn get_specialty(&self, id: Uuid) -> Result<Specialty, CatalogError> {
        let specialty = self
            .store
            .get_specialty(id)
            .await
            .map_err(map_store_error)?
            .filter(|s| s.status.is_active())
            .ok_or(CatalogError::SpecialtyNotFound)?;

        Ok(specialty)
    }

    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, CatalogError> {
        self.store.list_doctors().await.map_err(map_store_error)
    }

    pub async fn list_specialties(&self) -> Result<Vec<Specialty>, CatalogError> {
        self.store.list_specialties().await.map_err(map_store_error)
    }

    pub async fn list_clinics(&self) -> Result<Vec<Clinic>, CatalogError> {
        self.store.list_clinics().await.map_err(map_store_error)
    }
}

fn map_store_error(e: StoreError) -> CatalogError {
    CatalogError::DatabaseError(e.to_string())
}
