use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::{PostgrestClient, StoreError};

use crate::models::{Clinic, Doctor, Patient, Specialty};

/// Read access to the catalog records owned by the admin CRUD surface.
/// Lookups return tombstoned records too; callers decide visibility.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn get_doctor(&self, id: Uuid) -> Result<Option<Doctor>, StoreError>;
    async fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError>;
    async fn get_specialty(&self, id: Uuid) -> Result<Option<Specialty>, StoreError>;
    async fn list_specialties(&self) -> Result<Vec<Specialty>, StoreError>;
    async fn get_clinic(&self, id: Uuid) -> Result<Option<Clinic>, StoreError>;
    async fn list_clinics(&self) -> Result<Vec<Clinic>, StoreError>;
    async fn get_patient(&self, id: Uuid) -> Result<Option<Patient>, StoreError>;
}

pub struct PostgrestCatalog {
    client: Arc<PostgrestClient>,
}

impl PostgrestCatalog {
    pub fn new(client: Arc<PostgrestClient>) -> Self {
        Self { client }
    }

    async fn fetch_one<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        id: Uuid,
    ) -> Result<Option<T>, StoreError> {
        let path = format!("/rest/v1/{}?id=eq.{}", table, id);
        let rows: Vec<Value> = self.client.request(Method::GET, &path, None).await?;

        match rows.into_iter().next() {
            Some(row) => serde_json::from_value(row)
                .map(Some)
                .map_err(|e| StoreError::Backend(format!("failed to parse {} row: {}", table, e))),
            None => Ok(None),
        }
    }

    async fn fetch_active<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
    ) -> Result<Vec<T>, StoreError> {
        let path = format!("/rest/v1/{}?status=eq.active&order=createdAt.asc", table);
        let rows: Vec<Value> = self.client.request(Method::GET, &path, None).await?;

        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| StoreError::Backend(format!("failed to parse {} row: {}", table, e)))
            })
            .collect()
    }
}

#[async_trait]
impl CatalogStore for PostgrestCatalog {
    async fn get_doctor(&self, id: Uuid) -> Result<Option<Doctor>, StoreError> {
        self.fetch_one("doctors", id).await
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError> {
        self.fetch_active("doctors").await
    }

    async fn get_specialty(&self, id: Uuid) -> Result<Option<Specialty>, StoreError> {
        self.fetch_one("specialties", id).await
    }

    async fn list_specialties(&self) -> Result<Vec<Specialty>, StoreError> {
        self.fetch_active("specialties").await
    }

    async fn get_clinic(&self, id: Uuid) -> Result<Option<Clinic>, StoreError> {
        self.fetch_one("clinics", id).await
    }

    async fn list_clinics(&self) -> Result<Vec<Clinic>, StoreError> {
        self.fetch_active("clinics").await
    }

    async fn get_patient(&self, id: Uuid) -> Result<Option<Patient>, StoreError> {
        self.fetch_one("patients", id).await
    }
}

/// In-memory catalog for tests and local development. Seed it with the
/// `insert_*` helpers before wiring it into services.
#[derive(Default)]
pub struct MemoryCatalog {
    doctors: RwLock<HashMap<Uuid, Doctor>>,
    specialties: RwLock<HashMap<Uuid, Specialty>>,
    clinics: RwLock<HashMap<Uuid, Clinic>>,
    patients: RwLock<HashMap<Uuid, Patient>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_doctor(&self, doctor: Doctor) {
        self.doctors.write().await.insert(doctor.id, doctor);
    }

    pub async fn insert_specialty(&self, specialty: Specialty) {
        self.specialties.write().await.insert(specialty.id, specialty);
    }

    pub async fn insert_clinic(&self, clinic: Clinic) {
        self.clinics.write().await.insert(clinic.id, clinic);
    }

    pub async fn insert_patient(&self, patient: Patient) {
        self.patients.write().await.insert(patient.id, patient);
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn get_doctor(&self, id: Uuid) -> Result<Option<Doctor>, StoreError> {
        Ok(self.doctors.read().await.get(&id).cloned())
    }

    async fn list_doctors(&self) -> Result<Vec<Doctor>, StoreError> {
        let mut doctors: Vec<Doctor> = self
            .doctors
            .read()
            .await
            .values()
            .filter(|d| d.status.is_active())
            .cloned()
            .collect();
        doctors.sort_by_key(|d| d.created_at);
        Ok(doctors)
    }

    async fn get_specialty(&self, id: Uuid) -> Result<Option<Specialty>, StoreError> {
        Ok(self.specialties.read().await.get(&id).cloned())
    }

    async fn list_specialties(&self) -> Result<Vec<Specialty>, StoreError> {
        let mut specialties: Vec<Specialty> = self
            .specialties
            .read()
            .await
            .values()
            .filter(|s| s.status.is_active())
            .cloned()
            .collect();
        specialties.sort_by_key(|s| s.created_at);
        Ok(specialties)
    }

    async fn get_clinic(&self, id: Uuid) -> Result<Option<Clinic>, StoreError> {
        Ok(self.clinics.read().await.get(&id).cloned())
    }

    async fn list_clinics(&self) -> Result<Vec<Clinic>, StoreError> {
        let mut clinics: Vec<Clinic> = self
            .clinics
            .read()
            .await
            .values()
            .filter(|c| c.status.is_active())
            .cloned()
            .collect();
        clinics.sort_by_key(|c| c.created_at);
        Ok(clinics)
    }

    async fn get_patient(&self, id: Uuid) -> Result<Option<Patient>, StoreError> {
        Ok(self.patients.read().await.get(&id).cloned())
    }
}
