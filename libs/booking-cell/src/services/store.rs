use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::{PostgrestClient, StoreError};

use crate::models::{Booking, BookingFilter};

/// Persistence seam for bookings. The insert enforces the exclusivity
/// invariant: at most one booking in an active status (pending/confirmed)
/// per (patient, doctor) pair, atomically with the write.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<Booking>, StoreError>;

    async fn find_active_for_pair(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
    ) -> Result<Option<Booking>, StoreError>;

    /// Insert a booking, refusing with `StoreError::Conflict` when an
    /// active booking for the same (patient, doctor) pair already exists.
    async fn insert_active_unique(&self, booking: Booking) -> Result<Booking, StoreError>;

    async fn update(&self, booking: &Booking) -> Result<Booking, StoreError>;

    async fn search(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError>;
}

pub struct PostgrestBookingStore {
    client: Arc<PostgrestClient>,
}

impl PostgrestBookingStore {
    pub fn new(client: Arc<PostgrestClient>) -> Self {
        Self { client }
    }

    fn parse_rows(rows: Vec<Value>) -> Result<Vec<Booking>, StoreError> {
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| StoreError::Backend(format!("failed to parse booking row: {}", e)))
            })
            .collect()
    }
}

#[async_trait]
impl BookingStore for PostgrestBookingStore {
    async fn get(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        let path = format!("/rest/v1/bookings?id=eq.{}", id);
        let rows: Vec<Value> = self.client.request(Method::GET, &path, None).await?;

        Ok(Self::parse_rows(rows)?.into_iter().next())
    }

    async fn find_active_for_pair(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
    ) -> Result<Option<Booking>, StoreError> {
        let path = format!(
            "/rest/v1/bookings?patientId=eq.{}&doctorId=eq.{}&status=in.(pending,confirmed)",
            patient_id, doctor_id
        );
        let rows: Vec<Value> = self.client.request(Method::GET, &path, None).await?;

        Ok(Self::parse_rows(rows)?.into_iter().next())
    }

    async fn insert_active_unique(&self, booking: Booking) -> Result<Booking, StoreError> {
        // A partial unique index on (patientId, doctorId) where status is
        // active backs this up; a racing insert surfaces as HTTP 409.
        let row = serde_json::to_value(&booking)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rows = self.client.insert("bookings", row).await?;
        Self::parse_rows(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("insert returned no representation".to_string()))
    }

    async fn update(&self, booking: &Booking) -> Result<Booking, StoreError> {
        let filter = format!("id=eq.{}", booking.id);
        let patch = json!({
            "status": booking.status,
            "notes": booking.notes,
            "paymentUrl": booking.payment_url,
            "paymentRef": booking.payment_ref,
            "updatedAt": Utc::now(),
        });

        let rows = self.client.patch_guarded("bookings", &filter, patch).await?;
        Self::parse_rows(rows)?
            .into_iter()
            .next()
            .ok_or(StoreError::NotFound)
    }

    async fn search(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError> {
        let mut query_parts = Vec::new();

        if let Some(patient_id) = filter.patient_id {
            query_parts.push(format!("patientId=eq.{}", patient_id));
        }
        if let Some(doctor_id) = filter.doctor_id {
            query_parts.push(format!("doctorId=eq.{}", doctor_id));
        }
        if let Some(status) = filter.status {
            query_parts.push(format!("status=eq.{}", status));
        }
        query_parts.push("order=createdAt.desc".to_string());

        let path = format!("/rest/v1/bookings?{}", query_parts.join("&"));
        let rows: Vec<Value> = self.client.request(Method::GET, &path, None).await?;

        Self::parse_rows(rows)
    }
}

/// In-memory booking store. The exclusivity check and the insert happen
/// under one write lock, mirroring the partial unique index of the
/// relational store.
#[derive(Default)]
pub struct MemoryBookingStore {
    rows: RwLock<HashMap<Uuid, Booking>>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookingStore for MemoryBookingStore {
    async fn get(&self, id: Uuid) -> Result<Option<Booking>, StoreError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn find_active_for_pair(
        &self,
        patient_id: Uuid,
        doctor_id: Uuid,
    ) -> Result<Option<Booking>, StoreError> {
        Ok(self
            .rows
            .read()
            .await
            .values()
            .find(|b| {
                b.patient_id == patient_id && b.doctor_id == doctor_id && b.status.is_active()
            })
            .cloned())
    }

    async fn insert_active_unique(&self, booking: Booking) -> Result<Booking, StoreError> {
        let mut rows = self.rows.write().await;

        let has_active = rows.values().any(|b| {
            b.patient_id == booking.patient_id
                && b.doctor_id == booking.doctor_id
                && b.status.is_active()
        });
        if has_active {
            return Err(StoreError::Conflict(
                "active booking exists for this patient and doctor".to_string(),
            ));
        }

        rows.insert(booking.id, booking.clone());
        Ok(booking)
    }

    async fn update(&self, booking: &Booking) -> Result<Booking, StoreError> {
        let mut rows = self.rows.write().await;

        let stored = rows.get_mut(&booking.id).ok_or(StoreError::NotFound)?;
        *stored = booking.clone();
        stored.updated_at = Utc::now();

        Ok(stored.clone())
    }

    async fn search(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError> {
        let rows = self.rows.read().await;
        let mut bookings: Vec<Booking> = rows
            .values()
            .filter(|b| filter.patient_id.map_or(true, |id| b.patient_id == id))
            .filter(|b| filter.doctor_id.map_or(true, |id| b.doctor_id == id))
            .filter(|b| filter.status.map_or(true, |s| b.status == s))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }
}
