use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::{PostgrestClient, StoreError};

use crate::models::Schedule;

/// Persistence seam for schedule rows. `(doctor_id, date)` is unique;
/// every write goes through either the uniqueness-enforcing insert or the
/// version-guarded update, so lost updates cannot happen.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn find(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Option<Schedule>, StoreError>;

    async fn find_range(
        &self,
        doctor_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Schedule>, StoreError>;

    /// Insert a new row; `StoreError::Conflict` when the (doctor, date)
    /// pair already exists.
    async fn insert_unique(&self, schedule: Schedule) -> Result<Schedule, StoreError>;

    /// Persist `schedule`'s slot list if the stored row still carries
    /// `seen_version`; `StoreError::Conflict` on a lost compare-and-swap.
    async fn update_guarded(
        &self,
        schedule: &Schedule,
        seen_version: i64,
    ) -> Result<Schedule, StoreError>;
}

pub struct PostgrestScheduleStore {
    client: Arc<PostgrestClient>,
}

impl PostgrestScheduleStore {
    pub fn new(client: Arc<PostgrestClient>) -> Self {
        Self { client }
    }

    fn parse_rows(rows: Vec<Value>) -> Result<Vec<Schedule>, StoreError> {
        rows.into_iter()
            .map(|row| {
                serde_json::from_value(row)
                    .map_err(|e| StoreError::Backend(format!("failed to parse schedule row: {}", e)))
            })
            .collect()
    }
}

#[async_trait]
impl ScheduleStore for PostgrestScheduleStore {
    async fn find(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Option<Schedule>, StoreError> {
        let path = format!("/rest/v1/schedules?doctorId=eq.{}&date=eq.{}", doctor_id, date);
        let rows: Vec<Value> = self.client.request(Method::GET, &path, None).await?;

        Ok(Self::parse_rows(rows)?.into_iter().next())
    }

    async fn find_range(
        &self,
        doctor_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Schedule>, StoreError> {
        let path = format!(
            "/rest/v1/schedules?doctorId=eq.{}&date=gte.{}&date=lte.{}&order=date.asc",
            doctor_id, start, end
        );
        let rows: Vec<Value> = self.client.request(Method::GET, &path, None).await?;

        Self::parse_rows(rows)
    }

    async fn insert_unique(&self, schedule: Schedule) -> Result<Schedule, StoreError> {
        // The store carries a unique index on (doctorId, date); a racing
        // creator surfaces as HTTP 409 from the insert.
        let row = serde_json::to_value(&schedule)
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rows = self.client.insert("schedules", row).await?;
        Self::parse_rows(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Backend("insert returned no representation".to_string()))
    }

    async fn update_guarded(
        &self,
        schedule: &Schedule,
        seen_version: i64,
    ) -> Result<Schedule, StoreError> {
        let filter = format!("id=eq.{}&version=eq.{}", schedule.id, seen_version);
        let patch = json!({
            "timeSlots": schedule.time_slots,
            "version": seen_version + 1,
            "updatedAt": Utc::now(),
        });

        let rows = self.client.patch_guarded("schedules", &filter, patch).await?;
        Self::parse_rows(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Conflict("schedule version changed".to_string()))
    }
}

/// In-memory schedule store: a single lock over the row map gives the same
/// at-most-one-winner semantics the relational store provides through its
/// unique index and version filter.
#[derive(Default)]
pub struct MemoryScheduleStore {
    rows: RwLock<HashMap<(Uuid, NaiveDate), Schedule>>,
}

impl MemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScheduleStore for MemoryScheduleStore {
    async fn find(&self, doctor_id: Uuid, date: NaiveDate) -> Result<Option<Schedule>, StoreError> {
        Ok(self.rows.read().await.get(&(doctor_id, date)).cloned())
    }

    async fn find_range(
        &self,
        doctor_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Schedule>, StoreError> {
        let rows = self.rows.read().await;
        let mut schedules: Vec<Schedule> = rows
            .values()
            .filter(|s| s.doctor_id == doctor_id && s.date >= start && s.date <= end)
            .cloned()
            .collect();
        schedules.sort_by_key(|s| s.date);
        Ok(schedules)
    }

    async fn insert_unique(&self, schedule: Schedule) -> Result<Schedule, StoreError> {
        let mut rows = self.rows.write().await;
        let key = (schedule.doctor_id, schedule.date);

        if rows.contains_key(&key) {
            return Err(StoreError::Conflict("schedule already exists".to_string()));
        }

        rows.insert(key, schedule.clone());
        Ok(schedule)
    }

    async fn update_guarded(
        &self,
        schedule: &Schedule,
        seen_version: i64,
    ) -> Result<Schedule, StoreError> {
        let mut rows = self.rows.write().await;
        let key = (schedule.doctor_id, schedule.date);

        let stored = rows
            .get_mut(&key)
            .ok_or(StoreError::NotFound)?;

        if stored.version != seen_version {
            return Err(StoreError::Conflict("schedule version changed".to_string()));
        }

        stored.time_slots = schedule.time_slots.clone();
        stored.version = seen_version + 1;
        stored.updated_at = Utc::now();

        Ok(stored.clone())
    }
}
