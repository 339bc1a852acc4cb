use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use tracing::{debug, info, warn};
use uuid::Uuid;

use catalog_cell::models::CatalogError;
use catalog_cell::services::catalog::CatalogService;
use shared_database::StoreError;

use crate::models::{
    ClaimedSlot, Schedule, ScheduleError, ScheduleView, TimeSlot,
};
use crate::services::store::ScheduleStore;

/// Retry bound for the load-mutate-CAS loops. Contention on one schedule
/// row resolves within a couple of rounds; anything past this means the
/// slot was taken or the store is misbehaving.
const CAS_RETRY_LIMIT: usize = 5;

/// Resolve a slot selector against a day's slot list.
///
/// Strategies apply in a fixed order, first match in list order wins:
/// 1. exact slot id,
/// 2. exact time label,
/// 3. containment between the whitespace-stripped, lowercased label and
///    the equally normalized selector (either direction), tolerating
///    client-side label drift such as "10:00-11:00" for "10:00 - 11:00".
pub fn resolve_slot<'a>(slots: &'a [TimeSlot], selector: &str) -> Option<&'a TimeSlot> {
    resolve_slot_index(slots, selector).map(|i| &slots[i])
}

pub fn resolve_slot_index(slots: &[TimeSlot], selector: &str) -> Option<usize> {
    if let Some(index) = slots.iter().position(|s| s.id == selector) {
        return Some(index);
    }

    if let Some(index) = slots.iter().position(|s| s.time == selector) {
        return Some(index);
    }

    let needle = normalize_label(selector);
    if needle.is_empty() {
        return None;
    }

    slots.iter().position(|s| {
        let label = normalize_label(&s.time);
        label.contains(&needle) || needle.contains(&label)
    })
}

fn normalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Source of truth for what can be booked: per doctor, per calendar date,
/// a fixed set of named slots, each independently claimable.
pub struct AvailabilityLedger {
    catalog: CatalogService,
    store: Arc<dyn ScheduleStore>,
}

impl AvailabilityLedger {
    pub fn new(catalog: CatalogService, store: Arc<dyn ScheduleStore>) -> Self {
        Self { catalog, store }
    }

    /// Returns the persisted schedule for (doctor, date), creating it from
    /// the default template on first access. Racing creators converge on
    /// the row that won the unique insert.
    pub async fn get_or_create(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
    ) -> Result<Schedule, ScheduleError> {
        self.verify_doctor(doctor_id).await?;

        if let Some(existing) = self
            .store
            .find(doctor_id, date)
            .await
            .map_err(map_store_error)?
        {
            return Ok(existing);
        }

        let fresh = Schedule::with_default_template(doctor_id, date);
        match self.store.insert_unique(fresh).await {
            Ok(created) => {
                debug!("Created schedule {} for doctor {} on {}", created.id, doctor_id, date);
                Ok(created)
            }
            Err(StoreError::Conflict(_)) => self
                .store
                .find(doctor_id, date)
                .await
                .map_err(map_store_error)?
                .ok_or_else(|| {
                    ScheduleError::DatabaseError("schedule vanished after insert conflict".to_string())
                }),
            Err(e) => Err(map_store_error(e)),
        }
    }

    /// Read-only projection over `days` consecutive dates starting at
    /// `start`. Dates with no persisted row get the default template with a
    /// null id; nothing is written.
    pub async fn get_range(
        &self,
        doctor_id: Uuid,
        start: NaiveDate,
        days: i64,
    ) -> Result<Vec<ScheduleView>, ScheduleError> {
        if days < 1 {
            return Err(ScheduleError::ValidationError(
                "days must be at least 1".to_string(),
            ));
        }

        self.verify_doctor(doctor_id).await?;

        let end = start + Duration::days(days - 1);
        let persisted = self
            .store
            .find_range(doctor_id, start, end)
            .await
            .map_err(map_store_error)?;

        let views = (0..days)
            .map(|offset| {
                let date = start + Duration::days(offset);
                persisted
                    .iter()
                    .find(|s| s.date == date)
                    .map(ScheduleView::from_schedule)
                    .unwrap_or_else(|| ScheduleView::synthesized(doctor_id, date))
            })
            .collect();

        Ok(views)
    }

    /// Atomically claim the slot matching `selector`. Exactly one of any
    /// number of concurrent claims on the same slot succeeds; the rest see
    /// `SlotUnavailable`.
    pub async fn claim_slot(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        selector: &str,
    ) -> Result<ClaimedSlot, ScheduleError> {
        for attempt in 0..CAS_RETRY_LIMIT {
            let mut schedule = self.get_or_create(doctor_id, date).await?;
            let seen_version = schedule.version;

            let index = resolve_slot_index(&schedule.time_slots, selector)
                .ok_or_else(|| ScheduleError::SlotNotFound(selector.to_string()))?;

            if !schedule.time_slots[index].is_available {
                return Err(ScheduleError::SlotUnavailable(
                    schedule.time_slots[index].time.clone(),
                ));
            }

            schedule.time_slots[index].is_available = false;

            match self.store.update_guarded(&schedule, seen_version).await {
                Ok(saved) => {
                    info!(
                        "Claimed slot {} ({}) for doctor {} on {}",
                        saved.time_slots[index].id, saved.time_slots[index].time, doctor_id, date
                    );
                    return Ok(ClaimedSlot {
                        schedule_id: saved.id,
                        slot: saved.time_slots[index].clone(),
                    });
                }
                Err(StoreError::Conflict(_)) => {
                    debug!(
                        "Slot claim lost the row version race (attempt {}), reloading",
                        attempt + 1
                    );
                    continue;
                }
                Err(e) => return Err(map_store_error(e)),
            }
        }

        Err(ScheduleError::ClaimContention)
    }

    /// Mark a previously claimed slot available again. Idempotent: an
    /// already-open slot, an unknown slot id, or a missing schedule row all
    /// resolve to a logged no-op.
    pub async fn release_slot(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        slot_id: &str,
    ) -> Result<(), ScheduleError> {
        for _ in 0..CAS_RETRY_LIMIT {
            let schedule = match self
                .store
                .find(doctor_id, date)
                .await
                .map_err(map_store_error)?
            {
                Some(s) => s,
                None => {
                    warn!(
                        "Release for doctor {} on {} found no schedule row, nothing to do",
                        doctor_id, date
                    );
                    return Ok(());
                }
            };

            let seen_version = schedule.version;
            let mut mutated = schedule;

            let Some(index) = mutated.time_slots.iter().position(|s| s.id == slot_id) else {
                warn!(
                    "Release for doctor {} on {} names unknown slot {}, nothing to do",
                    doctor_id, date, slot_id
                );
                return Ok(());
            };

            if mutated.time_slots[index].is_available {
                return Ok(());
            }

            mutated.time_slots[index].is_available = true;

            match self.store.update_guarded(&mutated, seen_version).await {
                Ok(_) => {
                    info!("Released slot {} for doctor {} on {}", slot_id, doctor_id, date);
                    return Ok(());
                }
                Err(StoreError::Conflict(_)) => continue,
                Err(e) => return Err(map_store_error(e)),
            }
        }

        Err(ScheduleError::ClaimContention)
    }

    /// Doctor-side full overwrite of a day's slot list. No merge: the given
    /// list replaces whatever was there.
    pub async fn set_day_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        slots: Vec<TimeSlot>,
    ) -> Result<Schedule, ScheduleError> {
        self.verify_doctor(doctor_id).await?;

        let mut seen_ids = std::collections::HashSet::new();
        for slot in &slots {
            if slot.id.trim().is_empty() {
                return Err(ScheduleError::ValidationError(
                    "slot ids must be non-empty".to_string(),
                ));
            }
            if !seen_ids.insert(slot.id.clone()) {
                return Err(ScheduleError::ValidationError(format!(
                    "duplicate slot id: {}",
                    slot.id
                )));
            }
        }

        for _ in 0..CAS_RETRY_LIMIT {
            match self
                .store
                .find(doctor_id, date)
                .await
                .map_err(map_store_error)?
            {
                Some(existing) => {
                    let seen_version = existing.version;
                    let mut mutated = existing;
                    mutated.time_slots = slots.clone();

                    match self.store.update_guarded(&mutated, seen_version).await {
                        Ok(saved) => return Ok(saved),
                        Err(StoreError::Conflict(_)) => continue,
                        Err(e) => return Err(map_store_error(e)),
                    }
                }
                None => {
                    let mut fresh = Schedule::with_default_template(doctor_id, date);
                    fresh.time_slots = slots.clone();

                    match self.store.insert_unique(fresh).await {
                        Ok(created) => return Ok(created),
                        Err(StoreError::Conflict(_)) => continue,
                        Err(e) => return Err(map_store_error(e)),
                    }
                }
            }
        }

        Err(ScheduleError::ClaimContention)
    }

    async fn verify_doctor(&self, doctor_id: Uuid) -> Result<(), ScheduleError> {
        self.catalog.get_doctor(doctor_id).await.map_err(|e| match e {
            CatalogError::DoctorNotFound => ScheduleError::DoctorNotFound,
            other => ScheduleError::DatabaseError(other.to_string()),
        })?;
        Ok(())
    }
}

fn map_store_error(e: StoreError) -> ScheduleError {
    ScheduleError::DatabaseError(e.to_string())
}
