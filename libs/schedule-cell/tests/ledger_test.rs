mod common;

use assert_matches::assert_matches;
use chrono::NaiveDate;
use futures::future::join_all;
use uuid::Uuid;

use schedule_cell::models::{default_slot_template, ScheduleError, TimeSlot};
use schedule_cell::services::ledger::{resolve_slot, resolve_slot_index};
use schedule_cell::services::store::ScheduleStore;

use common::ledger_harness;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// ==============================================================================
// SLOT SELECTOR RESOLUTION
// ==============================================================================

#[test]
fn resolves_by_exact_id_first() {
    let slots = default_slot_template();

    let slot = resolve_slot(&slots, "3").unwrap();
    assert_eq!(slot.time, "10:00 - 11:00");
}

#[test]
fn resolves_by_exact_label_when_no_id_matches() {
    let slots = default_slot_template();

    let slot = resolve_slot(&slots, "10:00 - 11:00").unwrap();
    assert_eq!(slot.id, "3");
}

#[test]
fn resolves_by_normalized_containment() {
    let slots = default_slot_template();

    // Client label drift: no spaces around the dash.
    let slot = resolve_slot(&slots, "10:00-11:00").unwrap();
    assert_eq!(slot.id, "3");

    // A partial label finds the FIRST slot containing it in list order:
    // "14:00" appears in "13:00 - 14:00" before "14:00 - 15:00".
    let slot = resolve_slot(&slots, "14:00").unwrap();
    assert_eq!(slot.id, "5");

    // An unambiguous partial label lands on its slot.
    let slot = resolve_slot(&slots, "14:00 - 15").unwrap();
    assert_eq!(slot.id, "6");
}

#[test]
fn id_match_wins_over_label_containment() {
    // A slot whose label contains "1" exists everywhere; id match must win.
    let slots = vec![
        TimeSlot {
            id: "morning".to_string(),
            time: "8:00 - 12:00".to_string(),
            is_available: true,
        },
        TimeSlot {
            id: "8:00 - 12:00".to_string(),
            time: "13:00 - 17:00".to_string(),
            is_available: true,
        },
    ];

    // Selector equals the second slot's id and the first slot's label.
    let index = resolve_slot_index(&slots, "8:00 - 12:00").unwrap();
    assert_eq!(index, 1);
}

#[test]
fn unknown_selector_resolves_to_none() {
    let slots = default_slot_template();

    assert!(resolve_slot(&slots, "23:00 - 23:30").is_none());
    assert!(resolve_slot(&slots, "").is_none());
}

// ==============================================================================
// DEFAULT TEMPLATE / PROJECTIONS
// ==============================================================================

#[tokio::test]
async fn fresh_schedule_shows_default_template() {
    let h = common::ledger_harness().await;

    let views = h
        .ledger
        .get_range(h.doctor.id, date("2025-11-24"), 1)
        .await
        .unwrap();

    assert_eq!(views.len(), 1);
    let view = &views[0];
    assert_eq!(view.id, None);
    assert_eq!(view.time_slots.len(), 8);
    assert!(view.time_slots.iter().all(|s| s.is_available));
    assert_eq!(view.time_slots[0].time, "8:00 - 9:00");
}

#[tokio::test]
async fn get_range_is_read_only() {
    let h = ledger_harness().await;

    let views = h
        .ledger
        .get_range(h.doctor.id, date("2025-11-24"), 3)
        .await
        .unwrap();
    assert_eq!(views.len(), 3);

    for offset in 0..3 {
        let day = date("2025-11-24") + chrono::Duration::days(offset);
        assert!(h.schedule_store.find(h.doctor.id, day).await.unwrap().is_none());
    }
}

#[tokio::test]
async fn get_range_rejects_non_positive_days() {
    let h = ledger_harness().await;

    let err = h
        .ledger
        .get_range(h.doctor.id, date("2025-11-24"), 0)
        .await
        .unwrap_err();
    assert_matches!(err, ScheduleError::ValidationError(_));
}

#[tokio::test]
async fn unknown_doctor_is_rejected() {
    let h = ledger_harness().await;

    let err = h
        .ledger
        .get_or_create(Uuid::new_v4(), date("2025-11-24"))
        .await
        .unwrap_err();
    assert_matches!(err, ScheduleError::DoctorNotFound);
}

#[tokio::test]
async fn get_or_create_is_stable_per_key() {
    let h = ledger_harness().await;

    let first = h.ledger.get_or_create(h.doctor.id, date("2025-11-24")).await.unwrap();
    let second = h.ledger.get_or_create(h.doctor.id, date("2025-11-24")).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.time_slots, second.time_slots);
}

// ==============================================================================
// CLAIM / RELEASE
// ==============================================================================

#[tokio::test]
async fn claim_flips_availability_and_returns_canonical_slot() {
    let h = ledger_harness().await;
    let day = date("2025-11-24");

    let claimed = h.ledger.claim_slot(h.doctor.id, day, "3").await.unwrap();
    assert_eq!(claimed.slot.time, "10:00 - 11:00");
    assert!(!claimed.slot.is_available);

    let stored = h.schedule_store.find(h.doctor.id, day).await.unwrap().unwrap();
    let slot = stored.slot_by_id("3").unwrap();
    assert!(!slot.is_available);
}

#[tokio::test]
async fn second_claim_on_same_slot_fails() {
    let h = ledger_harness().await;
    let day = date("2025-11-24");

    h.ledger.claim_slot(h.doctor.id, day, "3").await.unwrap();

    let err = h.ledger.claim_slot(h.doctor.id, day, "3").await.unwrap_err();
    assert_matches!(err, ScheduleError::SlotUnavailable(_));
}

#[tokio::test]
async fn claim_with_unknown_selector_fails() {
    let h = ledger_harness().await;

    let err = h
        .ledger
        .claim_slot(h.doctor.id, date("2025-11-24"), "99")
        .await
        .unwrap_err();
    assert_matches!(err, ScheduleError::SlotNotFound(_));
}

#[tokio::test]
async fn release_restores_availability_and_is_idempotent() {
    let h = ledger_harness().await;
    let day = date("2025-11-24");

    h.ledger.claim_slot(h.doctor.id, day, "3").await.unwrap();
    h.ledger.release_slot(h.doctor.id, day, "3").await.unwrap();

    let stored = h.schedule_store.find(h.doctor.id, day).await.unwrap().unwrap();
    assert!(stored.slot_by_id("3").unwrap().is_available);

    // Releasing again, or releasing slots that never existed, is a no-op.
    h.ledger.release_slot(h.doctor.id, day, "3").await.unwrap();
    h.ledger.release_slot(h.doctor.id, day, "99").await.unwrap();
    h.ledger
        .release_slot(h.doctor.id, date("2030-01-01"), "3")
        .await
        .unwrap();
}

#[tokio::test]
async fn concurrent_claims_produce_exactly_one_winner() {
    let h = ledger_harness().await;
    let day = date("2025-11-24");

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let ledger = h.ledger.clone();
            let doctor_id = h.doctor.id;
            tokio::spawn(async move { ledger.claim_slot(doctor_id, day, "3").await })
        })
        .collect();

    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);

    for result in results.iter().filter(|r| r.is_err()) {
        assert_matches!(
            result.as_ref().unwrap_err(),
            ScheduleError::SlotUnavailable(_) | ScheduleError::ClaimContention
        );
    }
}

// ==============================================================================
// DOCTOR-SIDE SCHEDULE EDITING
// ==============================================================================

#[tokio::test]
async fn set_day_slots_overwrites_completely() {
    let h = ledger_harness().await;
    let day = date("2025-11-24");

    h.ledger.claim_slot(h.doctor.id, day, "3").await.unwrap();

    let replacement = vec![
        TimeSlot {
            id: "am".to_string(),
            time: "9:00 - 11:30".to_string(),
            is_available: true,
        },
        TimeSlot {
            id: "pm".to_string(),
            time: "14:00 - 16:30".to_string(),
            is_available: false,
        },
    ];

    let saved = h
        .ledger
        .set_day_slots(h.doctor.id, day, replacement.clone())
        .await
        .unwrap();

    assert_eq!(saved.time_slots, replacement);
    assert!(saved.slot_by_id("3").is_none());
}

#[tokio::test]
async fn set_day_slots_upserts_missing_days() {
    let h = ledger_harness().await;
    let day = date("2025-12-01");

    let slots = vec![TimeSlot {
        id: "1".to_string(),
        time: "8:00 - 9:00".to_string(),
        is_available: true,
    }];

    let saved = h.ledger.set_day_slots(h.doctor.id, day, slots).await.unwrap();
    assert_eq!(saved.time_slots.len(), 1);

    let stored = h.schedule_store.find(h.doctor.id, day).await.unwrap();
    assert!(stored.is_some());
}

#[tokio::test]
async fn set_day_slots_rejects_duplicate_ids() {
    let h = ledger_harness().await;

    let slots = vec![
        TimeSlot {
            id: "1".to_string(),
            time: "8:00 - 9:00".to_string(),
            is_available: true,
        },
        TimeSlot {
            id: "1".to_string(),
            time: "9:00 - 10:00".to_string(),
            is_available: true,
        },
    ];

    let err = h
        .ledger
        .set_day_slots(h.doctor.id, date("2025-12-01"), slots)
        .await
        .unwrap_err();
    assert_matches!(err, ScheduleError::ValidationError(_));
}
