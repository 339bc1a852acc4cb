use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use schedule_cell::services::ledger::AvailabilityLedger;
use shared_database::StoreError;

use crate::models::{Booking, BookingError, BookingStatus, UpdateBookingRequest};
use crate::services::notify::Notifier;
use crate::services::store::BookingStore;

/// Owns every status mutation of a booking. Transitions move only forward:
///
/// ```text
/// pending ──► confirmed ──► completed
///    │             │
///    ├─────────────┴──────► cancelled
///    └────────────────────► completed
/// ```
///
/// Cancellation releases the claimed slot; completion leaves it claimed
/// (the appointment happened). Notifications ride on confirm/cancel and
/// are best-effort.
pub struct BookingLifecycle {
    store: Arc<dyn BookingStore>,
    ledger: Arc<AvailabilityLedger>,
    notifier: Arc<dyn Notifier>,
}

impl BookingLifecycle {
    pub fn new(
        store: Arc<dyn BookingStore>,
        ledger: Arc<AvailabilityLedger>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            ledger,
            notifier,
        }
    }

    /// Validate that a status transition is allowed.
    pub fn validate_status_transition(
        &self,
        current_status: BookingStatus,
        new_status: BookingStatus,
    ) -> Result<(), BookingError> {
        debug!("Validating status transition {} -> {}", current_status, new_status);

        if !Self::valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(BookingError::InvalidStatusTransition {
                from: current_status,
                to: new_status,
            });
        }

        Ok(())
    }

    /// All valid next statuses for a given current status.
    pub fn valid_transitions(current_status: BookingStatus) -> Vec<BookingStatus> {
        match current_status {
            BookingStatus::Pending => vec![
                BookingStatus::Confirmed,
                BookingStatus::Completed,
                BookingStatus::Cancelled,
            ],
            BookingStatus::Confirmed => vec![
                BookingStatus::Completed,
                BookingStatus::Cancelled,
            ],
            // Terminal states, no transitions out.
            BookingStatus::Completed => vec![],
            BookingStatus::Cancelled => vec![],
        }
    }

    /// Apply a status transition and/or a notes update to a booking.
    /// Notes on their own are not state-changing and are always accepted.
    pub async fn apply(
        &self,
        booking_id: Uuid,
        request: UpdateBookingRequest,
    ) -> Result<Booking, BookingError> {
        let mut booking = self
            .store
            .get(booking_id)
            .await
            .map_err(map_store_error)?
            .ok_or(BookingError::BookingNotFound)?;

        let previous_status = booking.status;

        if let Some(new_status) = request.status {
            self.validate_status_transition(previous_status, new_status)?;
            booking.status = new_status;
        }
        if let Some(notes) = request.notes {
            booking.notes = Some(notes);
        }

        let updated = self.store.update(&booking).await.map_err(map_store_error)?;

        if let Some(new_status) = request.status {
            self.run_side_effects(&updated, previous_status, new_status)
                .await?;
        }

        Ok(updated)
    }

    /// Confirm a booking from a verified successful payment. Idempotent:
    /// an already confirmed or completed booking is a no-op with no second
    /// notification.
    pub async fn confirm_from_payment(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        let booking = self
            .store
            .get(booking_id)
            .await
            .map_err(map_store_error)?
            .ok_or(BookingError::BookingNotFound)?;

        match booking.status {
            BookingStatus::Pending => {
                self.apply(
                    booking_id,
                    UpdateBookingRequest {
                        status: Some(BookingStatus::Confirmed),
                        notes: None,
                    },
                )
                .await
            }
            BookingStatus::Confirmed | BookingStatus::Completed => {
                debug!(
                    "Payment confirmation replay for booking {} already {}, nothing to do",
                    booking.id, booking.status
                );
                Ok(booking)
            }
            BookingStatus::Cancelled => Err(BookingError::InvalidStatusTransition {
                from: BookingStatus::Cancelled,
                to: BookingStatus::Confirmed,
            }),
        }
    }

    /// Cancel a booking from a failed payment. Only PENDING bookings are
    /// cancelled this way: a booking confirmed through another channel
    /// (doctor-side, cash) is out of the gateway's authority, and a replay
    /// against an already cancelled booking is a no-op.
    pub async fn cancel_from_payment(&self, booking_id: Uuid) -> Result<Booking, BookingError> {
        let booking = self
            .store
            .get(booking_id)
            .await
            .map_err(map_store_error)?
            .ok_or(BookingError::BookingNotFound)?;

        match booking.status {
            BookingStatus::Pending => {
                self.apply(
                    booking_id,
                    UpdateBookingRequest {
                        status: Some(BookingStatus::Cancelled),
                        notes: None,
                    },
                )
                .await
            }
            _ => {
                debug!(
                    "Payment failure for booking {} in status {}, leaving state untouched",
                    booking.id, booking.status
                );
                Ok(booking)
            }
        }
    }

    async fn run_side_effects(
        &self,
        booking: &Booking,
        previous_status: BookingStatus,
        new_status: BookingStatus,
    ) -> Result<(), BookingError> {
        match new_status {
            BookingStatus::Confirmed => {
                if let Err(e) = self.notifier.booking_confirmed(booking).await {
                    warn!(
                        "Failed to send confirmation notification for booking {}: {}",
                        booking.id, e
                    );
                }
            }
            BookingStatus::Cancelled => {
                // The slot must come back; a cancelled booking holding its
                // claim forever is a correctness bug, so this failure does
                // propagate.
                self.ledger
                    .release_slot(booking.doctor_id, booking.date, &booking.slot_id)
                    .await
                    .map_err(|e| BookingError::DatabaseError(e.to_string()))?;

                if let Err(e) = self.notifier.booking_cancelled(booking).await {
                    warn!(
                        "Failed to send cancellation notification for booking {}: {}",
                        booking.id, e
                    );
                }
            }
            BookingStatus::Completed => {
                // Slot stays claimed: the appointment happened.
            }
            BookingStatus::Pending => {}
        }

        info!(
            "Booking {} transitioned {} -> {}",
            booking.id, previous_status, new_status
        );
        Ok(())
    }
}

fn map_store_error(e: StoreError) -> BookingError {
    match e {
        StoreError::NotFound => BookingError::BookingNotFound,
        StoreError::Conflict(msg) => BookingError::DatabaseError(msg),
        StoreError::Backend(msg) => BookingError::DatabaseError(msg),
    }
}
