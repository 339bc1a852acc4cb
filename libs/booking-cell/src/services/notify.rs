use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::models::Booking;

/// Outbound notification seam. Dispatch is best-effort everywhere: the
/// state machine logs failures and never rolls a transition back over
/// them.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn booking_confirmed(&self, booking: &Booking) -> anyhow::Result<()>;
    async fn booking_cancelled(&self, booking: &Booking) -> anyhow::Result<()>;
}

/// Posts booking events to the external notification service (the piece
/// that actually emails patients). An empty URL disables dispatch.
pub struct WebhookNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl WebhookNotifier {
    pub fn new(webhook_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }

    async fn post_event(&self, event: &str, booking: &Booking) -> anyhow::Result<()> {
        if self.webhook_url.is_empty() {
            debug!("Notifier not configured, skipping {} for booking {}", event, booking.id);
            return Ok(());
        }

        let payload = json!({
            "event": event,
            "bookingId": booking.id,
            "patientId": booking.patient_id,
            "doctorId": booking.doctor_id,
            "date": booking.date,
            "timeSlot": booking.time_slot,
            "status": booking.status,
        });

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("notification webhook returned {}", response.status());
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn booking_confirmed(&self, booking: &Booking) -> anyhow::Result<()> {
        self.post_event("booking.confirmed", booking).await
    }

    async fn booking_cancelled(&self, booking: &Booking) -> anyhow::Result<()> {
        self.post_event("booking.cancelled", booking).await
    }
}

/// Test double that records every dispatched event in order.
#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<(String, Uuid)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<(String, Uuid)> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn booking_confirmed(&self, booking: &Booking) -> anyhow::Result<()> {
        self.events
            .lock()
            .await
            .push(("booking.confirmed".to_string(), booking.id));
        Ok(())
    }

    async fn booking_cancelled(&self, booking: &Booking) -> anyhow::Result<()> {
        self.events
            .lock()
            .await
            .push(("booking.cancelled".to_string(), booking.id));
        Ok(())
    }
}
