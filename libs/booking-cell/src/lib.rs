pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use services::engine::BookingEngine;
pub use services::lifecycle::BookingLifecycle;
pub use services::notify::{Notifier, RecordingNotifier, WebhookNotifier};
pub use services::store::{BookingStore, MemoryBookingStore, PostgrestBookingStore};
