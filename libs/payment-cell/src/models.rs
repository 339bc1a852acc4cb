use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub booking_id: Uuid,
    /// Amount in minor currency units.
    pub amount: i64,
    pub bank_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub url: String,
}

/// Structured result of a return callback. A well-formed but failing
/// payment is a `success: false` outcome, never an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOutcome {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum PaymentError {
    #[error("Booking not found")]
    BookingNotFound,

    #[error("Payment signature verification failed")]
    InvalidSignature,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
