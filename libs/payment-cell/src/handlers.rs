use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{CreatePaymentRequest, PaymentError};
use crate::services::gateway::PaymentGateway;

pub fn map_payment_error(e: PaymentError) -> AppError {
    match e {
        PaymentError::BookingNotFound => AppError::NotFound("Booking not found".to_string()),
        PaymentError::InvalidSignature => {
            AppError::InvalidSignature("Payment signature verification failed".to_string())
        }
        PaymentError::ValidationError(msg) => AppError::Validation(msg),
        PaymentError::DatabaseError(msg) => AppError::Database(msg),
    }
}

fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .unwrap_or_else(|| "127.0.0.1".to_string())
}

#[axum::debug_handler]
pub async fn create_payment(
    State(gateway): State<Arc<PaymentGateway>>,
    headers: HeaderMap,
    Extension(_user): Extension<User>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<Json<Value>, AppError> {
    let ip = client_ip(&headers);

    let intent = gateway
        .create_intent(request.booking_id, request.amount, request.bank_code, &ip)
        .await
        .map_err(map_payment_error)?;

    Ok(Json(json!({ "url": intent.url })))
}

/// Landing endpoint for the gateway redirect. Public: the provider echoes
/// the patient's browser here with the signed result in the query string.
#[axum::debug_handler]
pub async fn payment_return(
    State(gateway): State<Arc<PaymentGateway>>,
    Query(params): Query<BTreeMap<String, String>>,
) -> Result<Json<Value>, AppError> {
    let outcome = gateway
        .handle_return(params)
        .await
        .map_err(map_payment_error)?;

    Ok(Json(json!({
        "success": outcome.success,
        "message": outcome.message,
    })))
}
