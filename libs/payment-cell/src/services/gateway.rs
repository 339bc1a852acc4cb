use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use booking_cell::models::BookingError;
use booking_cell::services::lifecycle::BookingLifecycle;
use booking_cell::services::store::BookingStore;
use shared_config::AppConfig;
use shared_database::StoreError;

use crate::models::{PaymentError, PaymentIntent, PaymentOutcome};
use crate::services::signature::{
    canonical_query, sign, verify, SIGNATURE_FIELD, SIGNATURE_TYPE_FIELD,
};

const GATEWAY_SUCCESS_CODE: &str = "00";

/// Bridge between the external redirect gateway and the booking state
/// machine. Builds signed payment URLs and reconciles the asynchronous
/// return callback, with mandatory signature verification before any
/// state is touched.
pub struct PaymentGateway {
    store: Arc<dyn BookingStore>,
    lifecycle: Arc<BookingLifecycle>,
    config: Arc<AppConfig>,
}

impl PaymentGateway {
    pub fn new(
        store: Arc<dyn BookingStore>,
        lifecycle: Arc<BookingLifecycle>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            store,
            lifecycle,
            config,
        }
    }

    /// Build the signed redirect URL for a booking and persist it on the
    /// booking row for audit.
    pub async fn create_intent(
        &self,
        booking_id: Uuid,
        amount: i64,
        bank_code: Option<String>,
        client_ip: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        if amount <= 0 {
            return Err(PaymentError::ValidationError(
                "amount must be positive".to_string(),
            ));
        }

        let mut booking = self
            .store
            .get(booking_id)
            .await
            .map_err(map_store_error)?
            .ok_or(PaymentError::BookingNotFound)?;

        let mut params: BTreeMap<String, String> = BTreeMap::new();
        params.insert("vnp_Version".to_string(), "2.1.0".to_string());
        params.insert("vnp_Command".to_string(), "pay".to_string());
        params.insert(
            "vnp_TmnCode".to_string(),
            self.config.payment_merchant_code.clone(),
        );
        params.insert("vnp_Locale".to_string(), "vn".to_string());
        params.insert("vnp_CurrCode".to_string(), "VND".to_string());
        params.insert("vnp_TxnRef".to_string(), booking_id.to_string());
        params.insert(
            "vnp_OrderInfo".to_string(),
            format!("Payment for booking {}", booking_id),
        );
        // The gateway counts in hundredths of the minor unit.
        params.insert("vnp_Amount".to_string(), (amount * 100).to_string());
        params.insert(
            "vnp_ReturnUrl".to_string(),
            self.config.payment_return_url.clone(),
        );
        params.insert("vnp_IpAddr".to_string(), client_ip.to_string());
        params.insert(
            "vnp_CreateDate".to_string(),
            Utc::now().format("%Y%m%d%H%M%S").to_string(),
        );
        if let Some(bank) = bank_code.filter(|b| !b.is_empty()) {
            params.insert("vnp_BankCode".to_string(), bank);
        }

        let query = canonical_query(&params);
        let signature = sign(&params, &self.config.payment_hash_secret);
        let url = format!(
            "{}?{}&{}={}",
            self.config.payment_gateway_url, query, SIGNATURE_FIELD, signature
        );

        booking.payment_url = Some(url.clone());
        self.store
            .update(&booking)
            .await
            .map_err(map_store_error)?;

        info!("Payment intent created for booking {}", booking_id);
        Ok(PaymentIntent { url })
    }

    /// Reconcile a gateway return callback against the booking it names.
    ///
    /// The provided signature must match a re-signing of every parameter
    /// except the signature fields themselves; on mismatch no state is
    /// touched. Verified callbacks drive the state machine idempotently,
    /// so provider retries are safe.
    pub async fn handle_return(
        &self,
        mut params: BTreeMap<String, String>,
    ) -> Result<PaymentOutcome, PaymentError> {
        let provided = params
            .remove(SIGNATURE_FIELD)
            .ok_or_else(|| PaymentError::ValidationError("missing signature field".to_string()))?;
        params.remove(SIGNATURE_TYPE_FIELD);

        if !verify(&params, &self.config.payment_hash_secret, &provided) {
            warn!("Payment callback signature mismatch, discarding");
            return Err(PaymentError::InvalidSignature);
        }

        let booking_id = params
            .get("vnp_TxnRef")
            .ok_or_else(|| PaymentError::ValidationError("missing vnp_TxnRef".to_string()))
            .and_then(|raw| {
                Uuid::parse_str(raw).map_err(|_| {
                    PaymentError::ValidationError(format!("vnp_TxnRef is not a booking id: {}", raw))
                })
            })?;

        let response_code = params
            .get("vnp_ResponseCode")
            .cloned()
            .ok_or_else(|| PaymentError::ValidationError("missing vnp_ResponseCode".to_string()))?;

        let mut booking = self
            .store
            .get(booking_id)
            .await
            .map_err(map_store_error)?
            .ok_or(PaymentError::BookingNotFound)?;

        // Keep the verified raw payload for audit before driving state.
        let audit = canonical_query(&params);
        if booking.payment_ref.as_deref() != Some(audit.as_str()) {
            booking.payment_ref = Some(audit);
            self.store
                .update(&booking)
                .await
                .map_err(map_store_error)?;
        }

        if response_code == GATEWAY_SUCCESS_CODE {
            match self.lifecycle.confirm_from_payment(booking_id).await {
                Ok(confirmed) => {
                    debug!(
                        "Payment success reconciled for booking {} (status {})",
                        booking_id, confirmed.status
                    );
                    Ok(PaymentOutcome {
                        success: true,
                        message: "Payment verified, booking confirmed".to_string(),
                    })
                }
                Err(BookingError::InvalidStatusTransition { from, .. }) => {
                    // Paid for a booking that was already cancelled; the
                    // money side is the operator's problem, not a crash.
                    warn!(
                        "Successful payment for booking {} in status {}, not confirming",
                        booking_id, from
                    );
                    Ok(PaymentOutcome {
                        success: false,
                        message: format!("Booking is {} and cannot be confirmed", from),
                    })
                }
                Err(e) => Err(map_booking_error(e)),
            }
        } else {
            let cancelled = self
                .lifecycle
                .cancel_from_payment(booking_id)
                .await
                .map_err(map_booking_error)?;

            debug!(
                "Payment failure (code {}) reconciled for booking {} (status {})",
                response_code, booking_id, cancelled.status
            );
            Ok(PaymentOutcome {
                success: false,
                message: format!("Payment failed with gateway code {}", response_code),
            })
        }
    }
}

fn map_store_error(e: StoreError) -> PaymentError {
    match e {
        StoreError::NotFound => PaymentError::BookingNotFound,
        StoreError::Conflict(msg) => PaymentError::DatabaseError(msg),
        StoreError::Backend(msg) => PaymentError::DatabaseError(msg),
    }
}

fn map_booking_error(e: BookingError) -> PaymentError {
    match e {
        BookingError::BookingNotFound => PaymentError::BookingNotFound,
        other => PaymentError::DatabaseError(other.to_string()),
    }
}
