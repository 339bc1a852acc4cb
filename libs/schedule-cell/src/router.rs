use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::ledger::AvailabilityLedger;

/// Schedule reads are public (patients browse slots before signing in);
/// schedule edits require a doctor or admin session.
pub fn schedule_routes(ledger: Arc<AvailabilityLedger>, config: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/doctors/{doctor_id}", put(handlers::set_doctor_schedule))
        .layer(middleware::from_fn_with_state(config, auth_middleware));

    Router::new()
        .route("/doctors/{doctor_id}", get(handlers::get_doctor_schedule))
        .merge(protected_routes)
        .with_state(ledger)
}
