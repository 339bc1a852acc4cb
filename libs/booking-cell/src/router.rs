use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers::{self, BookingState};

/// Every booking operation requires an authenticated session.
pub fn booking_routes(state: Arc<BookingState>, config: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::create_booking))
        .route("/", get(handlers::search_bookings))
        .route("/{booking_id}", get(handlers::get_booking))
        .route("/{booking_id}", put(handlers::update_booking))
        .layer(middleware::from_fn_with_state(config, auth_middleware))
        .with_state(state)
}
