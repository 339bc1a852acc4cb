use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::gateway::PaymentGateway;

/// Intent creation needs a session; the return callback cannot carry one
/// (the gateway redirects the browser) and relies on the signature alone.
pub fn payment_routes(gateway: Arc<PaymentGateway>, config: Arc<AppConfig>) -> Router {
    let protected_routes = Router::new()
        .route("/create", post(handlers::create_payment))
        .layer(middleware::from_fn_with_state(config, auth_middleware));

    Router::new()
        .route("/return", get(handlers::payment_return))
        .merge(protected_routes)
        .with_state(gateway)
}
