use std::sync::Arc;

use axum::{routing::get, Router};

use booking_cell::handlers::BookingState;
use booking_cell::router::booking_routes;
use booking_cell::services::engine::BookingEngine;
use booking_cell::services::lifecycle::BookingLifecycle;
use booking_cell::services::notify::WebhookNotifier;
use booking_cell::services::store::PostgrestBookingStore;
use catalog_cell::router::catalog_routes;
use catalog_cell::services::catalog::CatalogService;
use catalog_cell::services::store::PostgrestCatalog;
use payment_cell::router::payment_routes;
use payment_cell::services::gateway::PaymentGateway;
use schedule_cell::router::schedule_routes;
use schedule_cell::services::ledger::AvailabilityLedger;
use schedule_cell::services::store::PostgrestScheduleStore;
use shared_config::AppConfig;
use shared_database::PostgrestClient;

pub fn create_router(config: Arc<AppConfig>) -> Router {
    // One transport client, shared by every store.
    let client = Arc::new(PostgrestClient::new(&config));

    let catalog = CatalogService::new(Arc::new(PostgrestCatalog::new(client.clone())));
    let schedule_store = Arc::new(PostgrestScheduleStore::new(client.clone()));
    let booking_store = Arc::new(PostgrestBookingStore::new(client));

    let ledger = Arc::new(AvailabilityLedger::new(catalog.clone(), schedule_store));
    let notifier = Arc::new(WebhookNotifier::new(config.notify_webhook_url.clone()));

    let engine = Arc::new(BookingEngine::new(
        catalog.clone(),
        ledger.clone(),
        booking_store.clone(),
    ));
    let lifecycle = Arc::new(BookingLifecycle::new(
        booking_store.clone(),
        ledger.clone(),
        notifier,
    ));

    let booking_state = Arc::new(BookingState {
        engine,
        lifecycle: lifecycle.clone(),
    });
    let payment_gateway = Arc::new(PaymentGateway::new(booking_store, lifecycle, config.clone()));

    Router::new()
        .route("/", get(|| async { "MediBook API is running!" }))
        .nest("/catalog", catalog_routes(Arc::new(catalog)))
        .nest("/schedules", schedule_routes(ledger, config.clone()))
        .nest("/bookings", booking_routes(booking_state, config.clone()))
        .nest("/payments", payment_routes(payment_gateway, config))
}
