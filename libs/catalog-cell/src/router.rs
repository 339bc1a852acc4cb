use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::services::catalog::CatalogService;

/// Public read surface; admin mutation of these records lives elsewhere.
pub fn catalog_routes(catalog: Arc<CatalogService>) -> Router {
    Router::new()
        .route("/doctors", get(handlers::list_doctors))
        .route("/doctors/{doctor_id}", get(handlers::get_doctor))
        .route("/specialties", get(handlers::list_specialties))
        .route("/clinics", get(handlers::list_clinics))
        .with_state(catalog)
}
