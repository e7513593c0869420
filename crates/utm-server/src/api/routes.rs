//! REST API routes.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::api::{auth, zones};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: &AppState) -> Router<Arc<AppState>> {
    // Every zone endpoint needs an authenticated principal.
    let zone_routes = Router::new()
        .route("/v1/zones", post(zones::create_zone).get(zones::list_zones))
        .route("/v1/zones/check", post(zones::check_point))
        .route(
            "/v1/zones/:id",
            get(zones::get_zone).delete(zones::archive_zone),
        )
        .layer(middleware::from_fn_with_state(
            state.identity(),
            auth::require_principal,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(zone_routes)
}

async fn health() -> &'static str {
    "OK"
}
