//! API routes for the UTM server.

pub mod auth;
pub mod error;
pub mod request_id;
mod routes;
pub mod zones;

use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;

pub fn routes(state: &AppState) -> Router<Arc<AppState>> {
    routes::create_router(state)
}

/// Full application: routes, state, and the HTTP middleware stack.
pub fn app(state: Arc<AppState>) -> Router {
    routes(&state)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id::ensure_request_id))
        .layer(CorsLayer::permissive())
}
