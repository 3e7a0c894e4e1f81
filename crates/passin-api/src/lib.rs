//! Pass.in — HTTP API.
//!
//! Thin transport over the registration context: request validation,
//! mapping admission decisions to status codes, configuration and telemetry.

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;

/// Builds the full application router.
pub fn app(state: state::AppState) -> Router {
    // TODO: Replace CorsLayer::permissive() with the web client's origin once it is deployed.
    Router::new()
        .merge(routes::health::router())
        .merge(routes::attendees::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
