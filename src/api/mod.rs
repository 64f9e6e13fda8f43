//! REST + WebSocket API module using Axum
//!
//! Provides the external surface of the telemetry service:
//! - `POST /api/v1/sensor-data` - the ingestion entry point
//! - read-latest and registry endpoints under `/api/v1`
//! - `/health` - service status
//! - `/ws/vehicles` - live observer WebSocket

pub mod envelope;
pub mod handlers;
mod routes;
mod ws;

pub use handlers::ApiState;

use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build a CORS layer that is restrictive by default (same-origin only).
///
/// Set `FLEET_SENTINEL_CORS_ORIGINS` to a comma-separated list of allowed
/// origins for development dashboards.
fn build_cors_layer() -> CorsLayer {
    match std::env::var("FLEET_SENTINEL_CORS_ORIGINS") {
        Ok(origins) => {
            let allowed: Vec<_> = origins
                .split(',')
                .filter_map(|o| o.trim().parse().ok())
                .collect();
            tracing::info!(origins = %origins, "CORS: allowing configured origins");
            CorsLayer::new()
                .allow_origin(allowed)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([header::CONTENT_TYPE])
        }
        Err(_) => CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
    }
}

/// Create the complete application router.
pub fn create_app(state: ApiState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes(state.clone()))
        .merge(routes::root_routes(state))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}
