//! API route table.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, ApiState};
use super::ws;

/// Build the /api/v1 router.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        // Ingestion
        .route("/sensor-data", post(handlers::ingest_sensor_data))
        // Vehicle registry
        .route(
            "/vehicles",
            get(handlers::list_vehicles).post(handlers::register_vehicle),
        )
        .route(
            "/vehicles/:id",
            get(handlers::get_vehicle)
                .put(handlers::update_vehicle)
                .delete(handlers::deregister_vehicle),
        )
        // Read-latest and history
        .route("/vehicles/:id/latest-sensor", get(handlers::latest_sensor))
        .route(
            "/vehicles/:id/latest-prediction",
            get(handlers::latest_prediction),
        )
        .route("/vehicles/:id/readings", get(handlers::recent_readings))
        .route(
            "/vehicles/:id/predictions",
            get(handlers::recent_predictions),
        )
        // Maintenance
        .route(
            "/vehicles/:id/maintenance",
            get(handlers::vehicle_maintenance).post(handlers::open_maintenance),
        )
        .with_state(state)
}

/// Root-level routes: health check and the live observer socket.
pub fn root_routes(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/ws/vehicles", get(ws::vehicles_ws))
        .with_state(state)
}
