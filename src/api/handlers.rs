//! API request handlers

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::ensemble::ModelEnsemble;
use crate::hub::BroadcastHub;
use crate::pipeline::{IngestError, IngestPipeline};
use crate::storage::FleetStore;
use crate::types::{ReadingPayload, Severity, VehicleStatus};

use super::envelope::{ApiErrorResponse, ApiResponse};

/// Shared handler state. Cheap to clone per request.
#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<IngestPipeline>,
    pub store: FleetStore,
    pub ensemble: Arc<ModelEnsemble>,
    pub hub: Arc<BroadcastHub>,
    pub started_at: Instant,
}

impl ApiState {
    pub fn new(
        pipeline: Arc<IngestPipeline>,
        store: FleetStore,
        ensemble: Arc<ModelEnsemble>,
        hub: Arc<BroadcastHub>,
    ) -> Self {
        Self {
            pipeline,
            store,
            ensemble,
            hub,
            started_at: Instant::now(),
        }
    }
}

// ============================================================================
// Ingestion
// ============================================================================

/// POST /api/v1/sensor-data
///
/// Runs one reading through the full pipeline and returns the combined
/// primary outcome. 404 when the vehicle is unregistered, 500 when a
/// Reading/Verdict write fails.
pub async fn ingest_sensor_data(
    State(state): State<ApiState>,
    Json(payload): Json<ReadingPayload>,
) -> Response {
    match state.pipeline.ingest(payload).await {
        Ok(outcome) => ApiResponse::created(outcome),
        Err(IngestError::VehicleNotFound(id)) => ApiErrorResponse::vehicle_not_found(id),
        Err(IngestError::Storage(e)) => {
            error!(error = %e, "Ingest failed on persistence");
            ApiErrorResponse::storage(e.to_string())
        }
    }
}

// ============================================================================
// Read-latest
// ============================================================================

/// GET /api/v1/vehicles/:id/latest-sensor
pub async fn latest_sensor(State(state): State<ApiState>, Path(vehicle_id): Path<u64>) -> Response {
    match vehicle_stream_latest(&state, vehicle_id, FleetStore::latest_reading) {
        Ok(resp) => resp,
        Err(e) => {
            error!(vehicle_id, error = %e, "Failed to read latest sensor data");
            ApiErrorResponse::storage(e.to_string())
        }
    }
}

/// GET /api/v1/vehicles/:id/latest-prediction
pub async fn latest_prediction(
    State(state): State<ApiState>,
    Path(vehicle_id): Path<u64>,
) -> Response {
    match vehicle_stream_latest(&state, vehicle_id, FleetStore::latest_verdict) {
        Ok(resp) => resp,
        Err(e) => {
            error!(vehicle_id, error = %e, "Failed to read latest prediction");
            ApiErrorResponse::storage(e.to_string())
        }
    }
}

/// Shared latest-row lookup: vehicle existence is verified first so the
/// caller can tell "no such vehicle" from "no rows yet".
fn vehicle_stream_latest<T: Serialize>(
    state: &ApiState,
    vehicle_id: u64,
    fetch: impl Fn(&FleetStore, u64) -> Result<Option<T>, crate::storage::StorageError>,
) -> Result<Response, crate::storage::StorageError> {
    if !state.store.vehicle_exists(vehicle_id)? {
        return Ok(ApiErrorResponse::vehicle_not_found(vehicle_id));
    }
    match fetch(&state.store, vehicle_id)? {
        Some(row) => Ok(ApiResponse::ok(row)),
        None => Ok(ApiErrorResponse::no_data(format!(
            "no data recorded for vehicle {vehicle_id} yet"
        ))),
    }
}

/// Default and ceiling for the recent-history endpoints.
const DEFAULT_RECENT_LIMIT: usize = 20;
const MAX_RECENT_LIMIT: usize = 500;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

impl RecentQuery {
    fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_RECENT_LIMIT)
            .min(MAX_RECENT_LIMIT)
    }
}

/// GET /api/v1/vehicles/:id/readings
pub async fn recent_readings(
    State(state): State<ApiState>,
    Path(vehicle_id): Path<u64>,
    Query(query): Query<RecentQuery>,
) -> Response {
    vehicle_stream_page(&state, vehicle_id, |store| {
        store.recent_readings(vehicle_id, query.limit())
    })
}

/// GET /api/v1/vehicles/:id/predictions
pub async fn recent_predictions(
    State(state): State<ApiState>,
    Path(vehicle_id): Path<u64>,
    Query(query): Query<RecentQuery>,
) -> Response {
    vehicle_stream_page(&state, vehicle_id, |store| {
        store.recent_verdicts(vehicle_id, query.limit())
    })
}

/// Shared recent-history lookup. A registered vehicle with no rows yet gets
/// an empty list, not `NO_DATA` - lists are their own "nothing here" signal.
fn vehicle_stream_page<T: Serialize>(
    state: &ApiState,
    vehicle_id: u64,
    fetch: impl FnOnce(&FleetStore) -> Result<Vec<T>, crate::storage::StorageError>,
) -> Response {
    match state.store.vehicle_exists(vehicle_id) {
        Ok(false) => return ApiErrorResponse::vehicle_not_found(vehicle_id),
        Ok(true) => {}
        Err(e) => return ApiErrorResponse::storage(e.to_string()),
    }
    match fetch(&state.store) {
        Ok(rows) => ApiResponse::ok(rows),
        Err(e) => {
            error!(vehicle_id, error = %e, "Failed to read vehicle history");
            ApiErrorResponse::storage(e.to_string())
        }
    }
}

// ============================================================================
// Vehicle registry
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterVehicleRequest {
    pub name: String,
    pub model: String,
}

/// POST /api/v1/vehicles
pub async fn register_vehicle(
    State(state): State<ApiState>,
    Json(req): Json<RegisterVehicleRequest>,
) -> Response {
    let name = req.name.trim();
    if name.is_empty() {
        return ApiErrorResponse::bad_request("vehicle name must not be empty");
    }
    match state.store.vehicle_name_taken(name) {
        Ok(true) => {
            return ApiErrorResponse::bad_request(format!("vehicle '{name}' already exists"))
        }
        Ok(false) => {}
        Err(e) => return ApiErrorResponse::storage(e.to_string()),
    }
    match state.store.register_vehicle(name, &req.model) {
        Ok(vehicle) => ApiResponse::created(vehicle),
        Err(e) => {
            error!(error = %e, "Failed to register vehicle");
            ApiErrorResponse::storage(e.to_string())
        }
    }
}

/// GET /api/v1/vehicles/:id
pub async fn get_vehicle(State(state): State<ApiState>, Path(vehicle_id): Path<u64>) -> Response {
    match state.store.get_vehicle(vehicle_id) {
        Ok(Some(vehicle)) => ApiResponse::ok(vehicle),
        Ok(None) => ApiErrorResponse::vehicle_not_found(vehicle_id),
        Err(e) => {
            error!(vehicle_id, error = %e, "Failed to fetch vehicle");
            ApiErrorResponse::storage(e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateVehicleRequest {
    pub name: Option<String>,
    pub model: Option<String>,
    pub status: Option<VehicleStatus>,
}

/// PUT /api/v1/vehicles/:id
pub async fn update_vehicle(
    State(state): State<ApiState>,
    Path(vehicle_id): Path<u64>,
    Json(req): Json<UpdateVehicleRequest>,
) -> Response {
    if req.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return ApiErrorResponse::bad_request("vehicle name must not be empty");
    }
    match state.store.update_vehicle(
        vehicle_id,
        req.name.as_deref().map(str::trim),
        req.model.as_deref(),
        req.status,
    ) {
        Ok(Some(vehicle)) => ApiResponse::ok(vehicle),
        Ok(None) => ApiErrorResponse::vehicle_not_found(vehicle_id),
        Err(e) => {
            error!(vehicle_id, error = %e, "Failed to update vehicle");
            ApiErrorResponse::storage(e.to_string())
        }
    }
}

/// DELETE /api/v1/vehicles/:id
///
/// Removes the registry entry only; the vehicle's historical streams are
/// retained and stay queryable by id.
pub async fn deregister_vehicle(
    State(state): State<ApiState>,
    Path(vehicle_id): Path<u64>,
) -> Response {
    match state.store.deregister_vehicle(vehicle_id) {
        Ok(Some(vehicle)) => ApiResponse::ok(vehicle),
        Ok(None) => ApiErrorResponse::vehicle_not_found(vehicle_id),
        Err(e) => {
            error!(vehicle_id, error = %e, "Failed to deregister vehicle");
            ApiErrorResponse::storage(e.to_string())
        }
    }
}

/// GET /api/v1/vehicles
pub async fn list_vehicles(State(state): State<ApiState>) -> Response {
    match state.store.list_vehicles() {
        Ok(vehicles) => ApiResponse::ok(vehicles),
        Err(e) => {
            error!(error = %e, "Failed to list vehicles");
            ApiErrorResponse::storage(e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OpenMaintenanceRequest {
    pub issue_type: String,
    pub severity: Severity,
}

/// POST /api/v1/vehicles/:id/maintenance
///
/// Opens a manually-reported maintenance record. AI-originated records come
/// from the maintenance trigger, never from this endpoint.
pub async fn open_maintenance(
    State(state): State<ApiState>,
    Path(vehicle_id): Path<u64>,
    Json(req): Json<OpenMaintenanceRequest>,
) -> Response {
    let issue_type = req.issue_type.trim();
    if issue_type.is_empty() {
        return ApiErrorResponse::bad_request("issue_type must not be empty");
    }
    match state.store.vehicle_exists(vehicle_id) {
        Ok(false) => return ApiErrorResponse::vehicle_not_found(vehicle_id),
        Ok(true) => {}
        Err(e) => return ApiErrorResponse::storage(e.to_string()),
    }
    match state
        .store
        .open_manual_maintenance(vehicle_id, issue_type, req.severity)
    {
        Ok(record) => ApiResponse::created(record),
        Err(e) => {
            error!(vehicle_id, error = %e, "Failed to open maintenance record");
            ApiErrorResponse::storage(e.to_string())
        }
    }
}

/// GET /api/v1/vehicles/:id/maintenance
pub async fn vehicle_maintenance(
    State(state): State<ApiState>,
    Path(vehicle_id): Path<u64>,
) -> Response {
    match state.store.vehicle_exists(vehicle_id) {
        Ok(false) => return ApiErrorResponse::vehicle_not_found(vehicle_id),
        Ok(true) => {}
        Err(e) => return ApiErrorResponse::storage(e.to_string()),
    }
    match state.store.maintenance_for_vehicle(vehicle_id) {
        Ok(records) => ApiResponse::ok(records),
        Err(e) => {
            error!(vehicle_id, error = %e, "Failed to list maintenance records");
            ApiErrorResponse::storage(e.to_string())
        }
    }
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub storage: crate::storage::StoreCounts,
    /// "loaded" when all three artifacts are present, "partial" otherwise.
    /// Partial availability means defaulted scores, not an outage.
    pub ml_models: &'static str,
    pub websocket_clients: usize,
    pub readings_ingested: u64,
}

/// GET /health
pub async fn health(State(state): State<ApiState>) -> Response {
    let report = HealthReport {
        status: "healthy",
        uptime_secs: state.started_at.elapsed().as_secs(),
        storage: state.store.counts(),
        ml_models: if state.ensemble.is_ready() {
            "loaded"
        } else {
            "partial"
        },
        websocket_clients: state.hub.observer_count().await,
        readings_ingested: state.pipeline.ingested_count(),
    };
    ApiResponse::ok(report)
}
