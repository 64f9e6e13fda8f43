//! API Regression Tests
//!
//! Drives the full router in-process with `tower::ServiceExt::oneshot`,
//! asserting the envelope shape, status codes, and the distinguishable
//! not-found codes on the read-latest endpoints.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use fleet_sentinel::api::{create_app, ApiState};
use fleet_sentinel::ensemble::{AnomalyScorer, ConfidenceModel, FailureClassifier, ModelEnsemble};
use fleet_sentinel::{BroadcastHub, FleetStore, IngestPipeline};

struct TestApp {
    _data_dir: tempfile::TempDir,
    app: Router,
    store: FleetStore,
}

/// Build the app over temp storage with an in-memory ensemble: failure
/// trips on temp_motor > 100 at ~0.88 confidence, anomaly profile centered
/// on nominal city driving.
fn test_app() -> TestApp {
    let data_dir = tempfile::tempdir().unwrap();
    let store = FleetStore::open(data_dir.path()).unwrap();

    let ensemble = Arc::new(ModelEnsemble::from_parts(
        Some(FailureClassifier {
            stumps: vec![fleet_sentinel::ensemble::Stump {
                feature: 5,
                threshold: 100.0,
                below: false,
            }],
        }),
        Some(ConfidenceModel {
            weights: [0.0; 6],
            bias: 2.0,
        }),
        Some(AnomalyScorer {
            mean: [55.5, 87.3, 0.12, -0.05, 9.81, 65.5],
            std: [15.0, 15.0, 1.0, 1.0, 1.0, 15.0],
            offset: 0.5,
            flag_threshold: 0.0,
        }),
    ));

    let hub = Arc::new(BroadcastHub::new(16));
    let pipeline = Arc::new(IngestPipeline::new(
        store.clone(),
        Arc::clone(&ensemble),
        Arc::clone(&hub),
        8,
    ));

    let app = create_app(ApiState::new(pipeline, store.clone(), ensemble, hub));
    TestApp {
        _data_dir: data_dir,
        app,
        store,
    }
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_loaded_ensemble_and_counts() {
    let t = test_app();
    let resp = t.app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let v = body_json(resp).await;
    assert_eq!(v["data"]["status"], "healthy");
    assert_eq!(v["data"]["ml_models"], "loaded");
    assert_eq!(v["data"]["storage"]["readings"], 0);
    assert_eq!(v["data"]["websocket_clients"], 0);
    assert_eq!(v["meta"]["version"], "1");
}

#[tokio::test]
async fn test_register_vehicle_then_list() {
    let t = test_app();

    let resp = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/vehicles",
            json!({"name": "AV-001", "model": "Falcon Mk2"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let v = body_json(resp).await;
    assert_eq!(v["data"]["name"], "AV-001");
    assert_eq!(v["data"]["status"], "active");

    let resp = t.app.oneshot(get_request("/api/v1/vehicles")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_vehicle_crud_roundtrip() {
    let t = test_app();
    let vehicle = t.store.register_vehicle("AV-001", "Falcon").unwrap();
    let uri = format!("/api/v1/vehicles/{}", vehicle.id);

    let resp = t.app.clone().oneshot(get_request(&uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["name"], "AV-001");

    // Partial update: status flips, untouched fields stay.
    let resp = t
        .app
        .clone()
        .oneshot(json_request("PUT", &uri, json!({"status": "maintenance"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v["data"]["status"], "maintenance");
    assert_eq!(v["data"]["model"], "Falcon");

    let resp = t
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(&uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["id"], vehicle.id);

    let resp = t.app.oneshot(get_request(&uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"]["code"], "VEHICLE_NOT_FOUND");
}

#[tokio::test]
async fn test_register_vehicle_rejects_duplicate_name() {
    let t = test_app();
    t.store.register_vehicle("AV-001", "Falcon").unwrap();

    let resp = t
        .app
        .oneshot(json_request(
            "POST",
            "/api/v1/vehicles",
            json!({"name": "AV-001", "model": "Falcon Mk2"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_manual_maintenance_record() {
    let t = test_app();
    let vehicle = t.store.register_vehicle("AV-001", "Falcon").unwrap();
    let uri = format!("/api/v1/vehicles/{}/maintenance", vehicle.id);

    let resp = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            &uri,
            json!({"issue_type": "brake_wear", "severity": "low"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    let v = body_json(resp).await;
    assert_eq!(v["data"]["origin"], "manual");
    assert_eq!(v["data"]["status"], "pending");
    assert_eq!(v["data"]["severity"], "low");

    let resp = t.app.clone().oneshot(get_request(&uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"].as_array().unwrap().len(), 1);

    // Blank issue type is rejected before any write.
    let resp = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            &uri,
            json!({"issue_type": "  ", "severity": "high"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Unknown vehicle is a 404, not a silent create.
    let resp = t
        .app
        .oneshot(json_request(
            "POST",
            "/api/v1/vehicles/999/maintenance",
            json!({"issue_type": "brake_wear", "severity": "low"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"]["code"], "VEHICLE_NOT_FOUND");
}

#[tokio::test]
async fn test_recent_history_endpoints() {
    let t = test_app();
    let vehicle = t.store.register_vehicle("AV-001", "Falcon").unwrap();

    // A silent vehicle gets empty lists, unlike the latest-row endpoints.
    let readings_uri = format!("/api/v1/vehicles/{}/readings", vehicle.id);
    let resp = t.app.clone().oneshot(get_request(&readings_uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_json(resp).await["data"].as_array().unwrap().is_empty());

    for speed in [10.0, 20.0, 30.0] {
        let resp = t
            .app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/sensor-data",
                json!({"vehicle_id": vehicle.id, "speed": speed}),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let resp = t
        .app
        .clone()
        .oneshot(get_request(&format!("{readings_uri}?limit=2")))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    let rows = v["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["speed"], 30.0, "newest first");

    let uri = format!("/api/v1/vehicles/{}/predictions", vehicle.id);
    let resp = t.app.clone().oneshot(get_request(&uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v["data"].as_array().unwrap().len(), 3);
    assert!(v["data"][0]["message"].is_string());

    let resp = t
        .app
        .oneshot(get_request("/api/v1/vehicles/999/predictions"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"]["code"], "VEHICLE_NOT_FOUND");
}

#[tokio::test]
async fn test_register_vehicle_rejects_blank_name() {
    let t = test_app();
    let resp = t
        .app
        .oneshot(json_request(
            "POST",
            "/api/v1/vehicles",
            json!({"name": "   ", "model": "Falcon"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let v = body_json(resp).await;
    assert_eq!(v["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_ingest_unknown_vehicle_is_vehicle_not_found() {
    let t = test_app();
    let resp = t
        .app
        .oneshot(json_request(
            "POST",
            "/api/v1/sensor-data",
            json!({"vehicle_id": 999, "speed": 40.0}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let v = body_json(resp).await;
    assert_eq!(v["error"]["code"], "VEHICLE_NOT_FOUND");

    // Nothing was persisted for the rejected reading.
    assert_eq!(t.store.counts().readings, 0);
}

#[tokio::test]
async fn test_ingest_returns_combined_outcome() {
    let t = test_app();
    let vehicle = t.store.register_vehicle("AV-001", "Falcon").unwrap();

    let resp = t
        .app
        .oneshot(json_request(
            "POST",
            "/api/v1/sensor-data",
            json!({
                "vehicle_id": vehicle.id,
                "speed": 55.5,
                "battery": 87.3,
                "acc_x": 0.12,
                "acc_y": -0.05,
                "acc_z": 9.81,
                "temp_motor": 65.5,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let v = body_json(resp).await;
    assert_eq!(v["data"]["vehicle_id"], vehicle.id);
    assert_eq!(v["data"]["failure"], 0);
    assert_eq!(v["data"]["anomaly"], false);
    assert_eq!(v["data"]["message"], "operating normally.");
    assert!(v["data"]["reading_id"].is_u64());
    assert!(v["data"]["verdict_id"].is_u64());
}

#[tokio::test]
async fn test_ingest_accepts_sparse_payload() {
    let t = test_app();
    let vehicle = t.store.register_vehicle("AV-002", "Falcon").unwrap();

    // Only the vehicle id; every sensor channel missing. Scoring runs on
    // the neutral fill values instead of rejecting the reading.
    let resp = t
        .app
        .oneshot(json_request(
            "POST",
            "/api/v1/sensor-data",
            json!({"vehicle_id": vehicle.id}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(t.store.counts().readings, 1);
}

#[tokio::test]
async fn test_latest_sensor_distinguishes_missing_vehicle_from_no_data() {
    let t = test_app();
    let vehicle = t.store.register_vehicle("AV-003", "Falcon").unwrap();

    // Unknown vehicle.
    let resp = t
        .app
        .clone()
        .oneshot(get_request("/api/v1/vehicles/999/latest-sensor"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"]["code"], "VEHICLE_NOT_FOUND");

    // Registered but silent vehicle.
    let uri = format!("/api/v1/vehicles/{}/latest-sensor", vehicle.id);
    let resp = t.app.clone().oneshot(get_request(&uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"]["code"], "NO_DATA");

    // After one ingest the latest reading is served.
    let resp = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/sensor-data",
            json!({"vehicle_id": vehicle.id, "speed": 33.0}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = t.app.oneshot(get_request(&uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["speed"], 33.0);
}

#[tokio::test]
async fn test_latest_prediction_serves_persisted_verdict() {
    let t = test_app();
    let vehicle = t.store.register_vehicle("AV-004", "Falcon").unwrap();

    // Overheating reading: failure=1, sigmoid(2.0) ~= 0.88 > 0.7, anomalous.
    let resp = t
        .app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/sensor-data",
            json!({
                "vehicle_id": vehicle.id,
                "speed": 55.5,
                "battery": 8.0,
                "temp_motor": 120.0,
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);

    let uri = format!("/api/v1/vehicles/{}/latest-prediction", vehicle.id);
    let resp = t.app.clone().oneshot(get_request(&uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    assert_eq!(v["data"]["failure_prediction"], 1);
    assert_eq!(v["data"]["anomaly_flag"], 1);
    assert_eq!(
        v["data"]["message"],
        "critical: high failure risk with anomalous behavior."
    );

    // The high-confidence failure also opened a maintenance record.
    let uri = format!("/api/v1/vehicles/{}/maintenance", vehicle.id);
    let resp = t.app.oneshot(get_request(&uri)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = body_json(resp).await;
    let records = v["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["severity"], "high");
    assert_eq!(records[0]["origin"], "ai_predicted");
    assert_eq!(records[0]["status"], "pending");
}

#[tokio::test]
async fn test_maintenance_list_for_unknown_vehicle_is_not_found() {
    let t = test_app();
    let resp = t
        .app
        .oneshot(get_request("/api/v1/vehicles/42/maintenance"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"]["code"], "VEHICLE_NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_ingest_body_is_client_error() {
    let t = test_app();
    let resp = t
        .app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/sensor-data")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(resp.status().is_client_error());
}
