//! Live observer update payloads
//!
//! Wire shape consumed by WebSocket subscribers: a tagged update carrying
//! the salient reading fields and the verdict, not the full records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Reading, Verdict};

/// Reduced reading fields included in a broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingSummary {
    pub speed: Option<f64>,
    pub battery: Option<f64>,
    pub gps_lat: Option<f64>,
    pub gps_lon: Option<f64>,
    pub temp_motor: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Verdict fields included in a broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerdictSummary {
    pub failure: u8,
    pub confidence: f64,
    pub anomaly: bool,
    pub message: String,
}

/// One fan-out message, tagged for client-side dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename = "sensor_update")]
pub struct TelemetryUpdate {
    pub vehicle_id: u64,
    pub sensor_data: ReadingSummary,
    pub prediction: VerdictSummary,
}

impl TelemetryUpdate {
    /// Reduce a persisted reading + verdict pair to the broadcast shape.
    pub fn new(reading: &Reading, verdict: &Verdict) -> Self {
        Self {
            vehicle_id: reading.vehicle_id,
            sensor_data: ReadingSummary {
                speed: reading.speed,
                battery: reading.battery,
                gps_lat: reading.gps_lat,
                gps_lon: reading.gps_lon,
                temp_motor: reading.temp_motor,
                timestamp: reading.timestamp,
            },
            prediction: VerdictSummary {
                failure: verdict.failure_prediction,
                confidence: verdict.failure_confidence,
                anomaly: verdict.anomaly_flag == 1,
                message: verdict.message.clone(),
            },
        }
    }
}
