//! Telemetry reading types
//!
//! A [`ReadingPayload`] is what a vehicle submits; a [`Reading`] is the
//! persisted record with a server-assigned id and timestamp. The stored
//! timestamp is always the ingestion clock - the payload deliberately
//! carries none, so a vehicle cannot backdate its own rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Neutral fill values applied before scoring when a sensor field is absent.
/// Must match what the models were trained against.
pub const DEFAULT_SPEED: f64 = 0.0;
pub const DEFAULT_BATTERY: f64 = 100.0;
pub const DEFAULT_ACCEL: f64 = 0.0;
pub const DEFAULT_TEMP_MOTOR: f64 = 25.0;

/// Inbound sensor sample as submitted by a vehicle.
///
/// All sensor channels are optional - a vehicle with a dead accelerometer
/// still reports speed and battery. Missing channels are filled with
/// neutral defaults at feature-extraction time, not at persist time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingPayload {
    pub vehicle_id: u64,
    /// GPS latitude (degrees)
    #[serde(default)]
    pub gps_lat: Option<f64>,
    /// GPS longitude (degrees)
    #[serde(default)]
    pub gps_lon: Option<f64>,
    /// Ground speed (km/h)
    #[serde(default)]
    pub speed: Option<f64>,
    /// Battery state of charge (%)
    #[serde(default)]
    pub battery: Option<f64>,
    /// Acceleration X axis (m/s^2)
    #[serde(default)]
    pub acc_x: Option<f64>,
    /// Acceleration Y axis (m/s^2)
    #[serde(default)]
    pub acc_y: Option<f64>,
    /// Acceleration Z axis (m/s^2)
    #[serde(default)]
    pub acc_z: Option<f64>,
    /// Motor temperature (degrees C)
    #[serde(default)]
    pub temp_motor: Option<f64>,
    /// Opaque vendor payload, stored verbatim
    #[serde(default)]
    pub raw_payload: Option<serde_json::Value>,
}

/// One persisted, immutable sensor sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub id: u64,
    pub vehicle_id: u64,
    /// Server-assigned ingestion timestamp (UTC)
    pub timestamp: DateTime<Utc>,
    pub gps_lat: Option<f64>,
    pub gps_lon: Option<f64>,
    pub speed: Option<f64>,
    pub battery: Option<f64>,
    pub acc_x: Option<f64>,
    pub acc_y: Option<f64>,
    pub acc_z: Option<f64>,
    pub temp_motor: Option<f64>,
    pub raw_payload: Option<serde_json::Value>,
}

impl Reading {
    /// Build a persisted reading from an inbound payload.
    pub fn from_payload(id: u64, timestamp: DateTime<Utc>, payload: &ReadingPayload) -> Self {
        Self {
            id,
            vehicle_id: payload.vehicle_id,
            timestamp,
            gps_lat: payload.gps_lat,
            gps_lon: payload.gps_lon,
            speed: payload.speed,
            battery: payload.battery,
            acc_x: payload.acc_x,
            acc_y: payload.acc_y,
            acc_z: payload.acc_z,
            temp_motor: payload.temp_motor,
            raw_payload: payload.raw_payload.clone(),
        }
    }

    /// Extract the model feature vector, filling missing channels with
    /// neutral defaults. Applied identically whether a channel was omitted
    /// or explicitly null.
    pub fn features(&self) -> FeatureVector {
        FeatureVector {
            speed: self.speed.unwrap_or(DEFAULT_SPEED),
            battery: self.battery.unwrap_or(DEFAULT_BATTERY),
            acc_x: self.acc_x.unwrap_or(DEFAULT_ACCEL),
            acc_y: self.acc_y.unwrap_or(DEFAULT_ACCEL),
            acc_z: self.acc_z.unwrap_or(DEFAULT_ACCEL),
            temp_motor: self.temp_motor.unwrap_or(DEFAULT_TEMP_MOTOR),
        }
    }
}

/// Fixed 6-channel feature vector consumed by the model ensemble.
///
/// Channel order is part of the artifact contract: speed, battery,
/// acc_x, acc_y, acc_z, temp_motor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub speed: f64,
    pub battery: f64,
    pub acc_x: f64,
    pub acc_y: f64,
    pub acc_z: f64,
    pub temp_motor: f64,
}

impl FeatureVector {
    /// Channels in training order.
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.speed,
            self.battery,
            self.acc_x,
            self.acc_y,
            self.acc_z,
            self.temp_motor,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_payload(vehicle_id: u64) -> ReadingPayload {
        ReadingPayload {
            vehicle_id,
            gps_lat: None,
            gps_lon: None,
            speed: None,
            battery: None,
            acc_x: None,
            acc_y: None,
            acc_z: None,
            temp_motor: None,
            raw_payload: None,
        }
    }

    #[test]
    fn test_features_fill_neutral_defaults() {
        let reading = Reading::from_payload(1, Utc::now(), &bare_payload(7));
        let f = reading.features();
        assert_eq!(
            f.as_array(),
            [0.0, 100.0, 0.0, 0.0, 0.0, 25.0],
            "missing channels must take the neutral fill values"
        );
    }

    #[test]
    fn test_features_keep_explicit_values() {
        let mut payload = bare_payload(7);
        payload.speed = Some(55.5);
        payload.battery = Some(87.3);
        payload.acc_x = Some(0.12);
        payload.acc_y = Some(-0.05);
        payload.acc_z = Some(9.81);
        payload.temp_motor = Some(65.5);

        let reading = Reading::from_payload(1, Utc::now(), &payload);
        assert_eq!(
            reading.features().as_array(),
            [55.5, 87.3, 0.12, -0.05, 9.81, 65.5]
        );
    }

    #[test]
    fn test_payload_deserializes_with_missing_channels() {
        let payload: ReadingPayload =
            serde_json::from_str(r#"{"vehicle_id": 3, "speed": 12.0}"#).unwrap();
        assert_eq!(payload.vehicle_id, 3);
        assert_eq!(payload.speed, Some(12.0));
        assert_eq!(payload.battery, None);
    }
}
