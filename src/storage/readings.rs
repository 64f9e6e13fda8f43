//! Reading stream operations

use chrono::{DateTime, Utc};

use crate::types::{Reading, ReadingPayload};

use super::{stream_key, vehicle_prefix, FleetStore, StorageError};

impl FleetStore {
    /// Persist one reading with a freshly assigned id and the given
    /// server-side timestamp. Returns the stored record.
    pub fn insert_reading(
        &self,
        payload: &ReadingPayload,
        timestamp: DateTime<Utc>,
    ) -> Result<Reading, StorageError> {
        let reading = Reading::from_payload(self.next_id()?, timestamp, payload);
        let key = stream_key(
            reading.vehicle_id,
            reading.timestamp.timestamp_millis(),
            reading.id,
        );
        self.readings_tree()
            .insert(key, serde_json::to_vec(&reading)?)?;
        Ok(reading)
    }

    /// Newest reading for a vehicle, if any.
    pub fn latest_reading(&self, vehicle_id: u64) -> Result<Option<Reading>, StorageError> {
        latest_in_stream(self.readings_tree(), vehicle_id)
    }

    /// Up to `limit` most recent readings for a vehicle, newest first.
    pub fn recent_readings(
        &self,
        vehicle_id: u64,
        limit: usize,
    ) -> Result<Vec<Reading>, StorageError> {
        recent_in_stream(self.readings_tree(), vehicle_id, limit)
    }
}

/// Newest JSON row in a vehicle's stream.
pub(crate) fn latest_in_stream<T: serde::de::DeserializeOwned>(
    tree: &sled::Tree,
    vehicle_id: u64,
) -> Result<Option<T>, StorageError> {
    match tree.scan_prefix(vehicle_prefix(vehicle_id)).last() {
        Some(item) => {
            let (_key, value) = item?;
            Ok(Some(serde_json::from_slice(&value)?))
        }
        None => Ok(None),
    }
}

/// Up to `limit` newest JSON rows in a vehicle's stream, newest first.
pub(crate) fn recent_in_stream<T: serde::de::DeserializeOwned>(
    tree: &sled::Tree,
    vehicle_id: u64,
    limit: usize,
) -> Result<Vec<T>, StorageError> {
    let mut rows = Vec::with_capacity(limit.min(64));
    for item in tree.scan_prefix(vehicle_prefix(vehicle_id)).rev() {
        if rows.len() >= limit {
            break;
        }
        let (_key, value) = item?;
        match serde_json::from_slice(&value) {
            Ok(row) => rows.push(row),
            Err(e) => tracing::warn!(error = %e, "Skipping undecodable stream row"),
        }
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn payload(vehicle_id: u64, speed: f64) -> ReadingPayload {
        ReadingPayload {
            vehicle_id,
            gps_lat: None,
            gps_lon: None,
            speed: Some(speed),
            battery: Some(90.0),
            acc_x: None,
            acc_y: None,
            acc_z: None,
            temp_motor: Some(55.0),
            raw_payload: None,
        }
    }

    #[test]
    fn test_latest_reading_orders_by_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = FleetStore::open(dir.path()).unwrap();

        let t0 = Utc::now();
        store.insert_reading(&payload(7, 10.0), t0).unwrap();
        store
            .insert_reading(&payload(7, 20.0), t0 + Duration::seconds(1))
            .unwrap();
        store
            .insert_reading(&payload(7, 30.0), t0 + Duration::seconds(2))
            .unwrap();

        let latest = store.latest_reading(7).unwrap().unwrap();
        assert_eq!(latest.speed, Some(30.0));
    }

    #[test]
    fn test_streams_are_isolated_per_vehicle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FleetStore::open(dir.path()).unwrap();

        let now = Utc::now();
        store.insert_reading(&payload(1, 11.0), now).unwrap();
        store.insert_reading(&payload(2, 22.0), now).unwrap();

        assert_eq!(store.latest_reading(1).unwrap().unwrap().speed, Some(11.0));
        assert_eq!(store.latest_reading(2).unwrap().unwrap().speed, Some(22.0));
        assert!(store.latest_reading(3).unwrap().is_none());
    }

    #[test]
    fn test_recent_readings_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = FleetStore::open(dir.path()).unwrap();

        let t0 = Utc::now();
        for i in 0..5 {
            store
                .insert_reading(&payload(4, f64::from(i)), t0 + Duration::seconds(i.into()))
                .unwrap();
        }

        let recent = store.recent_readings(4, 3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].speed, Some(4.0));
        assert_eq!(recent[2].speed, Some(2.0));
    }
}
