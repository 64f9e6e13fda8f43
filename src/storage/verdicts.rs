//! Verdict stream operations

use crate::types::Verdict;

use super::{readings::latest_in_stream, readings::recent_in_stream, stream_key, FleetStore, StorageError};

impl FleetStore {
    /// Append one verdict. The caller (the ingest pipeline) guarantees the
    /// originating reading is already persisted.
    pub fn insert_verdict(&self, verdict: &Verdict) -> Result<(), StorageError> {
        let key = stream_key(
            verdict.vehicle_id,
            verdict.timestamp.timestamp_millis(),
            verdict.id,
        );
        self.verdicts_tree()
            .insert(key, serde_json::to_vec(verdict)?)?;
        Ok(())
    }

    /// Newest verdict for a vehicle, if any.
    pub fn latest_verdict(&self, vehicle_id: u64) -> Result<Option<Verdict>, StorageError> {
        latest_in_stream(self.verdicts_tree(), vehicle_id)
    }

    /// Up to `limit` most recent verdicts for a vehicle, newest first.
    pub fn recent_verdicts(
        &self,
        vehicle_id: u64,
        limit: usize,
    ) -> Result<Vec<Verdict>, StorageError> {
        recent_in_stream(self.verdicts_tree(), vehicle_id, limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn verdict(id: u64, vehicle_id: u64, ts_offset_secs: i64, message: &str) -> Verdict {
        Verdict {
            id,
            vehicle_id,
            timestamp: Utc::now() + Duration::seconds(ts_offset_secs),
            failure_prediction: 0,
            failure_confidence: 0.5,
            anomaly_flag: 0,
            anomaly_score: 0.0,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_latest_verdict() {
        let dir = tempfile::tempdir().unwrap();
        let store = FleetStore::open(dir.path()).unwrap();

        store.insert_verdict(&verdict(1, 7, 0, "first")).unwrap();
        store.insert_verdict(&verdict(2, 7, 1, "second")).unwrap();

        assert_eq!(store.latest_verdict(7).unwrap().unwrap().message, "second");
        assert!(store.latest_verdict(8).unwrap().is_none());
    }
}
