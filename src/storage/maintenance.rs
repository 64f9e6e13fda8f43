//! Maintenance record stream operations

use chrono::Utc;

use crate::types::{IssueOrigin, MaintenanceRecord, MaintenanceStatus, Severity};

use super::{readings::recent_in_stream, stream_key, vehicle_prefix, FleetStore, StorageError};

impl FleetStore {
    /// Append one maintenance record.
    pub fn insert_maintenance(&self, record: &MaintenanceRecord) -> Result<(), StorageError> {
        let key = stream_key(
            record.vehicle_id,
            record.created_at.timestamp_millis(),
            record.id,
        );
        self.maintenance_tree()
            .insert(key, serde_json::to_vec(record)?)?;
        Ok(())
    }

    /// Open a manually-reported maintenance record. The AI-originated path
    /// goes through the maintenance trigger instead.
    pub fn open_manual_maintenance(
        &self,
        vehicle_id: u64,
        issue_type: &str,
        severity: Severity,
    ) -> Result<MaintenanceRecord, StorageError> {
        let record = MaintenanceRecord {
            id: self.next_id()?,
            vehicle_id,
            issue_type: issue_type.to_string(),
            severity,
            origin: IssueOrigin::Manual,
            status: MaintenanceStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
        };
        self.insert_maintenance(&record)?;
        Ok(record)
    }

    /// All maintenance records for a vehicle, newest first.
    pub fn maintenance_for_vehicle(
        &self,
        vehicle_id: u64,
    ) -> Result<Vec<MaintenanceRecord>, StorageError> {
        recent_in_stream(self.maintenance_tree(), vehicle_id, usize::MAX)
    }

    /// Count of maintenance records for a vehicle.
    pub fn maintenance_count(&self, vehicle_id: u64) -> usize {
        self.maintenance_tree()
            .scan_prefix(vehicle_prefix(vehicle_id))
            .count()
    }
}
