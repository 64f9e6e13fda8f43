//! Vehicle registry operations

use chrono::{DateTime, Utc};

use crate::types::{Vehicle, VehicleStatus};

use super::{FleetStore, StorageError};

impl FleetStore {
    /// Register a new vehicle, assigning its id.
    pub fn register_vehicle(&self, name: &str, model: &str) -> Result<Vehicle, StorageError> {
        let vehicle = Vehicle {
            id: self.next_id()?,
            name: name.to_string(),
            model: model.to_string(),
            status: VehicleStatus::Active,
            created_at: Utc::now(),
            last_seen: None,
        };
        self.vehicles_tree()
            .insert(vehicle.id.to_be_bytes(), serde_json::to_vec(&vehicle)?)?;
        Ok(vehicle)
    }

    /// Look up one vehicle by id.
    pub fn get_vehicle(&self, vehicle_id: u64) -> Result<Option<Vehicle>, StorageError> {
        match self.vehicles_tree().get(vehicle_id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Existence check used by the ingest pipeline.
    pub fn vehicle_exists(&self, vehicle_id: u64) -> Result<bool, StorageError> {
        Ok(self
            .vehicles_tree()
            .contains_key(vehicle_id.to_be_bytes())?)
    }

    /// All registered vehicles, id-ordered.
    pub fn list_vehicles(&self) -> Result<Vec<Vehicle>, StorageError> {
        let mut vehicles = Vec::new();
        for item in self.vehicles_tree().iter() {
            let (_key, value) = item?;
            match serde_json::from_slice(&value) {
                Ok(v) => vehicles.push(v),
                Err(e) => tracing::warn!(error = %e, "Skipping undecodable vehicle row"),
            }
        }
        Ok(vehicles)
    }

    /// True when some registered vehicle already carries this name.
    pub fn vehicle_name_taken(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.list_vehicles()?.iter().any(|v| v.name == name))
    }

    /// Update a vehicle's mutable fields. `None` leaves a field unchanged.
    /// Returns the updated vehicle, or `None` when the id is unknown.
    pub fn update_vehicle(
        &self,
        vehicle_id: u64,
        name: Option<&str>,
        model: Option<&str>,
        status: Option<VehicleStatus>,
    ) -> Result<Option<Vehicle>, StorageError> {
        let Some(mut vehicle) = self.get_vehicle(vehicle_id)? else {
            return Ok(None);
        };
        if let Some(name) = name {
            vehicle.name = name.to_string();
        }
        if let Some(model) = model {
            vehicle.model = model.to_string();
        }
        if let Some(status) = status {
            vehicle.status = status;
        }
        self.vehicles_tree()
            .insert(vehicle.id.to_be_bytes(), serde_json::to_vec(&vehicle)?)?;
        Ok(Some(vehicle))
    }

    /// Remove a vehicle from the registry. Returns the removed entry, or
    /// `None` when the id is unknown. The vehicle's historical readings,
    /// verdicts, and maintenance records stay in their streams.
    pub fn deregister_vehicle(&self, vehicle_id: u64) -> Result<Option<Vehicle>, StorageError> {
        match self.vehicles_tree().remove(vehicle_id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Stamp a vehicle's last-seen time. Missing vehicle is a no-op: the
    /// existence check happened before ingest and a concurrent deregistration
    /// should not fail the reading that already passed it.
    pub fn touch_vehicle(
        &self,
        vehicle_id: u64,
        seen_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        if let Some(mut vehicle) = self.get_vehicle(vehicle_id)? {
            vehicle.last_seen = Some(seen_at);
            self.vehicles_tree()
                .insert(vehicle.id.to_be_bytes(), serde_json::to_vec(&vehicle)?)?;
        }
        Ok(())
    }
}
