//! Durable record store
//!
//! Sled-backed persistence for the four logical streams: vehicles,
//! readings, verdicts, and maintenance records. All values are JSON.
//! Per-vehicle streams use a big-endian composite key
//! `[vehicle_id | timestamp_millis | record_id]` so a prefix scan over the
//! vehicle id iterates chronologically and `.last()` is the newest row.
//!
//! Writes are append-only per stream; sled's background flushing provides
//! durability (on crash at most the last few writes are lost, acceptable
//! for a telemetry feed that keeps arriving).

mod maintenance;
mod readings;
mod vehicles;
mod verdicts;

use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Handle to the fleet record store. Cheap to clone; all clones share the
/// same underlying database.
#[derive(Clone)]
pub struct FleetStore {
    db: Arc<sled::Db>,
    vehicles: sled::Tree,
    readings: sled::Tree,
    verdicts: sled::Tree,
    maintenance: sled::Tree,
}

impl FleetStore {
    /// Open or create the store at the given directory.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path.as_ref())?;
        let vehicles = db.open_tree("vehicles")?;
        let readings = db.open_tree("readings")?;
        let verdicts = db.open_tree("verdicts")?;
        let maintenance = db.open_tree("maintenance")?;

        tracing::info!(path = %path.as_ref().display(), "Fleet store opened");

        Ok(Self {
            db: Arc::new(db),
            vehicles,
            readings,
            verdicts,
            maintenance,
        })
    }

    /// Allocate a store-wide unique record id.
    pub(crate) fn next_id(&self) -> Result<u64, StorageError> {
        Ok(self.db.generate_id()?)
    }

    pub(crate) fn vehicles_tree(&self) -> &sled::Tree {
        &self.vehicles
    }

    pub(crate) fn readings_tree(&self) -> &sled::Tree {
        &self.readings
    }

    pub(crate) fn verdicts_tree(&self) -> &sled::Tree {
        &self.verdicts
    }

    pub(crate) fn maintenance_tree(&self) -> &sled::Tree {
        &self.maintenance
    }

    /// Row counts per stream, for the health endpoint.
    pub fn counts(&self) -> StoreCounts {
        StoreCounts {
            vehicles: self.vehicles.len(),
            readings: self.readings.len(),
            verdicts: self.verdicts.len(),
            maintenance: self.maintenance.len(),
        }
    }
}

/// Row counts per logical stream.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct StoreCounts {
    pub vehicles: usize,
    pub readings: usize,
    pub verdicts: usize,
    pub maintenance: usize,
}

/// Composite key for per-vehicle chronological streams.
pub(crate) fn stream_key(vehicle_id: u64, timestamp_millis: i64, record_id: u64) -> [u8; 24] {
    let mut key = [0u8; 24];
    key[..8].copy_from_slice(&vehicle_id.to_be_bytes());
    // Millis since epoch are non-negative for any realistic clock; cast
    // keeps byte order consistent with unsigned comparison.
    #[allow(clippy::cast_sign_loss)]
    let ts = timestamp_millis.max(0) as u64;
    key[8..16].copy_from_slice(&ts.to_be_bytes());
    key[16..].copy_from_slice(&record_id.to_be_bytes());
    key
}

/// Prefix covering every row of one vehicle's stream.
pub(crate) fn vehicle_prefix(vehicle_id: u64) -> [u8; 8] {
    vehicle_id.to_be_bytes()
}
