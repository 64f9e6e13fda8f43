//! Fleet registry entities
//!
//! The pipeline itself only needs "does vehicle X exist"; the full entity
//! backs the registry endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Vehicle operational status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Active,
    Inactive,
    Maintenance,
}

impl Default for VehicleStatus {
    fn default() -> Self {
        Self::Active
    }
}

/// One registered fleet vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: u64,
    pub name: String,
    pub model: String,
    #[serde(default)]
    pub status: VehicleStatus,
    pub created_at: DateTime<Utc>,
    /// Updated whenever a reading from this vehicle is ingested
    pub last_seen: Option<DateTime<Utc>>,
}
