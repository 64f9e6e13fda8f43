//! Core domain types
//!
//! Organized by concern:
//! - `telemetry` - Sensor readings and the model feature vector
//! - `verdict` - Ensemble risk assessments
//! - `maintenance` - Maintenance work items
//! - `vehicle` - Fleet registry entities
//! - `broadcast` - Live observer update payloads

mod broadcast;
mod maintenance;
mod telemetry;
mod vehicle;
mod verdict;

pub use broadcast::{ReadingSummary, TelemetryUpdate, VerdictSummary};
pub use maintenance::{IssueOrigin, MaintenanceRecord, MaintenanceStatus, Severity};
pub use telemetry::{FeatureVector, Reading, ReadingPayload};
pub use vehicle::{Vehicle, VehicleStatus};
pub use verdict::Verdict;
