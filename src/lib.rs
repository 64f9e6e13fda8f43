//! Fleet Sentinel: Autonomous Fleet Telemetry Intelligence
//!
//! Real-time ingestion of vehicle sensor readings, scored against a
//! pretrained failure/anomaly model ensemble, with persisted verdicts,
//! threshold-driven maintenance tickets, and live observer fan-out.
//!
//! ## Architecture
//!
//! - **Ingestion Pipeline**: existence check -> persist -> score -> verdict -> side effects
//! - **Model Ensemble Host**: three load-once artifacts, partial-availability tolerant
//! - **Decision Policy**: pure verdict-message mapping
//! - **Maintenance Trigger**: opens work items when verdicts cross the risk gate
//! - **Broadcast Hub**: best-effort fan-out to live WebSocket observers

pub mod api;
pub mod config;
pub mod ensemble;
pub mod hub;
pub mod maintenance;
pub mod pipeline;
pub mod policy;
pub mod storage;
pub mod types;

// Re-export the service configuration
pub use config::SentinelConfig;

// Re-export commonly used types
pub use types::{
    FeatureVector, IssueOrigin, MaintenanceRecord, MaintenanceStatus, Reading, ReadingPayload,
    Severity, TelemetryUpdate, Vehicle, VehicleStatus, Verdict,
};

// Re-export the pipeline and its collaborators
pub use ensemble::ModelEnsemble;
pub use hub::BroadcastHub;
pub use maintenance::MaintenanceTrigger;
pub use pipeline::{IngestError, IngestOutcome, IngestPipeline, VerdictSink};

// Re-export storage
pub use storage::{FleetStore, StorageError};
