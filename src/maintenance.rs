//! Maintenance Trigger
//!
//! Side-effect policy invoked by the pipeline when a verdict crosses the
//! risk gate: opens a pending, AI-originated maintenance record. The
//! pipeline treats a failure here as best-effort (logged, never surfaced
//! to the ingest caller); direct callers get the storage error back.

use chrono::Utc;
use tracing::info;

use crate::storage::{FleetStore, StorageError};
use crate::types::{IssueOrigin, MaintenanceRecord, MaintenanceStatus, Severity};

/// Confidence above which the pipeline invokes the trigger. Kept separate
/// from `policy::HIGH_CONFIDENCE` on purpose - the values coincide but the
/// thresholds govern different decisions.
pub const TRIGGER_CONFIDENCE: f64 = 0.7;

/// Confidence above which the opened record is critical rather than high.
pub const CRITICAL_CONFIDENCE: f64 = 0.9;

/// Issue category stamped on AI-opened records.
pub const AI_ISSUE_TYPE: &str = "motor_failure";

/// Opens maintenance records from qualifying verdicts.
#[derive(Clone)]
pub struct MaintenanceTrigger {
    store: FleetStore,
}

impl MaintenanceTrigger {
    pub fn new(store: FleetStore) -> Self {
        Self { store }
    }

    /// Open a pending maintenance record for the vehicle.
    ///
    /// Severity maps from the verdict confidence: > 0.9 critical, > 0.7
    /// high, otherwise medium. The medium branch is unreachable through the
    /// pipeline's gate but exists for direct callers.
    pub fn trigger(
        &self,
        vehicle_id: u64,
        confidence: f64,
    ) -> Result<MaintenanceRecord, StorageError> {
        let record = MaintenanceRecord {
            id: self.store.next_id()?,
            vehicle_id,
            issue_type: AI_ISSUE_TYPE.to_string(),
            severity: severity_for(confidence),
            origin: IssueOrigin::AiPredicted,
            status: MaintenanceStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
        };
        self.store.insert_maintenance(&record)?;

        info!(
            vehicle_id,
            severity = %record.severity,
            confidence,
            "Maintenance record opened from verdict"
        );

        Ok(record)
    }
}

/// Map verdict confidence to record severity.
pub fn severity_for(confidence: f64) -> Severity {
    if confidence > CRITICAL_CONFIDENCE {
        Severity::Critical
    } else if confidence > TRIGGER_CONFIDENCE {
        Severity::High
    } else {
        Severity::Medium
    }
}
