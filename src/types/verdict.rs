//! Verdict types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The ensemble's risk assessment for one reading. Append-only: verdicts
/// are never mutated after persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub id: u64,
    pub vehicle_id: u64,
    /// Pipeline-assigned timestamp (UTC)
    pub timestamp: DateTime<Utc>,
    /// Binary failure prediction (0 = nominal, 1 = failure expected)
    pub failure_prediction: u8,
    /// Confidence in the predicted class, [0, 1]
    pub failure_confidence: f64,
    /// Binary anomaly flag (0 = normal, 1 = anomalous)
    pub anomaly_flag: u8,
    /// Raw anomaly score; more negative = more anomalous
    pub anomaly_score: f64,
    /// Human-readable assessment from the decision policy
    pub message: String,
}
