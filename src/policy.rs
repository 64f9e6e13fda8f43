//! Decision policy
//!
//! Pure mapping from raw ensemble outputs to a human-readable verdict
//! message. First matching rule wins; no side effects, no clock, no I/O.
//!
//! The confidence gate is strict (`> 0.7`): a verdict at exactly 0.7 reads
//! "moderate" and, by the identical gate in the maintenance trigger, opens
//! no work item. The two thresholds are deliberately kept as separate
//! constants even though their values coincide.

/// Confidence above which a positive failure prediction is "high risk".
pub const HIGH_CONFIDENCE: f64 = 0.7;

pub const MSG_CRITICAL: &str = "critical: high failure risk with anomalous behavior.";
pub const MSG_HIGH_RISK: &str = "high failure risk.";
pub const MSG_MODERATE: &str = "moderate failure risk, monitoring recommended.";
pub const MSG_ANOMALY: &str = "anomalous readings, inspection recommended.";
pub const MSG_NORMAL: &str = "operating normally.";

/// Derive the verdict message from the ensemble outputs.
///
/// `anomaly_score` does not influence the message today; it is part of the
/// signature because the policy owns the full ensemble output tuple.
pub fn decide(
    failure_pred: u8,
    confidence: f64,
    anomaly_flag: u8,
    _anomaly_score: f64,
) -> &'static str {
    if failure_pred == 1 && confidence > HIGH_CONFIDENCE {
        if anomaly_flag == 1 {
            return MSG_CRITICAL;
        }
        return MSG_HIGH_RISK;
    }
    if failure_pred == 1 {
        return MSG_MODERATE;
    }
    if anomaly_flag == 1 {
        return MSG_ANOMALY;
    }
    MSG_NORMAL
}
