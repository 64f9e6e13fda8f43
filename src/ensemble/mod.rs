//! Model Ensemble Host
//!
//! Owns the three pretrained scoring capabilities: a binary failure
//! classifier, a failure-confidence estimator, and an anomaly scorer.
//! Artifacts are loaded once at startup and never mutated afterwards, so a
//! shared `Arc<ModelEnsemble>` is safe for unsynchronized concurrent reads
//! from every in-flight ingest.
//!
//! Load failures are never fatal: a missing or unreadable artifact leaves
//! the host in a partial-availability state and the affected scoring call
//! returns a fixed default instead. The defaulted confidence of 0.5 is
//! itself the degradation signal callers can observe.

mod artifacts;

pub use artifacts::{AnomalyScorer, ConfidenceModel, FailureClassifier, Stump};

use std::path::Path;

use tracing::{info, warn};

use crate::types::FeatureVector;

/// Artifact file names discovered under the configured models directory.
pub const FAILURE_CLASSIFIER_FILE: &str = "failure_classifier.json";
pub const CONFIDENCE_MODEL_FILE: &str = "confidence_model.json";
pub const ANOMALY_SCORER_FILE: &str = "anomaly_scorer.json";

/// Fixed outputs when the failure classifier or confidence estimator is
/// unavailable.
pub const DEFAULT_FAILURE_SCORE: (u8, f64) = (0, 0.5);
/// Fixed outputs when the anomaly scorer is unavailable.
pub const DEFAULT_ANOMALY_SCORE: (u8, f64) = (0, 0.0);

/// Read-only host for the three scoring functions.
pub struct ModelEnsemble {
    failure: Option<FailureClassifier>,
    confidence: Option<ConfidenceModel>,
    anomaly: Option<AnomalyScorer>,
}

impl ModelEnsemble {
    /// Load all three artifacts from `dir`, independently.
    ///
    /// Never fails: each absent or unparseable artifact is logged and
    /// recorded as unavailable.
    pub fn load(dir: &Path) -> Self {
        let failure: Option<FailureClassifier> =
            load_artifact(dir, FAILURE_CLASSIFIER_FILE, "failure classifier");
        let confidence: Option<ConfidenceModel> =
            load_artifact(dir, CONFIDENCE_MODEL_FILE, "confidence model");
        let anomaly: Option<AnomalyScorer> =
            load_artifact(dir, ANOMALY_SCORER_FILE, "anomaly scorer");

        let ensemble = Self {
            failure,
            confidence,
            anomaly,
        };

        if ensemble.is_ready() {
            info!("All model artifacts loaded");
        } else {
            warn!(
                failure = ensemble.failure.is_some(),
                confidence = ensemble.confidence.is_some(),
                anomaly = ensemble.anomaly.is_some(),
                "Ensemble partially available - affected scores will use fixed defaults"
            );
        }

        ensemble
    }

    /// Build an ensemble directly from (possibly absent) parts.
    pub fn from_parts(
        failure: Option<FailureClassifier>,
        confidence: Option<ConfidenceModel>,
        anomaly: Option<AnomalyScorer>,
    ) -> Self {
        Self {
            failure,
            confidence,
            anomaly,
        }
    }

    /// A fully-unavailable ensemble; every score is the fixed default.
    pub fn unavailable() -> Self {
        Self::from_parts(None, None, None)
    }

    /// True only when all three artifacts loaded successfully.
    pub fn is_ready(&self) -> bool {
        self.failure.is_some() && self.confidence.is_some() && self.anomaly.is_some()
    }

    /// Failure prediction and class confidence.
    ///
    /// Both the classifier and the confidence estimator must be available;
    /// otherwise returns [`DEFAULT_FAILURE_SCORE`].
    pub fn score_failure(&self, features: &FeatureVector) -> (u8, f64) {
        match (&self.failure, &self.confidence) {
            (Some(clf), Some(conf)) => {
                let prediction = clf.predict(features);
                (prediction, conf.confidence_for(prediction, features))
            }
            _ => DEFAULT_FAILURE_SCORE,
        }
    }

    /// Anomaly flag and raw score, or [`DEFAULT_ANOMALY_SCORE`] when the
    /// scorer is unavailable.
    pub fn score_anomaly(&self, features: &FeatureVector) -> (u8, f64) {
        self.anomaly
            .as_ref()
            .map_or(DEFAULT_ANOMALY_SCORE, |scorer| scorer.score(features))
    }
}

/// Load one artifact file; absence and parse errors are downgraded to `None`.
fn load_artifact<T: serde::de::DeserializeOwned>(
    dir: &Path,
    file_name: &str,
    label: &str,
) -> Option<T> {
    let path = dir.join(file_name);
    if !path.exists() {
        warn!(path = %path.display(), "{label} artifact not found");
        return None;
    }
    match std::fs::read(&path) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(model) => {
                info!(path = %path.display(), "Loaded {label}");
                Some(model)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to parse {label} artifact");
                None
            }
        },
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read {label} artifact");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features() -> FeatureVector {
        FeatureVector {
            speed: 55.5,
            battery: 87.3,
            acc_x: 0.12,
            acc_y: -0.05,
            acc_z: 9.81,
            temp_motor: 65.5,
        }
    }

    #[test]
    fn test_load_from_empty_dir_is_degraded_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let ensemble = ModelEnsemble::load(dir.path());
        assert!(!ensemble.is_ready());
        assert_eq!(ensemble.score_failure(&features()), DEFAULT_FAILURE_SCORE);
        assert_eq!(ensemble.score_anomaly(&features()), DEFAULT_ANOMALY_SCORE);
    }

    #[test]
    fn test_corrupt_artifact_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(FAILURE_CLASSIFIER_FILE), b"not json").unwrap();
        let ensemble = ModelEnsemble::load(dir.path());
        assert!(!ensemble.is_ready());
        assert_eq!(ensemble.score_failure(&features()), DEFAULT_FAILURE_SCORE);
    }

    #[test]
    fn test_partial_load_defaults_failure_only() {
        let dir = tempfile::tempdir().unwrap();
        let scorer = AnomalyScorer {
            mean: [55.5, 87.3, 0.12, -0.05, 9.81, 65.5],
            std: [10.0, 10.0, 1.0, 1.0, 1.0, 10.0],
            offset: 0.5,
            flag_threshold: 0.0,
        };
        std::fs::write(
            dir.path().join(ANOMALY_SCORER_FILE),
            serde_json::to_vec(&scorer).unwrap(),
        )
        .unwrap();

        let ensemble = ModelEnsemble::load(dir.path());
        assert!(!ensemble.is_ready());
        // Failure side defaults, anomaly side scores for real.
        assert_eq!(ensemble.score_failure(&features()), DEFAULT_FAILURE_SCORE);
        let (flag, score) = ensemble.score_anomaly(&features());
        assert_eq!(flag, 0);
        assert!(score > 0.0);
    }

    #[test]
    fn test_full_roundtrip_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let clf = FailureClassifier {
            stumps: vec![Stump {
                feature: 5,
                threshold: 100.0,
                below: false,
            }],
        };
        let conf = ConfidenceModel {
            weights: [0.0; 6],
            bias: -1.0,
        };
        let scorer = AnomalyScorer {
            mean: [55.5, 87.3, 0.12, -0.05, 9.81, 65.5],
            std: [10.0; 6],
            offset: 0.5,
            flag_threshold: 0.0,
        };
        std::fs::write(
            dir.path().join(FAILURE_CLASSIFIER_FILE),
            serde_json::to_vec(&clf).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join(CONFIDENCE_MODEL_FILE),
            serde_json::to_vec(&conf).unwrap(),
        )
        .unwrap();
        std::fs::write(
            dir.path().join(ANOMALY_SCORER_FILE),
            serde_json::to_vec(&scorer).unwrap(),
        )
        .unwrap();

        let ensemble = ModelEnsemble::load(dir.path());
        assert!(ensemble.is_ready());

        let (pred, confidence) = ensemble.score_failure(&features());
        assert_eq!(pred, 0, "nominal temperature must not trip the stump");
        // Nominal prediction: confidence = 1 - sigmoid(-1) ~= 0.73.
        assert!(confidence > 0.72 && confidence < 0.74);
    }
}
