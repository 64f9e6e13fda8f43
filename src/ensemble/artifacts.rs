//! Pretrained model artifacts
//!
//! Serde-JSON representations of the three scoring functions. Artifacts are
//! produced offline by the training pipeline; this crate only deserializes
//! and evaluates them. All evaluation is plain arithmetic over the fixed
//! 6-channel feature vector - channel order is part of the artifact contract.

use serde::{Deserialize, Serialize};

use crate::types::FeatureVector;

/// One axis-aligned decision stump: vote "failure" when the channel value
/// exceeds the threshold (or falls below it, when `below` is set).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stump {
    /// Feature channel index (0..6, training order)
    pub feature: usize,
    pub threshold: f64,
    /// Vote failure when the value is below the threshold instead of above
    #[serde(default)]
    pub below: bool,
}

impl Stump {
    fn votes_failure(&self, features: &[f64; 6]) -> bool {
        let value = features.get(self.feature).copied().unwrap_or(0.0);
        if self.below {
            value < self.threshold
        } else {
            value > self.threshold
        }
    }
}

/// Binary failure classifier: majority vote over a stump ensemble.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureClassifier {
    pub stumps: Vec<Stump>,
}

impl FailureClassifier {
    /// Predict 1 (failure) when a strict majority of stumps vote failure.
    pub fn predict(&self, features: &FeatureVector) -> u8 {
        if self.stumps.is_empty() {
            return 0;
        }
        let arr = features.as_array();
        let votes = self.stumps.iter().filter(|s| s.votes_failure(&arr)).count();
        u8::from(votes * 2 > self.stumps.len())
    }
}

/// Failure-probability estimator: logistic regression over the 6 channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceModel {
    pub weights: [f64; 6],
    pub bias: f64,
}

impl ConfidenceModel {
    /// Probability of the failure class, in (0, 1).
    pub fn failure_probability(&self, features: &FeatureVector) -> f64 {
        let arr = features.as_array();
        let z: f64 = self
            .weights
            .iter()
            .zip(arr.iter())
            .map(|(w, x)| w * x)
            .sum::<f64>()
            + self.bias;
        sigmoid(z)
    }

    /// Confidence in the class the classifier predicted: `p` for a failure
    /// prediction, `1 - p` for a nominal one.
    pub fn confidence_for(&self, prediction: u8, features: &FeatureVector) -> f64 {
        let p = self.failure_probability(features);
        if prediction == 1 {
            p
        } else {
            1.0 - p
        }
    }
}

/// Anomaly scorer: per-channel mean/std profile of nominal operation.
///
/// Score = `offset - mean(|z|)` across channels, so nominal readings score
/// near `offset` and outliers go negative. Flagged anomalous when the score
/// drops below `flag_threshold`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyScorer {
    pub mean: [f64; 6],
    pub std: [f64; 6],
    pub offset: f64,
    pub flag_threshold: f64,
}

impl AnomalyScorer {
    /// Returns `(flag, score)`; more negative score = more anomalous.
    pub fn score(&self, features: &FeatureVector) -> (u8, f64) {
        let arr = features.as_array();
        let mut z_sum = 0.0;
        for i in 0..6 {
            let std = if self.std[i].abs() < f64::EPSILON {
                1.0
            } else {
                self.std[i]
            };
            z_sum += ((arr[i] - self.mean[i]) / std).abs();
        }
        let score = self.offset - z_sum / 6.0;
        (u8::from(score < self.flag_threshold), score)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
