//! Unsupervised anomaly scoring (isolation forest)
//!
//! Raw scores follow the decision-function convention of the reference
//! model family: positive for inliers, lower and negative for outliers.
//! Downstream stages never see the raw score directly; the detector also
//! produces the 0-10 presentation scale via a deterministic affine clamp
//! against empirical bounds stored in the artifact.

use crate::types::prediction::AnomalyOutcome;
use serde::{Deserialize, Serialize};

/// Euler-Mascheroni constant, used by the average path length correction.
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// Node of a fitted isolation tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IsoNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Number of training samples that ended in this leaf
        size: u64,
    },
}

/// A fitted isolation tree as a flat node array, root at index 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsoTree {
    pub nodes: Vec<IsoNode>,
}

impl IsoTree {
    pub fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("isolation tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            if let IsoNode::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                if *feature >= n_features {
                    return Err(format!(
                        "node {idx} splits on feature {feature}, schema has {n_features}"
                    ));
                }
                for child in [*left, *right] {
                    if child <= idx || child >= self.nodes.len() {
                        return Err(format!(
                            "node {idx} has child index {child} outside ({idx}, {})",
                            self.nodes.len()
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    /// Path length for this vector: split depth plus the c(n) correction
    /// for the unbuilt subtree below the leaf.
    fn path_length(&self, features: &[f64]) -> f64 {
        let mut idx = 0;
        let mut depth = 0.0;
        loop {
            match &self.nodes[idx] {
                IsoNode::Leaf { size } => return depth + average_path_length(*size),
                IsoNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    depth += 1.0;
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Average path length of an unsuccessful BST search over n samples.
fn average_path_length(n: u64) -> f64 {
    match n {
        0 | 1 => 0.0,
        2 => 1.0,
        _ => {
            let n = n as f64;
            2.0 * ((n - 1.0).ln() + EULER_GAMMA) - 2.0 * (n - 1.0) / n
        }
    }
}

/// Serialized anomaly model inside an artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalySpec {
    pub trees: Vec<IsoTree>,

    /// Subsample size each tree was grown on
    pub subsample_size: u64,

    /// Raw-score cutoff: below this the record is flagged anomalous
    pub raw_threshold: f64,

    /// Empirical raw-score bounds from training, used for 0-10 normalization
    pub raw_min: f64,
    pub raw_max: f64,
}

/// Runtime anomaly detector built from a validated [`AnomalySpec`].
#[derive(Debug)]
pub struct AnomalyDetector {
    trees: Vec<IsoTree>,
    subsample_size: u64,
    raw_threshold: f64,
    raw_min: f64,
    raw_max: f64,
}

impl AnomalyDetector {
    pub fn from_spec(spec: AnomalySpec, n_features: usize) -> Result<Self, String> {
        if spec.trees.is_empty() {
            return Err("anomaly model has no trees".to_string());
        }
        if spec.subsample_size < 2 {
            return Err("anomaly model subsample_size must be at least 2".to_string());
        }
        if spec.raw_max <= spec.raw_min {
            return Err(format!(
                "anomaly bounds are degenerate: raw_min {} >= raw_max {}",
                spec.raw_min, spec.raw_max
            ));
        }
        for (i, tree) in spec.trees.iter().enumerate() {
            tree.validate(n_features)
                .map_err(|e| format!("isolation tree {i}: {e}"))?;
        }
        Ok(Self {
            trees: spec.trees,
            subsample_size: spec.subsample_size,
            raw_threshold: spec.raw_threshold,
            raw_min: spec.raw_min,
            raw_max: spec.raw_max,
        })
    }

    /// Raw decision-function score: 0.5 - 2^(-E[h(x)] / c(subsample)).
    pub fn raw_score(&self, features: &[f64]) -> f64 {
        let mean_path: f64 = self
            .trees
            .iter()
            .map(|t| t.path_length(features))
            .sum::<f64>()
            / self.trees.len() as f64;
        let denom = average_path_length(self.subsample_size);
        let s = 2f64.powf(-mean_path / denom);
        0.5 - s
    }

    /// Monotone affine clamp of the raw score onto the 0-10 scale;
    /// 10 = most anomalous.
    pub fn normalize(&self, raw: f64) -> f64 {
        let unit = (self.raw_max - raw) / (self.raw_max - self.raw_min);
        (10.0 * unit).clamp(0.0, 10.0)
    }

    pub fn score(&self, features: &[f64]) -> AnomalyOutcome {
        let raw = self.raw_score(features);
        AnomalyOutcome::Scored {
            raw,
            normalized: self.normalize(raw),
            is_anomalous: raw < self.raw_threshold,
        }
    }
}
