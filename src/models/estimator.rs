//! Supervised probability estimators
//!
//! The pipeline depends only on the [`ProbabilityEstimator`] capability;
//! which fitted family sits behind it is decided by the artifact at load
//! time. Gradient-boosted trees are the primary family, a random forest is
//! the fallback produced when the boosting library was unavailable during
//! training, and the linear model covers text schemas.

use crate::models::tree::DecisionTree;
use serde::{Deserialize, Serialize};

/// Additive decomposition of a raw model output.
///
/// `baseline + values.sum()` equals the estimator's raw output for the same
/// feature vector, up to floating-point accumulation.
#[derive(Debug, Clone)]
pub struct Contributions {
    pub baseline: f64,
    pub values: Vec<f64>,
}

/// Capability interface for the fitted supervised model.
///
/// Implementations are read-only after construction and safe for unlimited
/// concurrent callers. Feature slices are assumed to match `feature_count`;
/// the pipeline enforces this before invoking any method.
pub trait ProbabilityEstimator: Send + Sync {
    /// Model family name for logs and diagnostics.
    fn family(&self) -> &'static str;

    /// Feature arity the model was trained against.
    fn feature_count(&self) -> usize;

    /// Native model output: log-odds margin for the boosted and linear
    /// families, class probability for the forest.
    fn raw_output(&self, features: &[f64]) -> f64;

    /// Fraud probability in [0, 1].
    fn predict_probability(&self, features: &[f64]) -> f64;

    /// Per-feature additive decomposition of `raw_output`.
    fn contributions(&self, features: &[f64]) -> Contributions;
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Serialized estimator description inside a model artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum EstimatorSpec {
    GradientBoosted {
        /// Margin offset applied before the tree sum
        base_score: f64,
        trees: Vec<DecisionTree>,
    },
    RandomForest {
        /// Leaves hold the positive-class probability
        trees: Vec<DecisionTree>,
    },
    Linear {
        intercept: f64,
        weights: Vec<f64>,
    },
}

impl EstimatorSpec {
    /// Validate against the schema arity and build the runtime estimator.
    pub fn build(self, n_features: usize) -> Result<Box<dyn ProbabilityEstimator>, String> {
        match self {
            EstimatorSpec::GradientBoosted { base_score, trees } => {
                if trees.is_empty() {
                    return Err("gradient_boosted estimator has no trees".to_string());
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(n_features)
                        .map_err(|e| format!("gradient_boosted tree {i}: {e}"))?;
                }
                Ok(Box::new(GradientBoostedTrees {
                    base_score,
                    trees,
                    n_features,
                }))
            }
            EstimatorSpec::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err("random_forest estimator has no trees".to_string());
                }
                for (i, tree) in trees.iter().enumerate() {
                    tree.validate(n_features)
                        .map_err(|e| format!("random_forest tree {i}: {e}"))?;
                }
                Ok(Box::new(RandomForest { trees, n_features }))
            }
            EstimatorSpec::Linear { intercept, weights } => {
                if weights.len() != n_features {
                    return Err(format!(
                        "linear estimator has {} weights, schema has {n_features} features",
                        weights.len()
                    ));
                }
                Ok(Box::new(LinearModel { intercept, weights }))
            }
        }
    }
}

/// Boosted ensemble: probability = sigmoid(base_score + Σ leaf margins).
pub struct GradientBoostedTrees {
    base_score: f64,
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl ProbabilityEstimator for GradientBoostedTrees {
    fn family(&self) -> &'static str {
        "gradient_boosted"
    }

    fn feature_count(&self) -> usize {
        self.n_features
    }

    fn raw_output(&self, features: &[f64]) -> f64 {
        self.base_score
            + self
                .trees
                .iter()
                .map(|t| t.evaluate(features))
                .sum::<f64>()
    }

    fn predict_probability(&self, features: &[f64]) -> f64 {
        sigmoid(self.raw_output(features))
    }

    fn contributions(&self, features: &[f64]) -> Contributions {
        let mut values = vec![0.0; self.n_features];
        let mut baseline = self.base_score;
        for tree in &self.trees {
            baseline += tree.path_contributions(features, &mut values);
        }
        Contributions { baseline, values }
    }
}

/// Bagged ensemble: probability = mean of per-tree leaf probabilities.
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl ProbabilityEstimator for RandomForest {
    fn family(&self) -> &'static str {
        "random_forest"
    }

    fn feature_count(&self) -> usize {
        self.n_features
    }

    fn raw_output(&self, features: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.evaluate(features)).sum();
        sum / self.trees.len() as f64
    }

    fn predict_probability(&self, features: &[f64]) -> f64 {
        self.raw_output(features).clamp(0.0, 1.0)
    }

    fn contributions(&self, features: &[f64]) -> Contributions {
        let n = self.trees.len() as f64;
        let mut values = vec![0.0; self.n_features];
        let mut baseline = 0.0;
        for tree in &self.trees {
            baseline += tree.path_contributions(features, &mut values);
        }
        for v in &mut values {
            *v /= n;
        }
        Contributions {
            baseline: baseline / n,
            values,
        }
    }
}

/// Logistic regression over the vectorized features (text schemas).
pub struct LinearModel {
    intercept: f64,
    weights: Vec<f64>,
}

impl ProbabilityEstimator for LinearModel {
    fn family(&self) -> &'static str {
        "linear"
    }

    fn feature_count(&self) -> usize {
        self.weights.len()
    }

    fn raw_output(&self, features: &[f64]) -> f64 {
        self.intercept
            + self
                .weights
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }

    fn predict_probability(&self, features: &[f64]) -> f64 {
        sigmoid(self.raw_output(features))
    }

    fn contributions(&self, features: &[f64]) -> Contributions {
        Contributions {
            baseline: self.intercept,
            values: self
                .weights
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .collect(),
        }
    }
}
