//! Attribution engine
//!
//! Ranks the estimator's additive output decomposition so the most
//! influential features can be surfaced in the verdict. Ranking is by
//! descending absolute contribution; the sort is stable, so ties keep the
//! original feature order and repeated runs produce identical output.

use crate::feature_extractor::FeatureVector;
use crate::models::estimator::ProbabilityEstimator;
use crate::types::prediction::{Attribution, KeywordImportance};
use serde::Deserialize;

/// Explanation-stage settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ExplanationConfig {
    /// How many attributions to expose in the verdict
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Contribution above which a feature counts as dominant for the
    /// persona rules (risk-increasing side)
    #[serde(default = "default_dominance_threshold")]
    pub dominance_threshold: f64,

    /// Keyword cap for bag-of-terms job postings
    #[serde(default = "default_max_keywords")]
    pub max_keywords: usize,
}

fn default_top_k() -> usize {
    5
}

fn default_dominance_threshold() -> f64 {
    0.1
}

fn default_max_keywords() -> usize {
    10
}

impl Default for ExplanationConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            dominance_threshold: default_dominance_threshold(),
            max_keywords: default_max_keywords(),
        }
    }
}

/// Full ranked decomposition of one prediction.
#[derive(Debug, Clone)]
pub struct Explanation {
    /// Estimator output with every contribution removed
    pub baseline: f64,

    /// All attributions, ranked by descending |contribution|
    pub ranked: Vec<Attribution>,
}

impl Explanation {
    /// Top-K attributions for the verdict.
    pub fn top(&self, k: usize) -> Vec<Attribution> {
        self.ranked.iter().take(k).cloned().collect()
    }

    /// Term-level view for bag-of-terms models: keywords actually present
    /// in the text, ranked by contribution magnitude.
    pub fn keywords(&self, max: usize) -> Vec<KeywordImportance> {
        self.ranked
            .iter()
            .filter(|a| a.value != 0.0)
            .take(max)
            .map(|a| KeywordImportance {
                keyword: a.feature.clone(),
                score: a.contribution,
            })
            .collect()
    }
}

/// Decompose the estimator's raw output over the feature vector.
pub fn explain(features: &FeatureVector, estimator: &dyn ProbabilityEstimator) -> Explanation {
    let contributions = estimator.contributions(&features.values);

    let mut ranked: Vec<Attribution> = features
        .names
        .iter()
        .zip(&features.values)
        .zip(&contributions.values)
        .map(|((name, value), contribution)| Attribution {
            feature: name.clone(),
            value: *value,
            contribution: *contribution,
        })
        .collect();

    // Stable sort keeps original feature order for equal magnitudes.
    ranked.sort_by(|a, b| {
        b.contribution
            .abs()
            .partial_cmp(&a.contribution.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    Explanation {
        baseline: contributions.baseline,
        ranked,
    }
}
