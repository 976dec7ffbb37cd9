//! Prediction output types

use crate::types::record::RecordKind;
use serde::{Deserialize, Serialize};

/// Signed per-feature contribution to the model output.
///
/// Contributions are additive: the estimator baseline plus the sum over all
/// features equals its raw output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribution {
    /// Feature name from the model schema
    pub feature: String,

    /// Observed feature value for this record
    pub value: f64,

    /// Signed contribution to the raw model output
    pub contribution: f64,
}

/// Keyword surfaced for job postings scored with a bag-of-terms model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordImportance {
    pub keyword: String,

    /// Signed contribution of the term to the raw model output
    pub score: f64,
}

/// Outcome of the anomaly stage.
///
/// `Unavailable` is distinct from a score of 0: it means no anomaly model
/// exists for the record kind, and downstream stages must treat it as a
/// missing signal rather than a benign one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnomalyOutcome {
    Scored {
        /// Native model output; positive for inliers, lower = more anomalous
        raw: f64,
        /// Presentation scale, 0-10, higher = more anomalous
        normalized: f64,
        /// Raw score compared against the artifact threshold
        is_anomalous: bool,
    },
    Unavailable,
}

impl AnomalyOutcome {
    pub fn is_available(&self) -> bool {
        matches!(self, AnomalyOutcome::Scored { .. })
    }

    /// Normalized 0-10 score, if the signal was available.
    pub fn normalized(&self) -> Option<f64> {
        match self {
            AnomalyOutcome::Scored { normalized, .. } => Some(*normalized),
            AnomalyOutcome::Unavailable => None,
        }
    }
}

/// Composite verdict for one evaluated record. Constructed once per request,
/// immutable, never persisted by the pipeline itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub record_kind: RecordKind,

    /// Supervised classifier output in [0, 1]
    pub fraud_probability: f64,

    /// Fused risk in [0, 1]; use this for decisions
    pub fused_risk: f64,

    /// Confidence in the fused risk, reduced for missing or disagreeing signals
    pub trust_score: f64,

    /// Anomaly on the 0-10 presentation scale; `None` when unavailable
    pub anomaly_score: Option<f64>,

    /// `None` when no anomaly model exists for this record kind
    pub is_anomalous: Option<bool>,

    pub fraud_persona: String,

    /// Top contributions ranked by descending magnitude
    pub top_features: Vec<Attribution>,

    /// Job postings with bag-of-terms models only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub important_keywords: Vec<KeywordImportance>,

    pub summary: String,

    pub recommended_actions: Vec<String>,
}

/// Per-row outcome of a bulk evaluation.
///
/// A malformed row never aborts the batch; it yields a `Failed` entry so the
/// output sequence stays the same length as the input.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchEntry {
    Ok {
        row: usize,
        #[serde(flatten)]
        result: Box<PredictionResult>,
    },
    Failed {
        row: usize,
        error: String,
    },
}

impl BatchEntry {
    pub fn is_ok(&self) -> bool {
        matches!(self, BatchEntry::Ok { .. })
    }
}
