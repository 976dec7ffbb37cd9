//! Typed failures surfaced by the prediction pipeline

use crate::types::record::RecordKind;
use thiserror::Error;

/// Errors a single pipeline evaluation can fail with.
///
/// `AnomalyOutcome::Unavailable` is deliberately not represented here: a
/// missing anomaly model is a first-class outcome, not a failure.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No model artifact is registered for the requested record kind.
    #[error("no model artifact loaded for record kind `{0}`")]
    ModelNotLoaded(RecordKind),

    /// A required input field is missing or malformed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The vectorized feature shape disagrees with the loaded model schema.
    #[error("feature schema mismatch: model expects {expected} features, got {actual}")]
    FeatureSchemaMismatch { expected: usize, actual: usize },

    /// A model artifact document is structurally invalid.
    #[error("invalid model artifact: {0}")]
    Artifact(String),
}

impl PipelineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        PipelineError::Validation(msg.into())
    }

    pub fn artifact(msg: impl Into<String>) -> Self {
        PipelineError::Artifact(msg.into())
    }
}
