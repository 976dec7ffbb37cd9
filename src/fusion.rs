//! Risk fusion
//!
//! Combines the supervised fraud probability with the normalized anomaly
//! signal into one fused risk value plus a trust score. The blend is a
//! convex combination favouring the supervised signal, with an uplift term
//! that raises the anomaly contribution when the unsupervised signal
//! sharply exceeds the supervised one. Keeping the uplift one-sided and its
//! weight no larger than the supervised weight keeps fused risk
//! non-decreasing in both inputs.

use crate::types::prediction::AnomalyOutcome;
use serde::Deserialize;

/// Fusion constants. Configuration, never derived at runtime.
#[derive(Debug, Clone, Deserialize)]
pub struct FusionConfig {
    /// Weight of the supervised probability in the base blend
    #[serde(default = "default_alpha")]
    pub alpha: f64,

    /// Disagreement (in [0,1] units) beyond which the uplift engages
    #[serde(default = "default_disagreement_threshold")]
    pub disagreement_threshold: f64,

    /// Uplift weight applied to anomaly excess past the threshold;
    /// effective value is capped at `alpha` to preserve monotonicity
    #[serde(default = "default_disagreement_boost")]
    pub disagreement_boost: f64,

    /// Trust penalty when the anomaly signal is unavailable
    #[serde(default = "default_missing_signal_penalty")]
    pub missing_signal_penalty: f64,

    /// Trust lost per unit of disagreement between the two signals
    #[serde(default = "default_disagreement_trust_weight")]
    pub disagreement_trust_weight: f64,
}

fn default_alpha() -> f64 {
    0.65
}

fn default_disagreement_threshold() -> f64 {
    0.35
}

fn default_disagreement_boost() -> f64 {
    0.30
}

fn default_missing_signal_penalty() -> f64 {
    0.25
}

fn default_disagreement_trust_weight() -> f64 {
    0.5
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
            disagreement_threshold: default_disagreement_threshold(),
            disagreement_boost: default_disagreement_boost(),
            missing_signal_penalty: default_missing_signal_penalty(),
            disagreement_trust_weight: default_disagreement_trust_weight(),
        }
    }
}

/// Fused verdict of the two model signals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedRisk {
    pub fused_risk: f64,
    pub trust_score: f64,
}

/// Fuse the supervised probability with the anomaly outcome.
///
/// With the anomaly signal unavailable, fused risk equals the probability
/// exactly and trust carries the fixed missing-signal penalty.
pub fn fuse(probability: f64, anomaly: &AnomalyOutcome, config: &FusionConfig) -> FusedRisk {
    let p = probability.clamp(0.0, 1.0);

    let Some(normalized) = anomaly.normalized() else {
        return FusedRisk {
            fused_risk: p,
            trust_score: (1.0 - config.missing_signal_penalty).clamp(0.0, 1.0),
        };
    };

    let a = (normalized / 10.0).clamp(0.0, 1.0);
    let alpha = config.alpha.clamp(0.0, 1.0);
    let boost = config.disagreement_boost.clamp(0.0, alpha);

    let base = alpha * p + (1.0 - alpha) * a;
    let uplift = boost * (a - p - config.disagreement_threshold).max(0.0);

    FusedRisk {
        fused_risk: (base + uplift).clamp(0.0, 1.0),
        trust_score: (1.0 - config.disagreement_trust_weight * (p - a).abs()).clamp(0.0, 1.0),
    }
}
