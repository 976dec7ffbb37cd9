//! Fraud persona classification
//!
//! Maps (fused risk, top attributions, record kind) onto one categorical
//! persona label via an explicit ordered rule table, evaluated top to
//! bottom with first match winning. The table is data, not branching, so
//! every band/kind combination can be tested exhaustively.

use crate::types::prediction::Attribution;
use crate::types::record::RecordKind;
use std::fmt;

/// Risk band of a fused risk value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBand {
    Low,
    Medium,
    High,
}

impl RiskBand {
    /// low < 0.3, medium 0.3-0.7, high > 0.7
    pub fn from_risk(fused_risk: f64) -> Self {
        if fused_risk > 0.7 {
            RiskBand::High
        } else if fused_risk >= 0.3 {
            RiskBand::Medium
        } else {
            RiskBand::Low
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskBand::Low => f.write_str("LOW"),
            RiskBand::Medium => f.write_str("MEDIUM"),
            RiskBand::High => f.write_str("HIGH"),
        }
    }
}

/// Categorical persona verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Persona {
    pub code: &'static str,
    pub label: &'static str,
}

/// Attribution condition a rule may require.
#[derive(Debug, Clone, Copy)]
pub enum DominantRequirement {
    /// A named feature must contribute at least the dominance threshold
    Feature(&'static str),

    /// Any feature (term, for text models) must contribute at least the
    /// dominance threshold
    AnyFeature,

    /// No attribution condition
    Unconditional,
}

/// One row of the persona rule table.
#[derive(Debug, Clone, Copy)]
pub struct PersonaRule {
    pub bands: &'static [RiskBand],
    pub kind: Option<RecordKind>,
    pub requires: DominantRequirement,
    pub persona: Persona,
}

const HIGH: &[RiskBand] = &[RiskBand::High];
const MEDIUM: &[RiskBand] = &[RiskBand::Medium];
const ELEVATED: &[RiskBand] = &[RiskBand::High, RiskBand::Medium];
const LOW: &[RiskBand] = &[RiskBand::Low];

/// Ordered rule table; first match wins. The last two rows are the
/// documented defaults and leave no (band, kind) combination unmatched.
pub const RULE_TABLE: &[PersonaRule] = &[
    PersonaRule {
        bands: HIGH,
        kind: Some(RecordKind::InsuranceClaim),
        requires: DominantRequirement::Feature("num_prior_claims"),
        persona: Persona {
            code: "repeat_offender",
            label: "Repeat Offender Pattern",
        },
    },
    PersonaRule {
        bands: ELEVATED,
        kind: Some(RecordKind::InsuranceClaim),
        requires: DominantRequirement::Feature("policy_tenure_days"),
        persona: Persona {
            code: "policy_manipulation",
            label: "Policy Manipulation Risk",
        },
    },
    PersonaRule {
        bands: ELEVATED,
        kind: Some(RecordKind::InsuranceClaim),
        requires: DominantRequirement::Feature("claim_amount"),
        persona: Persona {
            code: "opportunistic_high_value",
            label: "Opportunistic High-Value Claim",
        },
    },
    PersonaRule {
        bands: MEDIUM,
        kind: Some(RecordKind::InsuranceClaim),
        requires: DominantRequirement::Feature("num_prior_claims"),
        persona: Persona {
            code: "financial_distress",
            label: "Financial Distress Pattern",
        },
    },
    PersonaRule {
        bands: HIGH,
        kind: Some(RecordKind::JobPosting),
        requires: DominantRequirement::AnyFeature,
        persona: Persona {
            code: "likely_fake_posting",
            label: "Likely Fake Posting",
        },
    },
    PersonaRule {
        bands: MEDIUM,
        kind: Some(RecordKind::JobPosting),
        requires: DominantRequirement::AnyFeature,
        persona: Persona {
            code: "suspicious_posting",
            label: "Suspicious Posting",
        },
    },
    PersonaRule {
        bands: ELEVATED,
        kind: None,
        requires: DominantRequirement::Unconditional,
        persona: Persona {
            code: "needs_review",
            label: "Needs Analyst Review",
        },
    },
    PersonaRule {
        bands: LOW,
        kind: None,
        requires: DominantRequirement::Unconditional,
        persona: Persona {
            code: "low_risk_normal",
            label: "Low Risk - Normal Behavior",
        },
    },
];

impl PersonaRule {
    fn matches(
        &self,
        band: RiskBand,
        kind: RecordKind,
        attributions: &[Attribution],
        dominance_threshold: f64,
    ) -> bool {
        if !self.bands.contains(&band) {
            return false;
        }
        if let Some(rule_kind) = self.kind {
            if rule_kind != kind {
                return false;
            }
        }
        match self.requires {
            DominantRequirement::Unconditional => true,
            DominantRequirement::AnyFeature => attributions
                .iter()
                .any(|a| a.contribution >= dominance_threshold),
            DominantRequirement::Feature(name) => attributions
                .iter()
                .any(|a| a.feature == name && a.contribution >= dominance_threshold),
        }
    }
}

/// Classify a verdict into its persona.
pub fn classify(
    fused_risk: f64,
    attributions: &[Attribution],
    kind: RecordKind,
    dominance_threshold: f64,
) -> Persona {
    let band = RiskBand::from_risk(fused_risk);
    for rule in RULE_TABLE {
        if rule.matches(band, kind, attributions, dominance_threshold) {
            return rule.persona;
        }
    }
    // The table ends in unconditional defaults for every band.
    Persona {
        code: "needs_review",
        label: "Needs Analyst Review",
    }
}
