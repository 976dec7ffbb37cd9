//! Investigation summary and recommended actions
//!
//! The default renderer is a deterministic template: a risk sentence, the
//! matched persona, the anomaly reading, and the top drivers, followed by
//! an action checklist keyed by persona. An external generative
//! collaborator can be injected by configuration for the summary text only;
//! its failures are contained here and the template text is used instead,
//! so a request never aborts on a summary problem.

use crate::persona::{Persona, RiskBand};
use crate::types::prediction::{AnomalyOutcome, Attribution};
use crate::types::record::RecordKind;
use serde::Deserialize;
use tracing::warn;

/// Summary-stage settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryConfig {
    /// Route summary text through the injected generative collaborator
    #[serde(default)]
    pub use_generative: bool,
}

/// Everything the summary stage may reference. The rendered text must not
/// mention facts outside this context.
#[derive(Debug, Clone, Copy)]
pub struct SummaryContext<'a> {
    pub record_kind: RecordKind,
    pub fraud_probability: f64,
    pub fused_risk: f64,
    pub band: RiskBand,
    pub persona: Persona,
    pub anomaly: &'a AnomalyOutcome,
    pub top_features: &'a [Attribution],
}

/// Optional external text generator. Implementations must ground the text
/// in the provided context only; the action checklist never delegates.
pub trait GenerativeSummarizer: Send + Sync {
    fn summarize(&self, context: &SummaryContext<'_>) -> anyhow::Result<String>;
}

/// Summary renderer with the template path as mandatory fallback.
pub struct SummaryEngine {
    generative: Option<Box<dyn GenerativeSummarizer>>,
}

impl SummaryEngine {
    pub fn template_only() -> Self {
        Self { generative: None }
    }

    pub fn with_generative(generative: Box<dyn GenerativeSummarizer>) -> Self {
        Self {
            generative: Some(generative),
        }
    }

    /// Render the summary text and action checklist. Never fails.
    pub fn render(&self, context: &SummaryContext<'_>) -> (String, Vec<String>) {
        let actions = action_checklist(context.persona, context.band);

        let summary = match &self.generative {
            Some(generator) => match generator.summarize(context) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "Generative summary failed, using template");
                    template_summary(context)
                }
            },
            None => template_summary(context),
        };

        (summary, actions)
    }
}

/// Deterministic template renderer.
pub fn template_summary(context: &SummaryContext<'_>) -> String {
    let mut lines: Vec<String> = Vec::with_capacity(4);

    lines.push(format!(
        "Overall this is assessed as {} fraud risk (fused risk {:.2}, fraud probability {:.2}).",
        context.band, context.fused_risk, context.fraud_probability
    ));

    lines.push(format!("Pattern matched: {}.", context.persona.label));

    match context.anomaly {
        AnomalyOutcome::Scored { normalized, .. } if *normalized > 0.0 => {
            lines.push(format!(
                "Anomaly score is {normalized:.1}/10 (higher means more unusual behaviour)."
            ));
        }
        AnomalyOutcome::Scored { .. } => {}
        AnomalyOutcome::Unavailable => {
            lines.push(
                "Anomaly screening was unavailable for this record, so confidence is reduced."
                    .to_string(),
            );
        }
    }

    if !context.top_features.is_empty() {
        let parts: Vec<String> = context
            .top_features
            .iter()
            .take(3)
            .map(|a| {
                let direction = if a.contribution > 0.0 {
                    "raises"
                } else {
                    "lowers"
                };
                format!("{} ({}) {direction} risk", a.feature, format_value(a.value))
            })
            .collect();
        lines.push(format!("Key drivers include: {}.", parts.join(", ")));
    }

    lines.join(" ")
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e12 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

/// Fixed action checklist per persona. Medium and high risk bands always
/// produce at least one action.
pub fn action_checklist(persona: Persona, band: RiskBand) -> Vec<String> {
    let actions: &[&str] = match persona.code {
        "repeat_offender" => &[
            "Escalate to a senior adjuster",
            "Request supporting documents (invoices, medical reports, police reports)",
            "Flag the policy for review",
            "Cross-check the full prior claim history",
        ],
        "policy_manipulation" => &[
            "Escalate to a senior adjuster",
            "Verify policy inception documents and customer identity",
            "Request supporting documents before approval",
        ],
        "opportunistic_high_value" => &[
            "Escalate to a senior adjuster",
            "Request itemized invoices for the claimed amount",
            "Arrange an independent loss assessment",
        ],
        "financial_distress" => &[
            "Perform targeted checks on the highest-impact risk factors",
            "Cross-check claim details against prior claim history",
        ],
        "likely_fake_posting" => &[
            "Suspend the posting pending review",
            "Verify the employer's identity and company registration",
            "Warn applicants not to share financial details",
        ],
        "suspicious_posting" => &[
            "Queue the posting for manual review",
            "Verify contact details against the claimed company",
        ],
        "low_risk_normal" => &[
            "Proceed with standard automated checks",
            "Spot-audit a random sample of low-risk records for quality control",
        ],
        _ => match band {
            RiskBand::High => &[
                "Escalate to manual investigation before approval",
                "Verify identity and history before any payout",
                "Request supporting documents",
            ],
            RiskBand::Medium => &[
                "Perform targeted checks on the highest-impact risk factors",
                "Cross-check details against available history",
            ],
            RiskBand::Low => &["Proceed with standard automated checks"],
        },
    };

    actions.iter().map(|s| s.to_string()).collect()
}
