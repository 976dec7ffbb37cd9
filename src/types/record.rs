//! Input record types for fraud-risk evaluation

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of record the pipeline is asked to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    InsuranceClaim,
    JobPosting,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::InsuranceClaim => "insurance_claim",
            RecordKind::JobPosting => "job_posting",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured fields of an insurance claim.
///
/// Fields are optional at the boundary; whether a missing field is an error
/// is decided by the loaded model schema, not by deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsuranceClaim {
    /// Total claim amount in policy currency
    pub claim_amount: Option<f64>,

    /// How long the policy has been active, in days
    pub policy_tenure_days: Option<f64>,

    /// Number of prior claims by this customer
    pub num_prior_claims: Option<f64>,

    /// Age of the policy holder
    pub customer_age: Option<f64>,
}

impl InsuranceClaim {
    /// Look up a field by its schema name.
    ///
    /// Outer `None` means the name is not a claim field at all; inner `None`
    /// means the field exists but was not supplied.
    pub fn field(&self, name: &str) -> Option<Option<f64>> {
        match name {
            "claim_amount" => Some(self.claim_amount),
            "policy_tenure_days" => Some(self.policy_tenure_days),
            "num_prior_claims" => Some(self.num_prior_claims),
            "customer_age" => Some(self.customer_age),
            _ => None,
        }
    }
}

/// A single record submitted for evaluation. Immutable once received.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "record_kind", rename_all = "snake_case")]
pub enum InputRecord {
    InsuranceClaim(InsuranceClaim),
    JobPosting {
        /// Full text of the posting or extracted file text
        job_text: String,
    },
}

impl InputRecord {
    pub fn kind(&self) -> RecordKind {
        match self {
            InputRecord::InsuranceClaim(_) => RecordKind::InsuranceClaim,
            InputRecord::JobPosting { .. } => RecordKind::JobPosting,
        }
    }

    /// Convenience constructor for insurance claims with all fields present.
    pub fn insurance(
        claim_amount: f64,
        policy_tenure_days: f64,
        num_prior_claims: f64,
        customer_age: f64,
    ) -> Self {
        InputRecord::InsuranceClaim(InsuranceClaim {
            claim_amount: Some(claim_amount),
            policy_tenure_days: Some(policy_tenure_days),
            num_prior_claims: Some(num_prior_claims),
            customer_age: Some(customer_age),
        })
    }

    pub fn job_posting(text: impl Into<String>) -> Self {
        InputRecord::JobPosting {
            job_text: text.into(),
        }
    }
}
