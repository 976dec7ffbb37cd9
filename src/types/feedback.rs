//! Analyst feedback on prior predictions
//!
//! The pipeline only defines the record shape and the sink interface;
//! storage (and any retraining trigger built on top of it) is a separate
//! collaborator with no read dependency from the core.

use crate::types::record::RecordKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Analyst judgment on whether a prediction was correct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackJudgment {
    Confirmed,
    Rejected,
}

/// Associates a prior prediction with a user-supplied correctness judgment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub feedback_id: String,
    pub timestamp: DateTime<Utc>,
    pub record_kind: RecordKind,

    /// Original input as submitted, untouched
    pub input_payload: serde_json::Value,

    pub predicted_label: String,
    pub predicted_probability: f64,
    pub judgment: FeedbackJudgment,
}

impl FeedbackRecord {
    pub fn new(
        record_kind: RecordKind,
        input_payload: serde_json::Value,
        predicted_label: String,
        predicted_probability: f64,
        judgment: FeedbackJudgment,
    ) -> Self {
        Self {
            feedback_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            record_kind,
            input_payload,
            predicted_label,
            predicted_probability,
            judgment,
        }
    }
}

/// Storage collaborator interface. Implementations live outside the core.
pub trait FeedbackSink: Send + Sync {
    fn record(&self, feedback: &FeedbackRecord) -> anyhow::Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_round_trip() {
        let record = FeedbackRecord::new(
            RecordKind::InsuranceClaim,
            serde_json::json!({"claim_amount": 25000.0}),
            "Repeat Offender Pattern".to_string(),
            0.86,
            FeedbackJudgment::Confirmed,
        );

        let json = serde_json::to_string(&record).unwrap();
        let back: FeedbackRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(back.feedback_id, record.feedback_id);
        assert_eq!(back.judgment, FeedbackJudgment::Confirmed);
        assert_eq!(back.input_payload["claim_amount"], 25000.0);
    }
}
