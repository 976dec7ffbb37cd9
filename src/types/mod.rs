//! Data types shared across the pipeline

pub mod feedback;
pub mod prediction;
pub mod record;

pub use feedback::{FeedbackJudgment, FeedbackRecord, FeedbackSink};
pub use prediction::{AnomalyOutcome, Attribution, BatchEntry, KeywordImportance, PredictionResult};
pub use record::{InputRecord, InsuranceClaim, RecordKind};
