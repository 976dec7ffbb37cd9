//! ClaimWatch fraud-risk pipeline
//!
//! Evaluates a single submitted record (an insurance claim or a job-posting
//! text) and returns a composite verdict: supervised fraud probability,
//! unsupervised anomaly score, fused risk, ranked feature attributions, a
//! persona label, and a deterministic investigation summary with
//! recommended actions.

pub mod config;
pub mod error;
pub mod explain;
pub mod feature_extractor;
pub mod fusion;
pub mod metrics;
pub mod models;
pub mod persona;
pub mod pipeline;
pub mod summary;
pub mod types;

pub use config::AppConfig;
pub use error::PipelineError;
pub use feature_extractor::FeatureVector;
pub use models::{ArtifactLoader, ModelArtifact, ModelRegistry, RegistrySnapshot};
pub use pipeline::FraudPipeline;
pub use summary::{GenerativeSummarizer, SummaryEngine};
pub use types::{InputRecord, PredictionResult, RecordKind};
