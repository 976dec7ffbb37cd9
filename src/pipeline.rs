//! The prediction-and-explanation pipeline
//!
//! One evaluation is a strict DAG: vectorize, score with the supervised and
//! unsupervised models, decompose the supervised output into attributions,
//! fuse the two signals, classify the persona, render the summary. Every
//! stage works on stack-local state plus one registry snapshot taken up
//! front, so concurrent evaluations need no locking and a reload mid-flight
//! cannot mix model versions.

use crate::error::PipelineError;
use crate::explain::{explain, ExplanationConfig};
use crate::feature_extractor::vectorize;
use crate::fusion::{fuse, FusionConfig};
use crate::models::registry::ModelRegistry;
use crate::persona::{classify, RiskBand};
use crate::summary::{SummaryContext, SummaryEngine};
use crate::types::prediction::{AnomalyOutcome, BatchEntry, PredictionResult};
use crate::types::record::{InputRecord, InsuranceClaim};
use std::sync::Arc;
use tracing::debug;

/// Evaluates records against the currently loaded models.
pub struct FraudPipeline {
    registry: Arc<ModelRegistry>,
    fusion: FusionConfig,
    explanation: ExplanationConfig,
    summaries: SummaryEngine,
}

impl FraudPipeline {
    /// Pipeline with the deterministic template summarizer.
    pub fn new(
        registry: Arc<ModelRegistry>,
        fusion: FusionConfig,
        explanation: ExplanationConfig,
    ) -> Self {
        Self {
            registry,
            fusion,
            explanation,
            summaries: SummaryEngine::template_only(),
        }
    }

    /// Swap in a different summary engine (e.g. a generative collaborator).
    pub fn with_summary_engine(mut self, summaries: SummaryEngine) -> Self {
        self.summaries = summaries;
        self
    }

    /// Run the full pipeline for one record.
    pub fn evaluate(&self, record: &InputRecord) -> Result<PredictionResult, PipelineError> {
        let kind = record.kind();
        let snapshot = self.registry.snapshot();
        let bundle = snapshot.bundle(kind)?;

        let features = vectorize(record, &bundle.schema, bundle.feature_names.clone())?;

        // Guards against a partially retrained artifact whose estimator and
        // schema disagree; never truncate or pad.
        let expected = bundle.estimator.feature_count();
        if features.len() != expected {
            return Err(PipelineError::FeatureSchemaMismatch {
                expected,
                actual: features.len(),
            });
        }

        let probability = bundle.estimator.predict_probability(&features.values);

        let anomaly = bundle
            .anomaly
            .as_ref()
            .map(|detector| detector.score(&features.values))
            .unwrap_or(AnomalyOutcome::Unavailable);

        let explanation = explain(&features, bundle.estimator.as_ref());
        let top_features = explanation.top(self.explanation.top_k);
        let important_keywords = if bundle.schema.is_bag_of_terms() {
            explanation.keywords(self.explanation.max_keywords)
        } else {
            Vec::new()
        };

        let fused = fuse(probability, &anomaly, &self.fusion);
        let band = RiskBand::from_risk(fused.fused_risk);
        let persona = classify(
            fused.fused_risk,
            &top_features,
            kind,
            self.explanation.dominance_threshold,
        );

        let context = SummaryContext {
            record_kind: kind,
            fraud_probability: probability,
            fused_risk: fused.fused_risk,
            band,
            persona,
            anomaly: &anomaly,
            top_features: &top_features,
        };
        let (summary, recommended_actions) = self.summaries.render(&context);

        debug!(
            record_kind = %kind,
            model_version = %bundle.version,
            fraud_probability = probability,
            fused_risk = fused.fused_risk,
            persona = persona.code,
            "Pipeline evaluation complete"
        );

        let (anomaly_score, is_anomalous) = match anomaly {
            AnomalyOutcome::Scored {
                normalized,
                is_anomalous,
                ..
            } => (Some(normalized), Some(is_anomalous)),
            AnomalyOutcome::Unavailable => (None, None),
        };

        Ok(PredictionResult {
            record_kind: kind,
            fraud_probability: probability,
            fused_risk: fused.fused_risk,
            trust_score: fused.trust_score,
            anomaly_score,
            is_anomalous,
            fraud_persona: persona.label.to_string(),
            top_features,
            important_keywords,
            summary,
            recommended_actions,
        })
    }

    /// Evaluate a slice of records, order-preserving.
    pub fn evaluate_batch(
        &self,
        records: &[InputRecord],
    ) -> Vec<Result<PredictionResult, PipelineError>> {
        records.iter().map(|r| self.evaluate(r)).collect()
    }

    /// Evaluate a CSV of insurance claims, one entry per data row.
    ///
    /// A malformed row yields a `Failed` entry and the batch continues, so
    /// the output length always equals the number of data rows. Row numbers
    /// are 1-based over data rows.
    pub fn evaluate_csv<R: std::io::Read>(&self, reader: R) -> Vec<BatchEntry> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut entries = Vec::new();

        for (idx, row) in csv_reader.deserialize::<InsuranceClaim>().enumerate() {
            let row_number = idx + 1;
            let entry = match row {
                Ok(claim) => {
                    match self.evaluate(&InputRecord::InsuranceClaim(claim)) {
                        Ok(result) => BatchEntry::Ok {
                            row: row_number,
                            result: Box::new(result),
                        },
                        Err(e) => BatchEntry::Failed {
                            row: row_number,
                            error: e.to_string(),
                        },
                    }
                }
                Err(e) => BatchEntry::Failed {
                    row: row_number,
                    error: e.to_string(),
                },
            };
            entries.push(entry);
        }

        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::anomaly::{AnomalySpec, IsoNode, IsoTree};
    use crate::models::artifact::{
        FeatureSchema, ModelArtifact, NumericField, TextEncoding, VocabEntry,
    };
    use crate::models::estimator::EstimatorSpec;
    use crate::models::registry::{ModelBundle, RegistrySnapshot};
    use crate::models::tree::DecisionTree;
    use crate::types::record::RecordKind;

    fn field(name: &str, required: bool) -> NumericField {
        NumericField {
            name: name.to_string(),
            required,
            default: 0.0,
        }
    }

    /// Boosted model over (claim_amount, policy_tenure_days,
    /// num_prior_claims, customer_age) where a high prior-claims count
    /// dominates the margin.
    fn insurance_artifact() -> ModelArtifact {
        let trees = vec![
            DecisionTree::stump(2, 2.5, 0.0, -0.8, 2.2),
            DecisionTree::stump(0, 20_000.0, 0.0, -0.3, 0.8),
            DecisionTree::stump(1, 90.0, 0.0, 0.4, -0.4),
        ];

        let iso_tree = IsoTree {
            nodes: vec![
                IsoNode::Split {
                    feature: 2,
                    threshold: 2.5,
                    left: 1,
                    right: 2,
                },
                IsoNode::Leaf { size: 200 },
                IsoNode::Leaf { size: 2 },
            ],
        };

        ModelArtifact {
            version: "insurance.test".to_string(),
            record_kind: RecordKind::InsuranceClaim,
            feature_schema: FeatureSchema::Numeric {
                fields: vec![
                    field("claim_amount", true),
                    field("policy_tenure_days", false),
                    field("num_prior_claims", false),
                    field("customer_age", false),
                ],
            },
            estimator: EstimatorSpec::GradientBoosted {
                base_score: -1.0,
                trees,
            },
            anomaly: Some(AnomalySpec {
                trees: vec![iso_tree],
                subsample_size: 256,
                raw_threshold: 0.0,
                raw_min: -0.4,
                raw_max: 0.1,
            }),
        }
    }

    fn job_artifact() -> ModelArtifact {
        let vocab = [
            ("wire transfer", 2.0),
            ("money", 1.5),
            ("experience", 1.0),
            ("engineer", 1.0),
        ];
        ModelArtifact {
            version: "job.test".to_string(),
            record_kind: RecordKind::JobPosting,
            feature_schema: FeatureSchema::Text(TextEncoding::BagOfTerms {
                vocabulary: vocab
                    .iter()
                    .map(|(term, idf)| VocabEntry {
                        term: term.to_string(),
                        idf: *idf,
                    })
                    .collect(),
            }),
            estimator: EstimatorSpec::Linear {
                intercept: -1.0,
                weights: vec![3.0, 2.0, -1.5, -1.0],
            },
            anomaly: None,
        }
    }

    fn pipeline() -> FraudPipeline {
        let snapshot = RegistrySnapshot::new(vec![
            ModelBundle::from_artifact(insurance_artifact()).unwrap(),
            ModelBundle::from_artifact(job_artifact()).unwrap(),
        ]);
        FraudPipeline::new(
            Arc::new(ModelRegistry::new(snapshot)),
            FusionConfig::default(),
            ExplanationConfig::default(),
        )
    }

    fn repeat_offender_record() -> InputRecord {
        InputRecord::insurance(25_000.0, 60.0, 5.0, 28.0)
    }

    #[test]
    fn test_repeat_offender_example() {
        let result = pipeline().evaluate(&repeat_offender_record()).unwrap();

        assert_eq!(result.record_kind, RecordKind::InsuranceClaim);
        assert!(result.fused_risk > 0.7, "fused_risk = {}", result.fused_risk);
        assert_eq!(result.fraud_persona, "Repeat Offender Pattern");
        assert_eq!(result.top_features[0].feature, "num_prior_claims");
        assert_eq!(result.is_anomalous, Some(true));
        assert!(!result.recommended_actions.is_empty());
        assert!(result.important_keywords.is_empty());
        assert!(result.summary.contains("HIGH"));
    }

    #[test]
    fn test_low_risk_claim() {
        let record = InputRecord::insurance(1_000.0, 400.0, 0.0, 45.0);
        let result = pipeline().evaluate(&record).unwrap();

        assert!(result.fused_risk < 0.3);
        assert_eq!(result.fraud_persona, "Low Risk - Normal Behavior");
        assert_eq!(result.is_anomalous, Some(false));
        assert!(!result.recommended_actions.is_empty());
    }

    #[test]
    fn test_job_posting_without_anomaly_model() {
        let record = InputRecord::job_posting("Send money money via wire transfer now");
        let result = pipeline().evaluate(&record).unwrap();

        // Missing anomaly signal: pass-through risk, fixed trust penalty.
        assert_eq!(result.anomaly_score, None);
        assert_eq!(result.is_anomalous, None);
        assert_eq!(result.fused_risk, result.fraud_probability);
        assert!((result.trust_score - 0.75).abs() < 1e-12);

        assert!(result.fraud_probability > 0.7);
        assert_eq!(result.fraud_persona, "Likely Fake Posting");
        assert!(result
            .important_keywords
            .iter()
            .any(|k| k.keyword == "wire transfer"));
    }

    #[test]
    fn test_legitimate_job_posting() {
        let record = InputRecord::job_posting("Software engineer with experience");
        let result = pipeline().evaluate(&record).unwrap();

        assert!(result.fused_risk < 0.3);
        assert_eq!(result.fraud_persona, "Low Risk - Normal Behavior");
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let p = pipeline();
        let record = repeat_offender_record();

        let a = serde_json::to_string(&p.evaluate(&record).unwrap()).unwrap();
        for _ in 0..5 {
            let b = serde_json::to_string(&p.evaluate(&record).unwrap()).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_missing_required_field_is_validation_error() {
        let record = InputRecord::InsuranceClaim(InsuranceClaim {
            claim_amount: None,
            policy_tenure_days: Some(60.0),
            num_prior_claims: Some(5.0),
            customer_age: Some(28.0),
        });

        let err = pipeline().evaluate(&record).unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[test]
    fn test_missing_optional_field_uses_default() {
        let record = InputRecord::InsuranceClaim(InsuranceClaim {
            claim_amount: Some(1_000.0),
            policy_tenure_days: None,
            num_prior_claims: None,
            customer_age: None,
        });

        let result = pipeline().evaluate(&record).unwrap();
        let tenure = result
            .top_features
            .iter()
            .find(|a| a.feature == "policy_tenure_days")
            .unwrap();
        assert_eq!(tenure.value, 0.0);
    }

    #[test]
    fn test_unloaded_kind_fails_fast() {
        let snapshot = RegistrySnapshot::new(vec![
            ModelBundle::from_artifact(insurance_artifact()).unwrap()
        ]);
        let p = FraudPipeline::new(
            Arc::new(ModelRegistry::new(snapshot)),
            FusionConfig::default(),
            ExplanationConfig::default(),
        );

        let err = p.evaluate(&InputRecord::job_posting("text")).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ModelNotLoaded(RecordKind::JobPosting)
        ));
    }

    #[test]
    fn test_batch_preserves_order() {
        let p = pipeline();
        let records = vec![
            repeat_offender_record(),
            InputRecord::insurance(1_000.0, 400.0, 0.0, 45.0),
            InputRecord::job_posting("Software engineer with experience"),
        ];

        let results = p.evaluate_batch(&records);
        assert_eq!(results.len(), 3);
        assert!(results[0].as_ref().unwrap().fused_risk > 0.7);
        assert!(results[1].as_ref().unwrap().fused_risk < 0.3);
        assert_eq!(
            results[2].as_ref().unwrap().record_kind,
            RecordKind::JobPosting
        );
    }

    #[test]
    fn test_csv_batch_length_matches_rows() {
        let csv_data = "\
claim_amount,policy_tenure_days,num_prior_claims,customer_age
25000,60,5,28
not_a_number,10,1,30
1000,400,0,45
";
        let entries = pipeline().evaluate_csv(csv_data.as_bytes());

        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_ok());
        assert!(!entries[1].is_ok());
        assert!(entries[2].is_ok());

        match &entries[1] {
            BatchEntry::Failed { row, .. } => assert_eq!(*row, 2),
            BatchEntry::Ok { .. } => panic!("row 2 should have failed"),
        }
    }

    #[test]
    fn test_csv_missing_required_field_fails_row_only() {
        let csv_data = "\
claim_amount,policy_tenure_days,num_prior_claims,customer_age
,60,5,28
1000,400,0,45
";
        let entries = pipeline().evaluate_csv(csv_data.as_bytes());
        assert_eq!(entries.len(), 2);
        assert!(!entries[0].is_ok());
        assert!(entries[1].is_ok());
    }

    struct CannedSummarizer;

    impl crate::summary::GenerativeSummarizer for CannedSummarizer {
        fn summarize(
            &self,
            context: &crate::summary::SummaryContext<'_>,
        ) -> anyhow::Result<String> {
            Ok(format!("External summary at risk {:.2}.", context.fused_risk))
        }
    }

    #[test]
    fn test_injected_summary_engine_keeps_deterministic_actions() {
        let p = pipeline()
            .with_summary_engine(SummaryEngine::with_generative(Box::new(CannedSummarizer)));
        let result = p.evaluate(&repeat_offender_record()).unwrap();

        assert!(result.summary.starts_with("External summary"));
        // Actions never delegate to the external collaborator.
        assert!(result
            .recommended_actions
            .iter()
            .any(|a| a.contains("senior adjuster")));
    }

    #[test]
    fn test_additivity_of_exposed_attributions() {
        // The exposed top features are a prefix of the full ranked
        // decomposition; rebuild the total from the estimator directly.
        let snapshot = RegistrySnapshot::new(vec![
            ModelBundle::from_artifact(insurance_artifact()).unwrap()
        ]);
        let bundle = snapshot.bundle(RecordKind::InsuranceClaim).unwrap();

        let record = repeat_offender_record();
        let features = crate::feature_extractor::vectorize(
            &record,
            &bundle.schema,
            bundle.feature_names.clone(),
        )
        .unwrap();

        let explanation = crate::explain::explain(&features, bundle.estimator.as_ref());
        let total: f64 = explanation.baseline
            + explanation
                .ranked
                .iter()
                .map(|a| a.contribution)
                .sum::<f64>();
        assert!((total - bundle.estimator.raw_output(&features.values)).abs() < 1e-6);
    }
}
