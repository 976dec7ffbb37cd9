//! Model artifact documents
//!
//! An artifact is the versioned, read-only JSON bundle produced by the
//! offline training process: the expected feature schema, the fitted
//! probability estimator, and optionally an anomaly model with its decision
//! threshold. Artifacts are deserialized once at startup, validated, and
//! turned into immutable runtime bundles; nothing here is mutated after
//! load.

use crate::models::anomaly::AnomalySpec;
use crate::models::estimator::EstimatorSpec;
use crate::types::record::RecordKind;
use serde::{Deserialize, Serialize};

/// One numeric input field of a tabular schema, in model order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericField {
    pub name: String,

    /// Absence of a required field fails validation; optional fields fall
    /// back to `default`.
    #[serde(default = "default_required")]
    pub required: bool,

    #[serde(default)]
    pub default: f64,
}

fn default_required() -> bool {
    true
}

/// A single vocabulary term with its inverse-document-frequency weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VocabEntry {
    pub term: String,
    pub idf: f64,
}

/// How free text is turned into numbers. Declared by the artifact, never
/// chosen by the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "encoding", rename_all = "snake_case")]
pub enum TextEncoding {
    /// tf-idf over the stored vocabulary; one feature per term
    BagOfTerms { vocabulary: Vec<VocabEntry> },

    /// The same term vector folded through a stored linear projection into
    /// dense components
    Projection {
        vocabulary: Vec<VocabEntry>,
        /// One row per output component, each of vocabulary length
        components: Vec<Vec<f64>>,
    },
}

/// Feature schema the estimator was trained against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "schema", rename_all = "snake_case")]
pub enum FeatureSchema {
    Numeric { fields: Vec<NumericField> },
    Text(TextEncoding),
}

impl FeatureSchema {
    /// Number of features the vectorizer will produce for this schema.
    pub fn feature_count(&self) -> usize {
        match self {
            FeatureSchema::Numeric { fields } => fields.len(),
            FeatureSchema::Text(TextEncoding::BagOfTerms { vocabulary }) => vocabulary.len(),
            FeatureSchema::Text(TextEncoding::Projection { components, .. }) => components.len(),
        }
    }

    /// Ordered feature names, matching vectorizer output positions.
    pub fn feature_names(&self) -> Vec<String> {
        match self {
            FeatureSchema::Numeric { fields } => {
                fields.iter().map(|f| f.name.clone()).collect()
            }
            FeatureSchema::Text(TextEncoding::BagOfTerms { vocabulary }) => {
                vocabulary.iter().map(|v| v.term.clone()).collect()
            }
            FeatureSchema::Text(TextEncoding::Projection { components, .. }) => (0..components
                .len())
                .map(|i| format!("component_{i}"))
                .collect(),
        }
    }

    /// Whether attributions over this schema are term-level keywords.
    pub fn is_bag_of_terms(&self) -> bool {
        matches!(self, FeatureSchema::Text(TextEncoding::BagOfTerms { .. }))
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            FeatureSchema::Numeric { fields } => {
                if fields.is_empty() {
                    return Err("numeric schema has no fields".to_string());
                }
                Ok(())
            }
            FeatureSchema::Text(TextEncoding::BagOfTerms { vocabulary }) => {
                if vocabulary.is_empty() {
                    return Err("bag_of_terms schema has an empty vocabulary".to_string());
                }
                Ok(())
            }
            FeatureSchema::Text(TextEncoding::Projection {
                vocabulary,
                components,
            }) => {
                if vocabulary.is_empty() {
                    return Err("projection schema has an empty vocabulary".to_string());
                }
                if components.is_empty() {
                    return Err("projection schema has no components".to_string());
                }
                for (i, row) in components.iter().enumerate() {
                    if row.len() != vocabulary.len() {
                        return Err(format!(
                            "projection component {i} has {} weights, vocabulary has {}",
                            row.len(),
                            vocabulary.len()
                        ));
                    }
                }
                Ok(())
            }
        }
    }
}

/// Versioned training output for one record kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Training-run identifier, e.g. "2025-11-03.1"
    pub version: String,

    pub record_kind: RecordKind,

    #[serde(flatten)]
    pub feature_schema: FeatureSchema,

    pub estimator: EstimatorSpec,

    /// Absent for kinds with no unsupervised model (e.g. job postings)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anomaly: Option<AnomalySpec>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tree::DecisionTree;

    fn numeric_schema() -> FeatureSchema {
        FeatureSchema::Numeric {
            fields: vec![
                NumericField {
                    name: "claim_amount".to_string(),
                    required: true,
                    default: 0.0,
                },
                NumericField {
                    name: "customer_age".to_string(),
                    required: false,
                    default: 0.0,
                },
            ],
        }
    }

    #[test]
    fn test_schema_names_match_order() {
        let schema = numeric_schema();
        assert_eq!(schema.feature_count(), 2);
        assert_eq!(schema.feature_names(), vec!["claim_amount", "customer_age"]);
        assert!(!schema.is_bag_of_terms());
    }

    #[test]
    fn test_projection_validation() {
        let schema = FeatureSchema::Text(TextEncoding::Projection {
            vocabulary: vec![
                VocabEntry {
                    term: "money".to_string(),
                    idf: 1.2,
                },
                VocabEntry {
                    term: "urgent".to_string(),
                    idf: 2.0,
                },
            ],
            components: vec![vec![0.5, -0.5], vec![1.0]],
        });
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_artifact_json_round_trip() {
        let artifact = ModelArtifact {
            version: "test.1".to_string(),
            record_kind: RecordKind::InsuranceClaim,
            feature_schema: numeric_schema(),
            estimator: EstimatorSpec::GradientBoosted {
                base_score: -0.3,
                trees: vec![DecisionTree::stump(0, 10_000.0, 0.0, -0.4, 0.7)],
            },
            anomaly: None,
        };

        let json = serde_json::to_string_pretty(&artifact).unwrap();
        assert!(json.contains("\"schema\": \"numeric\""));
        assert!(json.contains("\"family\": \"gradient_boosted\""));
        assert!(!json.contains("\"anomaly\""));

        let back: ModelArtifact = serde_json::from_str(&json).unwrap();
        assert_eq!(back.version, "test.1");
        assert_eq!(back.feature_schema.feature_count(), 2);
    }

    #[test]
    fn test_text_artifact_json_round_trip() {
        let artifact = ModelArtifact {
            version: "job.7".to_string(),
            record_kind: RecordKind::JobPosting,
            feature_schema: FeatureSchema::Text(TextEncoding::BagOfTerms {
                vocabulary: vec![
                    VocabEntry {
                        term: "wire transfer".to_string(),
                        idf: 2.4,
                    },
                    VocabEntry {
                        term: "engineer".to_string(),
                        idf: 1.1,
                    },
                ],
            }),
            estimator: EstimatorSpec::Linear {
                intercept: -1.2,
                weights: vec![2.5, -0.8],
            },
            anomaly: None,
        };

        let json = serde_json::to_string(&artifact).unwrap();
        assert!(json.contains("\"schema\":\"text\""));
        assert!(json.contains("\"encoding\":\"bag_of_terms\""));

        let back: ModelArtifact = serde_json::from_str(&json).unwrap();
        assert!(back.feature_schema.is_bag_of_terms());
        assert_eq!(back.feature_schema.feature_names()[0], "wire transfer");
    }
}
