//! Process-wide model registry
//!
//! The registry is the only shared state in the system. It is initialized
//! before any request is served and read-only afterwards; a reload swaps
//! the entire snapshot reference atomically, so in-flight requests keep the
//! consistent set of bundles they started with.

use crate::error::PipelineError;
use crate::models::anomaly::AnomalyDetector;
use crate::models::artifact::{FeatureSchema, ModelArtifact};
use crate::models::estimator::ProbabilityEstimator;
use crate::types::record::RecordKind;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::info;

/// Immutable runtime form of one validated artifact.
pub struct ModelBundle {
    pub version: String,
    pub record_kind: RecordKind,
    pub schema: FeatureSchema,

    /// Ordered feature names, shared with every request's feature vector
    pub feature_names: Arc<Vec<String>>,

    pub estimator: Box<dyn ProbabilityEstimator>,
    pub anomaly: Option<AnomalyDetector>,
}

impl ModelBundle {
    /// Validate an artifact document and build its runtime bundle.
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, PipelineError> {
        artifact
            .feature_schema
            .validate()
            .map_err(PipelineError::artifact)?;

        let n_features = artifact.feature_schema.feature_count();
        let feature_names = Arc::new(artifact.feature_schema.feature_names());

        let estimator = artifact
            .estimator
            .build(n_features)
            .map_err(PipelineError::artifact)?;

        let anomaly = artifact
            .anomaly
            .map(|spec| AnomalyDetector::from_spec(spec, n_features))
            .transpose()
            .map_err(PipelineError::artifact)?;

        info!(
            record_kind = %artifact.record_kind,
            version = %artifact.version,
            family = estimator.family(),
            features = n_features,
            anomaly = anomaly.is_some(),
            "Model bundle ready"
        );

        Ok(Self {
            version: artifact.version,
            record_kind: artifact.record_kind,
            schema: artifact.feature_schema,
            feature_names,
            estimator,
            anomaly,
        })
    }
}

impl std::fmt::Debug for ModelBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelBundle")
            .field("version", &self.version)
            .field("record_kind", &self.record_kind)
            .field("schema", &self.schema)
            .field("feature_names", &self.feature_names)
            .field("estimator", &self.estimator.family())
            .field("anomaly", &self.anomaly)
            .finish()
    }
}

/// One consistent set of bundles, immutable once published.
#[derive(Default)]
pub struct RegistrySnapshot {
    bundles: HashMap<RecordKind, Arc<ModelBundle>>,
}

impl RegistrySnapshot {
    pub fn new(bundles: Vec<ModelBundle>) -> Self {
        Self {
            bundles: bundles
                .into_iter()
                .map(|b| (b.record_kind, Arc::new(b)))
                .collect(),
        }
    }

    pub fn bundle(&self, kind: RecordKind) -> Result<&Arc<ModelBundle>, PipelineError> {
        self.bundles
            .get(&kind)
            .ok_or(PipelineError::ModelNotLoaded(kind))
    }

    pub fn kinds(&self) -> Vec<RecordKind> {
        self.bundles.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.bundles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bundles.is_empty()
    }
}

/// Shared handle over the current snapshot.
pub struct ModelRegistry {
    snapshot: RwLock<Arc<RegistrySnapshot>>,
}

impl ModelRegistry {
    pub fn new(snapshot: RegistrySnapshot) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(snapshot)),
        }
    }

    /// Current snapshot. Each request takes one up front and uses it for
    /// every stage, so a concurrent reload cannot mix model versions.
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Atomically replace the whole snapshot.
    pub fn reload(&self, snapshot: RegistrySnapshot) {
        let snapshot = Arc::new(snapshot);
        let mut guard = self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = snapshot;
        info!(models = guard.len(), "Model registry reloaded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::artifact::NumericField;
    use crate::models::estimator::EstimatorSpec;
    use crate::models::tree::DecisionTree;

    fn artifact(version: &str) -> ModelArtifact {
        ModelArtifact {
            version: version.to_string(),
            record_kind: RecordKind::InsuranceClaim,
            feature_schema: FeatureSchema::Numeric {
                fields: vec![NumericField {
                    name: "claim_amount".to_string(),
                    required: true,
                    default: 0.0,
                }],
            },
            estimator: EstimatorSpec::Linear {
                intercept: 0.0,
                weights: vec![0.001],
            },
            anomaly: None,
        }
    }

    #[test]
    fn test_missing_kind_is_model_not_loaded() {
        let snapshot = RegistrySnapshot::new(vec![]);
        let err = snapshot.bundle(RecordKind::JobPosting).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ModelNotLoaded(RecordKind::JobPosting)
        ));
    }

    #[test]
    fn test_reload_swaps_whole_snapshot() {
        let bundle = ModelBundle::from_artifact(artifact("v1")).unwrap();
        let registry = ModelRegistry::new(RegistrySnapshot::new(vec![bundle]));

        // A request holds the old snapshot across a reload.
        let held = registry.snapshot();
        assert_eq!(
            held.bundle(RecordKind::InsuranceClaim).unwrap().version,
            "v1"
        );

        let bundle2 = ModelBundle::from_artifact(artifact("v2")).unwrap();
        registry.reload(RegistrySnapshot::new(vec![bundle2]));

        assert_eq!(
            held.bundle(RecordKind::InsuranceClaim).unwrap().version,
            "v1"
        );
        assert_eq!(
            registry
                .snapshot()
                .bundle(RecordKind::InsuranceClaim)
                .unwrap()
                .version,
            "v2"
        );
    }

    #[test]
    fn test_from_artifact_rejects_bad_estimator() {
        let mut bad = artifact("v1");
        bad.estimator = EstimatorSpec::GradientBoosted {
            base_score: 0.0,
            trees: vec![DecisionTree::stump(7, 1.0, 0.0, -0.1, 0.1)],
        };
        let err = ModelBundle::from_artifact(bad).unwrap_err();
        assert!(matches!(err, PipelineError::Artifact(_)));
    }
}
