//! Model artifacts, estimators, and the process-wide registry

pub mod anomaly;
pub mod artifact;
pub mod estimator;
pub mod loader;
pub mod registry;
pub mod tree;

pub use anomaly::{AnomalyDetector, AnomalySpec};
pub use artifact::{FeatureSchema, ModelArtifact, NumericField, TextEncoding, VocabEntry};
pub use estimator::{Contributions, EstimatorSpec, ProbabilityEstimator};
pub use loader::ArtifactLoader;
pub use registry::{ModelBundle, ModelRegistry, RegistrySnapshot};
pub use tree::{DecisionTree, TreeNode};
