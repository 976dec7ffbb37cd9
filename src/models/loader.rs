//! Model artifact loader

use crate::models::artifact::ModelArtifact;
use crate::models::registry::{ModelBundle, RegistrySnapshot};
use crate::types::record::RecordKind;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Loads artifact documents from a directory into a registry snapshot.
pub struct ArtifactLoader;

impl ArtifactLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a single artifact file and build its bundle.
    pub fn load_artifact<P: AsRef<Path>>(&self, path: P) -> Result<ModelBundle> {
        let path = path.as_ref();

        info!(path = %path.display(), "Loading model artifact");

        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read artifact {:?}", path))?;
        let artifact: ModelArtifact = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse artifact {:?}", path))?;

        let bundle = ModelBundle::from_artifact(artifact)
            .with_context(|| format!("Invalid artifact {:?}", path))?;

        Ok(bundle)
    }

    /// Load all known artifacts from a directory.
    ///
    /// Missing or unreadable files for a kind are skipped with a warning so
    /// one broken artifact does not take down the kinds that do load; an
    /// empty result is an error.
    pub fn load_all<P: AsRef<Path>>(&self, models_dir: P) -> Result<RegistrySnapshot> {
        let models_dir = models_dir.as_ref();
        let mut bundles = Vec::new();

        let artifact_files = [
            (RecordKind::InsuranceClaim, "insurance_claim.json"),
            (RecordKind::JobPosting, "job_posting.json"),
        ];

        for (kind, filename) in &artifact_files {
            let path = models_dir.join(filename);
            if path.exists() {
                match self.load_artifact(&path) {
                    Ok(bundle) => bundles.push(bundle),
                    Err(e) => {
                        tracing::warn!(record_kind = %kind, error = %e, "Failed to load artifact, skipping");
                    }
                }
            } else {
                tracing::warn!(record_kind = %kind, path = %path.display(), "Artifact file not found");
            }
        }

        if bundles.is_empty() {
            anyhow::bail!("No model artifacts loaded from {}", models_dir.display());
        }

        info!(
            count = bundles.len(),
            "Loaded {} model artifacts from {}",
            bundles.len(),
            models_dir.display()
        );

        Ok(RegistrySnapshot::new(bundles))
    }
}

impl Default for ArtifactLoader {
    fn default() -> Self {
        Self::new()
    }
}
