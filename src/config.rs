//! Configuration management for the fraud risk pipeline

use crate::explain::ExplanationConfig;
use crate::fusion::FusionConfig;
use crate::summary::SummaryConfig;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub models: ModelsConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub explanation: ExplanationConfig,
    #[serde(default)]
    pub summary: SummaryConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// Model artifact configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory containing artifact JSON documents
    pub models_dir: String,
}

/// Batch processing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of concurrent evaluations in the batch runner
    pub workers: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            models: ModelsConfig {
                models_dir: "models".to_string(),
            },
            fusion: FusionConfig::default(),
            explanation: ExplanationConfig::default(),
            summary: SummaryConfig::default(),
            pipeline: PipelineConfig { workers: 4 },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
