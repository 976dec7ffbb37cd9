//! Fraud Risk Pipeline - Batch Scoring Entry Point
//!
//! Loads model artifacts, then scores an input file: JSON-lines of records
//! (one `InputRecord` per line) or a CSV of insurance claims. Results are
//! written to stdout as JSON lines, order-preserving. Serving layers (HTTP
//! or otherwise) are external collaborators; this binary is the reference
//! driver for the pipeline.

use anyhow::{Context, Result};
use claimwatch::{
    config::AppConfig,
    metrics::{MetricsReporter, PipelineMetrics},
    models::{ArtifactLoader, ModelRegistry},
    pipeline::FraudPipeline,
    types::record::InputRecord,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("claimwatch=info".parse()?),
        )
        .init();

    info!("Starting fraud risk pipeline");

    let input_path = std::env::args()
        .nth(1)
        .context("Usage: claimwatch <records.jsonl|claims.csv>")?;

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");
    info!(
        "Fusion: alpha={:.2}, disagreement threshold={:.2}; explanation: top_k={}",
        config.fusion.alpha, config.fusion.disagreement_threshold, config.explanation.top_k
    );

    // Initialize metrics
    let metrics = Arc::new(PipelineMetrics::new());

    // Load model artifacts into the registry
    let snapshot = ArtifactLoader::new().load_all(&config.models.models_dir)?;
    info!(
        "Model registry initialized with {} artifacts: {:?}",
        snapshot.len(),
        snapshot.kinds()
    );
    let registry = Arc::new(ModelRegistry::new(snapshot));

    let pipeline = Arc::new(FraudPipeline::new(
        registry,
        config.fusion.clone(),
        config.explanation.clone(),
    ));

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    if input_path.ends_with(".csv") {
        score_csv(&pipeline, &metrics, &input_path)?;
    } else {
        score_json_lines(&pipeline, &metrics, &input_path, config.pipeline.workers).await?;
    }

    info!("Batch complete");
    metrics.print_summary();

    Ok(())
}

/// Score a CSV of insurance claims; one output line per data row.
fn score_csv(
    pipeline: &Arc<FraudPipeline>,
    metrics: &Arc<PipelineMetrics>,
    path: &str,
) -> Result<()> {
    let file = std::fs::File::open(path).with_context(|| format!("Failed to open {path}"))?;
    let start = Instant::now();

    let entries = pipeline.evaluate_csv(file);
    let elapsed = start.elapsed() / entries.len().max(1) as u32;

    for entry in &entries {
        match entry {
            claimwatch::types::prediction::BatchEntry::Ok { result, .. } => {
                metrics.record_prediction(elapsed, result);
            }
            claimwatch::types::prediction::BatchEntry::Failed { row, error } => {
                metrics.record_failure();
                warn!(row = row, error = %error, "Row failed");
            }
        }
        println!("{}", serde_json::to_string(entry)?);
    }

    info!(rows = entries.len(), "CSV batch scored");
    Ok(())
}

/// Score JSON-lines records with bounded parallelism, preserving input order.
async fn score_json_lines(
    pipeline: &Arc<FraudPipeline>,
    metrics: &Arc<PipelineMetrics>,
    path: &str,
    workers: usize,
) -> Result<()> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {path}"))?;

    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    let mut handles = Vec::new();

    for (line_number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record: InputRecord = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(e) => {
                metrics.record_failure();
                warn!(line = line_number + 1, error = %e, "Failed to deserialize record");
                continue;
            }
        };

        let permit = semaphore.clone().acquire_owned().await?;
        let pipeline = pipeline.clone();
        let metrics = metrics.clone();

        handles.push(tokio::spawn(async move {
            let start = Instant::now();
            let outcome = pipeline.evaluate(&record);
            match &outcome {
                Ok(result) => metrics.record_prediction(start.elapsed(), result),
                Err(_) => metrics.record_failure(),
            }
            drop(permit);
            (line_number + 1, outcome)
        }));
    }

    // Await in submission order so output order matches input order.
    for handle in handles {
        let (line_number, outcome) = handle.await?;
        match outcome {
            Ok(result) => println!("{}", serde_json::to_string(&result)?),
            Err(e) => {
                error!(line = line_number, error = %e, "Evaluation failed");
                println!(
                    "{}",
                    serde_json::json!({ "line": line_number, "error": e.to_string() })
                );
            }
        }
    }

    Ok(())
}
