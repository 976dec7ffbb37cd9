//! Performance and outcome statistics for the prediction pipeline.

use crate::types::prediction::PredictionResult;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for pipeline activity
pub struct PipelineMetrics {
    /// Total records evaluated successfully
    pub predictions_processed: AtomicU64,
    /// Total evaluations that failed
    pub failures: AtomicU64,
    /// Evaluations by record kind
    by_kind: RwLock<HashMap<String, u64>>,
    /// Verdicts by persona label
    personas: RwLock<HashMap<String, u64>>,
    /// Fused-risk distribution buckets
    risk_buckets: RwLock<[u64; 10]>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// |probability - anomaly| gaps where both signals were present
    signal_gaps: RwLock<Vec<f64>>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl PipelineMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            predictions_processed: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            by_kind: RwLock::new(HashMap::new()),
            personas: RwLock::new(HashMap::new()),
            risk_buckets: RwLock::new([0; 10]),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            signal_gaps: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a completed evaluation
    pub fn record_prediction(&self, processing_time: Duration, result: &PredictionResult) {
        self.predictions_processed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_kind) = self.by_kind.write() {
            *by_kind
                .entry(result.record_kind.as_str().to_string())
                .or_insert(0) += 1;
        }

        if let Ok(mut personas) = self.personas.write() {
            *personas.entry(result.fraud_persona.clone()).or_insert(0) += 1;
        }

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only the recent window for memory efficiency
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        let bucket = (result.fused_risk * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.risk_buckets.write() {
            buckets[bucket] += 1;
        }

        if let Some(normalized) = result.anomaly_score {
            let gap = (result.fraud_probability - normalized / 10.0).abs();
            if let Ok(mut gaps) = self.signal_gaps.write() {
                gaps.push(gap);
                if gaps.len() > 1000 {
                    gaps.drain(0..500);
                }
            }
        }
    }

    /// Record a failed evaluation
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get processing time statistics
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = self.processing_times.read().unwrap();
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Average |probability - anomaly| gap (lower = signals agree more)
    pub fn get_avg_signal_gap(&self) -> f64 {
        let gaps = self.signal_gaps.read().unwrap();
        if gaps.is_empty() {
            return 0.0;
        }
        gaps.iter().sum::<f64>() / gaps.len() as f64
    }

    /// Get current throughput (records per second)
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.predictions_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get fused-risk distribution
    pub fn get_risk_distribution(&self) -> [u64; 10] {
        *self.risk_buckets.read().unwrap()
    }

    /// Get verdicts by persona
    pub fn get_personas(&self) -> HashMap<String, u64> {
        self.personas.read().unwrap().clone()
    }

    /// Get evaluations by record kind
    pub fn get_by_kind(&self) -> HashMap<String, u64> {
        self.by_kind.read().unwrap().clone()
    }

    /// Print summary statistics
    pub fn print_summary(&self) {
        let processed = self.predictions_processed.load(Ordering::Relaxed);
        let failed = self.failures.load(Ordering::Relaxed);

        let processing = self.get_processing_stats();
        let throughput = self.get_throughput();
        let signal_gap = self.get_avg_signal_gap();
        let personas = self.get_personas();
        let by_kind = self.get_by_kind();
        let risk_dist = self.get_risk_distribution();

        info!("╔══════════════════════════════════════════════════════════════╗");
        info!("║            FRAUD RISK PIPELINE - METRICS SUMMARY             ║");
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Records Evaluated: {:>8}  │  Throughput: {:>6.1} rec/s      ║",
            processed, throughput
        );
        info!(
            "║ Failures:          {:>8}                                  ║",
            failed
        );
        for (kind, count) in &by_kind {
            info!("║   {:16}: {:>6}                                      ║", kind, count);
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!(
            "║ Processing Time (μs): mean={:>5} p50={:>5} p95={:>5} p99={:>5} ║",
            processing.mean_us, processing.p50_us, processing.p95_us, processing.p99_us
        );
        info!(
            "║ Avg Signal Gap: {:>5.2} (lower = supervised and anomaly agree) ║",
            signal_gap
        );
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Verdicts by Persona:                                         ║");
        for (persona, count) in &personas {
            let pct = if processed > 0 {
                (*count as f64 / processed as f64) * 100.0
            } else {
                0.0
            };
            info!("║   {:32}: {:>6} ({:>5.1}%)            ║", persona, count, pct);
        }
        info!("╠══════════════════════════════════════════════════════════════╣");
        info!("║ Fused Risk Distribution:                                     ║");
        let total: u64 = risk_dist.iter().sum();
        for (i, &count) in risk_dist.iter().enumerate() {
            let pct = if total > 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
            let bar_len = (pct / 2.0) as usize;
            let bar: String = "█".repeat(bar_len.min(20));
            info!(
                "║   {:.1}-{:.1}: {:>6} ({:>5.1}%) {}",
                i as f64 / 10.0,
                (i + 1) as f64 / 10.0,
                count,
                pct,
                bar
            );
        }
        info!("╚══════════════════════════════════════════════════════════════╝");
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Real-time metrics reporter that prints periodic summaries
pub struct MetricsReporter {
    metrics: std::sync::Arc<PipelineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<PipelineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::record::RecordKind;

    fn result(fused_risk: f64, persona: &str, anomaly_score: Option<f64>) -> PredictionResult {
        PredictionResult {
            record_kind: RecordKind::InsuranceClaim,
            fraud_probability: fused_risk,
            fused_risk,
            trust_score: 1.0,
            anomaly_score,
            is_anomalous: anomaly_score.map(|_| false),
            fraud_persona: persona.to_string(),
            top_features: vec![],
            important_keywords: vec![],
            summary: String::new(),
            recommended_actions: vec![],
        }
    }

    #[test]
    fn test_metrics_recording() {
        let metrics = PipelineMetrics::new();

        metrics.record_prediction(
            Duration::from_micros(100),
            &result(0.5, "Needs Analyst Review", Some(5.0)),
        );
        metrics.record_prediction(
            Duration::from_micros(200),
            &result(0.9, "Repeat Offender Pattern", Some(9.0)),
        );
        metrics.record_failure();

        assert_eq!(metrics.predictions_processed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.failures.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.get_personas().len(), 2);
        assert_eq!(metrics.get_by_kind().get("insurance_claim"), Some(&2));
    }

    #[test]
    fn test_signal_gap_skips_unavailable() {
        let metrics = PipelineMetrics::new();

        metrics.record_prediction(
            Duration::from_micros(100),
            &result(0.8, "Likely Fake Posting", None),
        );
        assert_eq!(metrics.get_avg_signal_gap(), 0.0);

        metrics.record_prediction(
            Duration::from_micros(100),
            &result(0.8, "Repeat Offender Pattern", Some(4.0)),
        );
        assert!((metrics.get_avg_signal_gap() - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_risk_distribution_buckets() {
        let metrics = PipelineMetrics::new();
        metrics.record_prediction(Duration::from_micros(50), &result(0.05, "Low", None));
        metrics.record_prediction(Duration::from_micros(50), &result(0.95, "High", None));
        metrics.record_prediction(Duration::from_micros(50), &result(1.0, "High", None));

        let dist = metrics.get_risk_distribution();
        assert_eq!(dist[0], 1);
        assert_eq!(dist[9], 2);
    }
}
