use std::time::Duration;

use prometheus::{Encoder, TextEncoder};
use rwa_issuance_types::{DeploymentOrigin, StepPolicy};

use crate::metrics::*;

/// Records pipeline metrics into the process-wide prometheus registry
#[derive(Debug, Clone, Default)]
pub struct MetricsCollector;

impl MetricsCollector {
    pub fn new() -> Self {
        Self
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // TRANSACTION METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_tx_submitted(&self) {
        TX_SUBMITTED.inc();
    }

    /// `outcome` is `success` or an executor error kind
    pub fn record_tx_outcome(&self, outcome: &str) {
        TX_OUTCOMES.with_label_values(&[outcome]).inc();
    }

    pub fn record_poll_attempts(&self, attempts: u32) {
        TX_POLL_ATTEMPTS.observe(attempts as f64);
    }

    pub fn record_confirmation_duration(&self, duration: Duration) {
        TX_CONFIRMATION_DURATION.observe(duration.as_millis() as f64);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PIPELINE METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_step(&self, policy: StepPolicy, success: bool) {
        let policy = match policy {
            StepPolicy::Fatal => "fatal",
            StepPolicy::BestEffort => "best_effort",
        };
        let outcome = if success { "success" } else { "failure" };
        PIPELINE_STEPS.with_label_values(&[policy, outcome]).inc();
    }

    pub fn record_pipeline_aborted(&self) {
        PIPELINE_ABORTS.inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // DEPLOYMENT METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_deployment(&self, origin: DeploymentOrigin, duration: Duration) {
        let origin = match origin {
            DeploymentOrigin::Real => "real",
            DeploymentOrigin::Fallback => "fallback",
        };
        DEPLOYMENTS.with_label_values(&[origin]).inc();
        DEPLOYMENT_DURATION.observe(duration.as_millis() as f64);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INTEGRATION METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_integration_started(&self) {
        INTEGRATIONS_IN_FLIGHT.inc();
    }

    /// Close an integration opened with `record_integration_started`
    pub fn record_integration_finished(&self, outcome: &str) {
        INTEGRATIONS_IN_FLIGHT.dec();
        INTEGRATIONS.with_label_values(&[outcome]).inc();
    }

    /// Outcome that never entered the pipeline (e.g. already integrated)
    pub fn record_integration_skipped(&self, outcome: &str) {
        INTEGRATIONS.with_label_values(&[outcome]).inc();
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STATUS METRICS
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_status_query(&self, success: bool) {
        let outcome = if success { "ok" } else { "error" };
        STATUS_QUERIES.with_label_values(&[outcome]).inc();
    }

    pub fn record_status_refresh(&self, integrated: usize, duration: Duration) {
        ENTITIES_INTEGRATED.set(integrated as i64);
        STATUS_REFRESH_DURATION.observe(duration.as_millis() as f64);
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // ERRORS & EXPORT
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn record_error(&self, error_type: &str) {
        ERRORS.with_label_values(&[error_type]).inc();
    }

    /// Export metrics in Prometheus text format
    pub fn export_metrics(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = prometheus::gather();
        let mut buffer = Vec::new();
        encoder
            .encode(&metric_families, &mut buffer)
            .map_err(|e| MetricsError::EncodingError(e.to_string()))?;

        String::from_utf8(buffer).map_err(|e| MetricsError::EncodingError(e.to_string()))
    }
}

/// Metrics error types
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("encoding error: {0}")]
    EncodingError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_after_recording() {
        let collector = MetricsCollector::new();

        collector.record_tx_submitted();
        collector.record_tx_outcome("timeout");
        collector.record_poll_attempts(60);
        collector.record_confirmation_duration(Duration::from_secs(3));

        let metrics = collector.export_metrics().unwrap();
        assert!(metrics.contains("rwa_issuance_tx_submitted_total"));
        assert!(metrics.contains("outcome=\"timeout\""));
        assert!(metrics.contains("rwa_issuance_tx_poll_attempts"));
    }

    #[test]
    fn test_pipeline_and_deployment_metrics() {
        let collector = MetricsCollector::new();

        collector.record_step(StepPolicy::BestEffort, false);
        collector.record_pipeline_aborted();
        collector.record_deployment(DeploymentOrigin::Fallback, Duration::from_millis(1200));

        let metrics = collector.export_metrics().unwrap();
        assert!(metrics.contains("policy=\"best_effort\""));
        assert!(metrics.contains("origin=\"fallback\""));
        assert!(metrics.contains("rwa_issuance_pipeline_aborts_total"));
    }

    #[test]
    fn test_integration_and_status_metrics() {
        let collector = MetricsCollector::new();

        collector.record_integration_started();
        collector.record_integration_finished("admin_mismatch");
        collector.record_integration_skipped("already_integrated");
        collector.record_status_query(false);
        collector.record_status_refresh(2, Duration::from_millis(80));

        let metrics = collector.export_metrics().unwrap();
        assert!(metrics.contains("outcome=\"admin_mismatch\""));
        assert!(metrics.contains("rwa_issuance_entities_integrated"));
    }
}
