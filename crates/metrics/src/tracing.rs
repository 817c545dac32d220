use std::sync::Arc;
use tracing::{field::Visit, Event, Level, Subscriber};
use tracing_subscriber::{
    fmt,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::collector::MetricsCollector;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,rwa_issuance=debug";

/// Initialize tracing with metrics integration
pub fn init_tracing_with_metrics(collector: Arc<MetricsCollector>) -> Result<(), TracingError> {
    init_tracing_with_filter(collector, DEFAULT_FILTER)
}

/// Like [`init_tracing_with_metrics`], with an explicit fallback filter
/// (typically the configured log level). `RUST_LOG` still wins when set.
pub fn init_tracing_with_filter(
    collector: Arc<MetricsCollector>,
    fallback_filter: &str,
) -> Result<(), TracingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback_filter))
        .map_err(|e| TracingError::InitError(e.to_string()))?;

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .json();

    let metrics_layer = MetricsLayer::new(collector);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(metrics_layer)
        .try_init()
        .map_err(|e| TracingError::InitError(e.to_string()))?;

    Ok(())
}

/// Tracing layer counting error events by their `error_type` field
pub struct MetricsLayer {
    collector: Arc<MetricsCollector>,
}

impl MetricsLayer {
    pub fn new(collector: Arc<MetricsCollector>) -> Self {
        Self { collector }
    }
}

impl<S> Layer<S> for MetricsLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != Level::ERROR {
            return;
        }

        let mut visitor = ErrorTypeVisitor::default();
        event.record(&mut visitor);

        let error_type = visitor.error_type.as_deref().unwrap_or("unclassified");
        self.collector.record_error(error_type);
    }
}

#[derive(Default)]
struct ErrorTypeVisitor {
    error_type: Option<String>,
}

impl Visit for ErrorTypeVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "error_type" {
            self.error_type = Some(format!("{value:?}").trim_matches('"').to_string());
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "error_type" {
            self.error_type = Some(value.to_string());
        }
    }
}

/// Correlation ID for tracking one flow across components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(uuid::Uuid);

impl CorrelationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of orchestrated flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Deployment,
    Integration,
    StatusRefresh,
}

impl FlowKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowKind::Deployment => "deployment",
            FlowKind::Integration => "integration",
            FlowKind::StatusRefresh => "status_refresh",
        }
    }
}

/// Span context for one deploy / integrate / refresh invocation
#[derive(Debug, Clone)]
pub struct FlowSpan {
    pub correlation_id: CorrelationId,
    pub kind: FlowKind,
    /// Token symbol or entity id the flow acts on
    pub subject: String,
}

impl FlowSpan {
    pub fn new(kind: FlowKind, subject: impl Into<String>) -> Self {
        Self {
            correlation_id: CorrelationId::new(),
            kind,
            subject: subject.into(),
        }
    }

    pub fn deployment(symbol: impl Into<String>) -> Self {
        Self::new(FlowKind::Deployment, symbol)
    }

    pub fn integration(entity: impl Into<String>) -> Self {
        Self::new(FlowKind::Integration, entity)
    }

    /// Span to attach to the flow's future with `Instrument::instrument`
    pub fn span(&self) -> tracing::Span {
        tracing::info_span!(
            "flow",
            kind = self.kind.as_str(),
            correlation_id = %self.correlation_id,
            subject = %self.subject,
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("tracing initialization error: {0}")]
    InitError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_id_generation() {
        let id1 = CorrelationId::new();
        let id2 = CorrelationId::new();

        assert_ne!(id1, id2);
        assert_eq!(id1.as_str().len(), 36);
    }

    #[test]
    fn test_flow_span_creation() {
        let flow = FlowSpan::deployment("ACME");
        assert_eq!(flow.kind, FlowKind::Deployment);
        assert_eq!(flow.subject, "ACME");

        let flow = FlowSpan::integration("CCJGET...AJ4O");
        assert_eq!(flow.kind.as_str(), "integration");
    }
}
