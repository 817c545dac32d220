//! Metrics and monitoring for the RWA issuance pipeline
//!
//! Prometheus counters and histograms for transaction execution, pipeline
//! steps, deployments, lending integrations and status refreshes, plus
//! tracing initialisation with correlation ids.
//!
//! # Example
//!
//! ```no_run
//! use rwa_issuance_metrics::{MetricsCollector, MetricsServer};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let collector = Arc::new(MetricsCollector::new());
//!     collector.record_tx_submitted();
//!
//!     let server = MetricsServer::on_port(collector.clone(), 9090);
//!     server.serve().await.unwrap();
//! }
//! ```

pub mod collector;
pub mod http;
pub mod metrics;
pub mod tracing;

pub use collector::{MetricsCollector, MetricsError};
pub use http::{MetricsServer, MetricsServerError};
pub use crate::tracing::{
    init_tracing_with_filter, init_tracing_with_metrics, CorrelationId, FlowKind,
    FlowSpan, TracingError, DEFAULT_FILTER,
};
