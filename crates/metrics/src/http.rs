//! Prometheus scrape endpoint for a running issuance service

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::collector::MetricsCollector;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Serves `/metrics` and `/health` for one collector
pub struct MetricsServer {
    collector: Arc<MetricsCollector>,
    addr: SocketAddr,
}

impl MetricsServer {
    pub fn new(collector: Arc<MetricsCollector>, addr: SocketAddr) -> Self {
        Self { collector, addr }
    }

    /// All interfaces at `port`, as configured by `network.metrics_port`
    pub fn on_port(collector: Arc<MetricsCollector>, port: u16) -> Self {
        Self::new(collector, SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn router(collector: Arc<MetricsCollector>) -> Router {
        Router::new()
            .route("/metrics", get(scrape))
            .route("/health", get(health))
            .with_state(collector)
    }

    /// Bind and serve until the listener fails
    pub async fn serve(self) -> Result<(), MetricsServerError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| MetricsServerError::Bind {
                addr: self.addr,
                reason: e.to_string(),
            })?;

        tracing::info!(addr = %self.addr, "Metrics endpoint listening");

        axum::serve(listener, Self::router(self.collector))
            .await
            .map_err(|e| MetricsServerError::Serve(e.to_string()))
    }

    /// Serve on a background task
    pub fn spawn(self) -> JoinHandle<Result<(), MetricsServerError>> {
        tokio::spawn(self.serve())
    }
}

async fn scrape(State(collector): State<Arc<MetricsCollector>>) -> Response {
    match collector.export_metrics() {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Metrics export failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn health() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsServerError {
    #[error("failed to bind metrics endpoint on {addr}: {reason}")]
    Bind { addr: SocketAddr, reason: String },
    #[error("metrics endpoint stopped: {0}")]
    Serve(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_port_binds_all_interfaces() {
        let server = MetricsServer::on_port(Arc::new(MetricsCollector::new()), 9464);

        assert_eq!(server.addr().port(), 9464);
        assert!(server.addr().ip().is_unspecified());
    }

    #[tokio::test]
    async fn test_scrape_exports_recorded_counters() {
        let collector = Arc::new(MetricsCollector::new());
        collector.record_tx_submitted();

        let response = scrape(State(collector)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            PROMETHEUS_CONTENT_TYPE
        );
    }

    #[tokio::test]
    async fn test_health() {
        assert_eq!(health().await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bind_failure_names_the_address() {
        let taken = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap();

        let err = MetricsServer::new(Arc::new(MetricsCollector::new()), addr)
            .serve()
            .await
            .unwrap_err();

        assert!(matches!(err, MetricsServerError::Bind { addr: a, .. } if a == addr));
    }
}
